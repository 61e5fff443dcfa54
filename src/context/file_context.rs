use crate::batch::{
    Batch, BatchKwargs, BatchMarkers, EngineAvailability, EngineRegistry, ExecutionEngine,
    FrameKind, InMemoryDataset, KwargValue, TypedBatchKwargs,
};
use crate::checkpoint::CheckpointConfig;
use crate::context::project::{DatasourceConfig, ProjectConfig};
use crate::context::reader::{guess_reader_method, read_path};
use crate::context::{
    find_context_root, DataContext, CHECKPOINTS_DIR, CONFIG_FILE, EXPECTATIONS_DIR,
    UNCOMMITTED_DIR,
};
use crate::error::{GxError, Result};
use crate::operator::{OperatorRegistry, OperatorResult, RunId};
use crate::suite::ExpectationSuite;
use crate::usage::{
    JsonLinesSink, TracingSink, UsageEvent, UsageSink, UsageStatisticsHandler, DATA_CONTEXT_INIT,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 디스크의 프로젝트 디렉토리를 사용하는 data context
///
/// ```text
/// great_expectations/
/// ├── great_expectations.yml
/// ├── checkpoints/<name>.yml
/// ├── expectations/<suite/path>.json
/// └── uncommitted/validations/...
/// ```
pub struct FileDataContext {
    root_directory: PathBuf,
    config: ProjectConfig,
    engines: EngineRegistry,
    operators: OperatorRegistry,
    usage: UsageStatisticsHandler,
}

impl FileDataContext {
    /// 프로젝트 열기
    ///
    /// # Arguments
    /// * `directory` - 프로젝트 루트 또는 그 하위/상위 디렉토리
    /// * `usage_statistics` - 사용자 설정에서 사용 통계를 허용하는지
    pub fn open(directory: &Path, usage_statistics: bool) -> Result<Self> {
        let root = Self::locate(directory)?;
        let config = ProjectConfig::load(&root.join(CONFIG_FILE))?;

        let usage_config = &config.anonymous_usage_statistics;
        let sink: Box<dyn UsageSink> = match &usage_config.events_file {
            Some(file) => Box::new(JsonLinesSink::new(root.join(file))),
            None => Box::new(TracingSink),
        };
        let usage = UsageStatisticsHandler::new(usage_statistics && usage_config.enabled, sink);

        Self::from_parts(root, config, usage)
    }

    /// 사용 통계 handler를 직접 지정해서 열기
    pub fn open_with_usage(directory: &Path, usage: UsageStatisticsHandler) -> Result<Self> {
        let root = Self::locate(directory)?;
        let config = ProjectConfig::load(&root.join(CONFIG_FILE))?;
        Self::from_parts(root, config, usage)
    }

    fn locate(directory: &Path) -> Result<PathBuf> {
        // 상대 경로도 부모 방향으로 올라갈 수 있도록
        let start = std::fs::canonicalize(directory).unwrap_or_else(|_| directory.to_path_buf());
        find_context_root(&start).ok_or_else(|| {
            GxError::Config(format!(
                "No {} found in `{}` or its parent directories.",
                CONFIG_FILE,
                directory.display()
            ))
        })
    }

    fn from_parts(
        root_directory: PathBuf,
        config: ProjectConfig,
        usage: UsageStatisticsHandler,
    ) -> Result<Self> {
        let validations_dir = root_directory.join(UNCOMMITTED_DIR).join("validations");
        let operators = OperatorRegistry::from_config(&config.validation_operators, &validations_dir)?;
        let engines = config.engine_registry();

        tracing::debug!(
            root = %root_directory.display(),
            datasources = config.datasources.len(),
            operators = ?operators.names(),
            usage_statistics = usage.is_enabled(),
            "opened data context"
        );

        let context = Self {
            root_directory,
            config,
            engines,
            operators,
            usage,
        };
        context.usage.emit(UsageEvent::new(DATA_CONTEXT_INIT, true));
        Ok(context)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// `checkpoints/<name>.yml`, 이름은 한 단계 파일 이름이어야 함
    fn checkpoint_path(&self, name: &str) -> Result<PathBuf> {
        if !is_plain_name(name) {
            return Err(GxError::Checkpoint(format!(
                "Invalid checkpoint name `{}`. Checkpoint names cannot contain path separators or be `.`/`..`.",
                name
            )));
        }
        Ok(self
            .root_directory
            .join(CHECKPOINTS_DIR)
            .join(format!("{}.yml", name)))
    }

    /// kwargs의 `datasource` 키, 없으면 유일한 datasource
    fn resolve_datasource(&self, batch_kwargs: &BatchKwargs) -> Result<(&str, &DatasourceConfig)> {
        let datasources = &self.config.datasources;

        let name = match batch_kwargs.get_str("datasource") {
            Some(name) => name,
            None if datasources.len() == 1 => datasources
                .keys()
                .next()
                .map(|k| k.as_str())
                .unwrap_or_default(),
            None => {
                return Err(GxError::DataContext(
                    "batch_kwargs must name a `datasource` when the project has several".to_string(),
                ))
            }
        };

        datasources
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| {
                GxError::DataContext(format!(
                    "Unable to load datasource `{}` -- no configuration found or invalid configuration.",
                    name
                ))
            })
    }

    fn fetch(
        &self,
        datasource_name: &str,
        datasource: &DatasourceConfig,
        engine: ExecutionEngine,
        typed: &TypedBatchKwargs,
    ) -> Result<InMemoryDataset> {
        let frame_kind = match engine {
            ExecutionEngine::Spark => FrameKind::Spark,
            _ => FrameKind::Pandas,
        };

        match typed {
            TypedBatchKwargs::Path(kwargs) => {
                let raw_path = kwargs.path().and_then(|v| v.as_str()).ok_or_else(|| {
                    GxError::InvalidBatchKwargs("PathBatchKwargs 'path' must be a string".to_string())
                })?;
                let reader_method = match kwargs.reader_method().and_then(|v| v.as_str()) {
                    Some(method) => method,
                    None => guess_reader_method(raw_path).ok_or_else(|| {
                        GxError::DataContext(format!(
                            "Unable to determine reader method from path: {}",
                            raw_path
                        ))
                    })?,
                };
                let path = self.resolve_data_path(datasource, raw_path);
                read_path(
                    &path,
                    reader_method,
                    kwargs.as_kwargs().get_value("reader_options"),
                    frame_kind,
                )
            }
            TypedBatchKwargs::InMemory(_)
            | TypedBatchKwargs::PandasInMemory(_)
            | TypedBatchKwargs::SparkInMemory(_) => typed
                .as_kwargs()
                .get("dataset")
                .and_then(KwargValue::as_dataset)
                .cloned()
                .ok_or_else(|| {
                    GxError::InvalidBatchKwargs(
                        "'dataset' must be an in-memory frame".to_string(),
                    )
                }),
            TypedBatchKwargs::S3(_) => Err(GxError::DataContext(format!(
                "Datasource `{}` has no object store client configured; unable to fetch s3 batches.",
                datasource_name
            ))),
            TypedBatchKwargs::SqlAlchemyTable(_)
            | TypedBatchKwargs::SqlAlchemyQuery(_)
            | TypedBatchKwargs::SparkQuery(_) => Err(GxError::DataContext(format!(
                "Datasource `{}` has no reachable {} backend for query batches.",
                datasource_name,
                engine.as_str()
            ))),
        }
    }

    fn resolve_data_path(&self, datasource: &DatasourceConfig, raw_path: &str) -> PathBuf {
        let path = Path::new(raw_path);
        match &datasource.base_directory {
            Some(base) if path.is_relative() => self.root_directory.join(base).join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !Path::new(name).is_absolute()
}

impl DataContext for FileDataContext {
    fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    fn get_checkpoint(&self, name: &str) -> Result<CheckpointConfig> {
        let path = self.checkpoint_path(name)?;
        if !path.is_file() {
            return Err(GxError::CheckpointNotFound(name.to_string()));
        }

        let content = std::fs::read_to_string(&path)?;
        CheckpointConfig::from_yaml(name, &content)
    }

    fn list_checkpoints(&self) -> Result<Vec<String>> {
        let dir = self.root_directory.join(CHECKPOINTS_DIR);
        let pattern = format!(
            "{}/*.yml",
            glob::Pattern::escape(&dir.display().to_string())
        );

        let paths = glob::glob(&pattern)
            .map_err(|e| GxError::Config(format!("Invalid checkpoint pattern: {}", e)))?;

        let mut names: Vec<String> = paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        names.sort();
        Ok(names)
    }

    fn list_expectation_suite_names(&self) -> Result<Vec<String>> {
        let dir = self.root_directory.join(EXPECTATIONS_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = WalkDir::new(&dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&dir).ok()?;
                ExpectationSuite::name_from_relative_path(relative)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn load_expectation_suite(&self, name: &str) -> Result<ExpectationSuite> {
        let path = ExpectationSuite::relative_path(name)
            .map(|relative| self.root_directory.join(EXPECTATIONS_DIR).join(relative));

        let path = match path {
            Some(path) if path.is_file() => path,
            _ => {
                return Err(GxError::SuiteNotFound {
                    name: name.to_string(),
                    available: self.list_expectation_suite_names()?,
                })
            }
        };

        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            GxError::DataContext(format!(
                "Unable to parse expectation suite `{}`: {}",
                name, e
            ))
        })
    }

    fn load_batch(&self, suite: &ExpectationSuite, batch_kwargs: &BatchKwargs) -> Result<Batch> {
        let (datasource_name, datasource) = self.resolve_datasource(batch_kwargs)?;
        let engine = datasource.engine()?;

        if !self.engines.is_available(engine) {
            return Err(GxError::DataContext(format!(
                "Datasource `{}` needs the {} engine, which is not available in this environment.",
                datasource_name,
                engine.as_str()
            )));
        }

        let typed = TypedBatchKwargs::for_engine(engine, batch_kwargs.clone(), &self.engines)?;
        tracing::debug!(
            datasource = %datasource_name,
            kind = typed.kind().name(),
            suite = %suite.expectation_suite_name,
            "loading batch"
        );

        let data = self.fetch(datasource_name, datasource, engine, &typed)?;
        let markers = BatchMarkers::now().with("row_count", serde_json::json!(data.row_count()));

        Ok(Batch::new(
            datasource_name,
            suite.clone(),
            typed.into_kwargs(),
            markers,
            data,
        ))
    }

    fn has_validation_operator(&self, name: &str) -> bool {
        self.operators.contains(name)
    }

    fn run_validation_operator(
        &self,
        name: &str,
        batches: Vec<Batch>,
        run_id: RunId,
    ) -> Result<OperatorResult> {
        let operator = self
            .operators
            .get(name)
            .ok_or_else(|| GxError::ValidationOperatorNotFound(name.to_string()))?;
        operator.run(batches, run_id)
    }

    fn emit_usage(&self, event: UsageEvent) {
        self.usage.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::RecordingSink;
    use serde_json::json;

    const CONFIG: &str = r#"
datasources:
  mydatasource:
    class_name: PandasDatasource
    base_directory: ../data
  warehouse:
    class_name: SqlAlchemyDatasource
"#;

    struct Project {
        _dir: tempfile::TempDir,
        root: PathBuf,
        sink: RecordingSink,
        context: FileDataContext,
    }

    fn project(config: &str) -> Project {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("great_expectations");
        std::fs::create_dir_all(root.join(CHECKPOINTS_DIR)).unwrap();
        std::fs::create_dir_all(root.join(EXPECTATIONS_DIR).join("titanic")).unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(root.join(CONFIG_FILE), config).unwrap();
        std::fs::write(
            root.join(EXPECTATIONS_DIR).join("iceberg.json"),
            r#"{"expectation_suite_name": "iceberg"}"#,
        )
        .unwrap();
        std::fs::write(
            root.join(EXPECTATIONS_DIR).join("titanic").join("warning.json"),
            r#"{"expectation_suite_name": "titanic.warning"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("data").join("Titanic.csv"), "Name,Age\nAllen,29\n").unwrap();

        let sink = RecordingSink::new();
        let usage = UsageStatisticsHandler::new(true, Box::new(sink.clone()));
        let context = FileDataContext::open_with_usage(dir.path(), usage).unwrap();
        Project {
            _dir: dir,
            root,
            sink,
            context,
        }
    }

    #[test]
    fn test_open_emits_init_event() {
        let p = project(CONFIG);
        assert_eq!(p.context.root_directory(), std::fs::canonicalize(&p.root).unwrap());
        assert_eq!(p.sink.events(), vec![UsageEvent::new(DATA_CONTEXT_INIT, true)]);
    }

    #[test]
    fn test_open_without_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDataContext::open(dir.path(), false).err().unwrap();
        assert!(matches!(err, GxError::Config(_)));
    }

    #[test]
    fn test_checkpoints() {
        let p = project(CONFIG);
        assert!(p.context.list_checkpoints().unwrap().is_empty());

        std::fs::write(
            p.root.join(CHECKPOINTS_DIR).join("my_checkpoint.yml"),
            "validation_operator_name: action_list_operator\nbatches: []\n",
        )
        .unwrap();
        std::fs::write(p.root.join(CHECKPOINTS_DIR).join("notes.txt"), "").unwrap();

        assert_eq!(p.context.list_checkpoints().unwrap(), vec!["my_checkpoint"]);
        assert!(p.context.get_checkpoint("my_checkpoint").unwrap().batches.is_empty());
        assert!(matches!(
            p.context.get_checkpoint("fake_checkpoint"),
            Err(GxError::CheckpointNotFound(name)) if name == "fake_checkpoint"
        ));
        assert_eq!(
            p.context.checkpoint_file_display("bad_batch"),
            "great_expectations/checkpoints/bad_batch.yml"
        );
    }

    #[test]
    fn test_checkpoint_name_cannot_leave_checkpoints_dir() {
        let p = project(CONFIG);
        // checkpoints/../great_expectations.yml 은 존재하는 파일
        for name in ["../great_expectations", "..", ".", "", "sub\\cp", "/etc/passwd"] {
            let err = p.context.get_checkpoint(name).unwrap_err();
            assert!(matches!(err, GxError::Checkpoint(_)), "{}: {:?}", name, err);
            assert!(err.to_string().contains("Invalid checkpoint name"));
        }
    }

    #[test]
    fn test_in_memory_kwargs_without_frame() {
        let p = project(CONFIG);
        let kwargs = BatchKwargs::new()
            .with("dataset", json!([1, 2]))
            .with("datasource", "mydatasource");

        let err = p
            .context
            .load_batch(&ExpectationSuite::new("iceberg"), &kwargs)
            .unwrap_err();
        assert!(matches!(err, GxError::InvalidBatchKwargs(_)));
    }

    #[test]
    fn test_suites() {
        let p = project(CONFIG);
        assert_eq!(
            p.context.list_expectation_suite_names().unwrap(),
            vec!["iceberg", "titanic.warning"]
        );
        assert_eq!(
            p.context.load_expectation_suite("titanic.warning").unwrap(),
            ExpectationSuite::new("titanic.warning")
        );

        match p.context.load_expectation_suite("suite_one") {
            Err(GxError::SuiteNotFound { name, available }) => {
                assert_eq!(name, "suite_one");
                assert_eq!(available, vec!["iceberg", "titanic.warning"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_load_path_batch() {
        let p = project(CONFIG);
        let suite = ExpectationSuite::new("iceberg");
        let kwargs = BatchKwargs::new()
            .with("path", "Titanic.csv")
            .with("datasource", "mydatasource");

        let batch = p.context.load_batch(&suite, &kwargs).unwrap();
        assert_eq!(batch.datasource_name, "mydatasource");
        assert_eq!(batch.expectation_suite_name(), "iceberg");
        assert_eq!(batch.batch_kwargs, kwargs);
        assert_eq!(batch.data.columns, vec!["Name", "Age"]);
        assert!(batch.batch_markers.ge_load_time().is_some());
        assert_eq!(
            batch.batch_markers.as_kwargs().get_value("row_count"),
            Some(&json!(1))
        );
    }

    #[test]
    fn test_load_batch_failures() {
        let p = project(CONFIG);
        let suite = ExpectationSuite::new("iceberg");

        let missing = BatchKwargs::new()
            .with("path", "/totally/not/a/file.csv")
            .with("datasource", "mydatasource")
            .with("reader_method", "read_csv");
        let err = p.context.load_batch(&suite, &missing).unwrap_err();
        assert!(err.to_string().contains("/totally/not/a/file.csv"));

        let unknown = BatchKwargs::new().with("path", "/a.csv").with("datasource", "nope");
        let err = p.context.load_batch(&suite, &unknown).unwrap_err();
        assert!(err.to_string().contains("Unable to load datasource `nope`"));

        let wrong_shape = BatchKwargs::new().with("path", "/a.csv").with("datasource", "warehouse");
        let err = p.context.load_batch(&suite, &wrong_shape).unwrap_err();
        assert!(matches!(err, GxError::InvalidBatchKwargs(_)));

        let table = BatchKwargs::new().with("table", "events").with("datasource", "warehouse");
        let err = p.context.load_batch(&suite, &table).unwrap_err();
        assert!(err.to_string().contains("no reachable sqlalchemy backend"));

        let no_datasource = BatchKwargs::new().with("path", "/a.csv");
        assert!(p.context.load_batch(&suite, &no_datasource).is_err());
    }

    #[test]
    fn test_in_memory_batch() {
        let p = project(CONFIG);
        let frame = InMemoryDataset::pandas(vec!["a".to_string()], vec![vec![json!(1)]]);
        let kwargs = BatchKwargs::new()
            .with("dataset", frame.clone())
            .with("datasource", "mydatasource");

        let batch = p
            .context
            .load_batch(&ExpectationSuite::new("iceberg"), &kwargs)
            .unwrap();
        assert_eq!(batch.data, frame);
    }

    #[test]
    fn test_unavailable_engine() {
        let config = "datasources:\n  spark_files:\n    class_name: SparkDFDatasource\nexecution_engines: [pandas]\n";
        let p = project(config);
        let kwargs = BatchKwargs::new().with("path", "/a.csv");

        let err = p
            .context
            .load_batch(&ExpectationSuite::new("iceberg"), &kwargs)
            .unwrap_err();
        assert!(err.to_string().contains("spark engine, which is not available"));
    }

    #[test]
    fn test_run_validation_operator() {
        let p = project(CONFIG);
        assert!(p.context.has_validation_operator("action_list_operator"));
        assert!(!p.context.has_validation_operator("foo"));

        let kwargs = BatchKwargs::new()
            .with("path", "Titanic.csv")
            .with("datasource", "mydatasource");
        let batch = p
            .context
            .load_batch(&ExpectationSuite::new("iceberg"), &kwargs)
            .unwrap();

        let result = p
            .context
            .run_validation_operator("action_list_operator", vec![batch], RunId::for_checkpoint("cp"))
            .unwrap();
        assert!(result.success);
        assert!(p.root.join(UNCOMMITTED_DIR).join("validations").join("iceberg").join("cp").is_dir());

        let err = p
            .context
            .run_validation_operator("foo", Vec::new(), RunId::for_checkpoint("cp"))
            .unwrap_err();
        assert!(matches!(err, GxError::ValidationOperatorNotFound(_)));
    }
}
