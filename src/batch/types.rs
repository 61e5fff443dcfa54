//! 검증된 batch kwargs 변형
//!
//! 각 변형은 접근 방식에 필요한 키를 확인한 [`BatchKwargs`]를 감쌉니다.
//! 변형을 소비할 수 있는 엔진은 명시적인 capability 집합으로 정합니다.

use crate::batch::dataset::{FrameKind, InMemoryDataset};
use crate::batch::kwargs::{BatchKwargs, KwargValue};
use crate::error::{GxError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// 배치를 소비하는 실행 엔진
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionEngine {
    Pandas,
    Spark,
    SqlAlchemy,
}

impl ExecutionEngine {
    pub const ALL: [ExecutionEngine; 3] = [
        ExecutionEngine::Pandas,
        ExecutionEngine::Spark,
        ExecutionEngine::SqlAlchemy,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ExecutionEngine::Pandas => "pandas",
            ExecutionEngine::Spark => "spark",
            ExecutionEngine::SqlAlchemy => "sqlalchemy",
        }
    }
}

/// 현재 환경에서 엔진을 사용할 수 있는지 알려주는 레지스트리
///
/// 생성자가 환경을 직접 조사하지 않도록 주입합니다.
pub trait EngineAvailability {
    fn is_available(&self, engine: ExecutionEngine) -> bool;
}

impl<F> EngineAvailability for F
where
    F: Fn(ExecutionEngine) -> bool,
{
    fn is_available(&self, engine: ExecutionEngine) -> bool {
        self(engine)
    }
}

/// 시작 시점에 결정되는 고정 엔진 목록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRegistry {
    available: HashSet<ExecutionEngine>,
}

impl EngineRegistry {
    pub fn all() -> Self {
        Self::only(ExecutionEngine::ALL)
    }

    pub fn only(engines: impl IntoIterator<Item = ExecutionEngine>) -> Self {
        Self {
            available: engines.into_iter().collect(),
        }
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::all()
    }
}

impl EngineAvailability for EngineRegistry {
    fn is_available(&self, engine: ExecutionEngine) -> bool {
        self.available.contains(&engine)
    }
}

/// batch kwargs 변형의 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKwargsKind {
    Path,
    S3,
    InMemory,
    PandasInMemory,
    SparkInMemory,
    SqlAlchemyTable,
    SqlAlchemyQuery,
    SparkQuery,
}

impl BatchKwargsKind {
    pub fn name(&self) -> &'static str {
        match self {
            BatchKwargsKind::Path => "PathBatchKwargs",
            BatchKwargsKind::S3 => "S3BatchKwargs",
            BatchKwargsKind::InMemory => "InMemoryBatchKwargs",
            BatchKwargsKind::PandasInMemory => "PandasDatasourceInMemoryBatchKwargs",
            BatchKwargsKind::SparkInMemory => "SparkDFDatasourceInMemoryBatchKwargs",
            BatchKwargsKind::SqlAlchemyTable => "SqlAlchemyDatasourceTableBatchKwargs",
            BatchKwargsKind::SqlAlchemyQuery => "SqlAlchemyDatasourceQueryBatchKwargs",
            BatchKwargsKind::SparkQuery => "SparkDFDatasourceQueryBatchKwargs",
        }
    }

    pub fn required_key(&self) -> &'static str {
        match self {
            BatchKwargsKind::Path => "path",
            BatchKwargsKind::S3 => "s3",
            BatchKwargsKind::InMemory
            | BatchKwargsKind::PandasInMemory
            | BatchKwargsKind::SparkInMemory => "dataset",
            BatchKwargsKind::SqlAlchemyTable => "table",
            BatchKwargsKind::SqlAlchemyQuery | BatchKwargsKind::SparkQuery => "query",
        }
    }

    /// 이 변형을 소비할 수 있는 엔진 집합
    pub fn engines(&self) -> &'static [ExecutionEngine] {
        use ExecutionEngine::*;
        match self {
            BatchKwargsKind::Path | BatchKwargsKind::S3 | BatchKwargsKind::InMemory => {
                &[Pandas, Spark]
            }
            BatchKwargsKind::PandasInMemory => &[Pandas],
            BatchKwargsKind::SparkInMemory | BatchKwargsKind::SparkQuery => &[Spark],
            BatchKwargsKind::SqlAlchemyTable | BatchKwargsKind::SqlAlchemyQuery => &[SqlAlchemy],
        }
    }

    pub fn supports(&self, engine: ExecutionEngine) -> bool {
        self.engines().contains(&engine)
    }

    fn frame_kind(&self) -> Option<FrameKind> {
        match self {
            BatchKwargsKind::PandasInMemory => Some(FrameKind::Pandas),
            BatchKwargsKind::SparkInMemory => Some(FrameKind::Spark),
            _ => None,
        }
    }
}

fn require(kind: BatchKwargsKind, kwargs: &BatchKwargs) -> Result<()> {
    if kwargs.contains_key(kind.required_key()) {
        Ok(())
    } else {
        Err(GxError::InvalidBatchKwargs(format!(
            "{} requires a '{}' element",
            kind.name(),
            kind.required_key()
        )))
    }
}

fn require_frame(
    kind: BatchKwargsKind,
    frame: FrameKind,
    kwargs: &BatchKwargs,
    engines: &dyn EngineAvailability,
) -> Result<()> {
    require(kind, kwargs)?;

    if !engines.is_available(frame.engine()) {
        return Err(GxError::InvalidBatchKwargs(format!(
            "{} requires a valid {} installation, but the {} engine is not available.",
            kind.name(),
            frame.as_str(),
            frame.as_str()
        )));
    }

    match kwargs.get("dataset").and_then(KwargValue::as_dataset) {
        Some(dataset) if dataset.kind == frame => Ok(()),
        _ => Err(GxError::InvalidBatchKwargs(format!(
            "{} 'dataset' must be a {} DataFrame",
            kind.name(),
            frame.as_str()
        ))),
    }
}

macro_rules! batch_kwargs_variant {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            kwargs: BatchKwargs,
        }

        impl $name {
            pub const KIND: BatchKwargsKind = $kind;

            pub fn as_kwargs(&self) -> &BatchKwargs {
                &self.kwargs
            }

            pub fn into_kwargs(self) -> BatchKwargs {
                self.kwargs
            }
        }
    };
}

batch_kwargs_variant!(
    /// 파일 경로로 읽는 배치
    PathBatchKwargs => BatchKwargsKind::Path
);
batch_kwargs_variant!(
    /// S3 오브젝트 키로 읽는 배치
    S3BatchKwargs => BatchKwargsKind::S3
);
batch_kwargs_variant!(InMemoryBatchKwargs => BatchKwargsKind::InMemory);
batch_kwargs_variant!(PandasInMemoryBatchKwargs => BatchKwargsKind::PandasInMemory);
batch_kwargs_variant!(SparkInMemoryBatchKwargs => BatchKwargsKind::SparkInMemory);
batch_kwargs_variant!(
    /// 데이터베이스 테이블 전체 (또는 `limit` 행)
    SqlAlchemyTableBatchKwargs => BatchKwargsKind::SqlAlchemyTable
);
batch_kwargs_variant!(SqlAlchemyQueryBatchKwargs => BatchKwargsKind::SqlAlchemyQuery);
batch_kwargs_variant!(SparkQueryBatchKwargs => BatchKwargsKind::SparkQuery);

impl PathBatchKwargs {
    pub fn new(kwargs: BatchKwargs) -> Result<Self> {
        require(Self::KIND, &kwargs)?;
        Ok(Self { kwargs })
    }

    pub fn path(&self) -> Option<&Value> {
        self.kwargs.get_value("path")
    }

    pub fn reader_method(&self) -> Option<&Value> {
        self.kwargs.get_value("reader_method")
    }
}

impl S3BatchKwargs {
    pub fn new(kwargs: BatchKwargs) -> Result<Self> {
        require(Self::KIND, &kwargs)?;
        Ok(Self { kwargs })
    }

    pub fn s3(&self) -> Option<&Value> {
        self.kwargs.get_value("s3")
    }

    pub fn reader_method(&self) -> Option<&Value> {
        self.kwargs.get_value("reader_method")
    }
}

impl InMemoryBatchKwargs {
    pub fn new(kwargs: BatchKwargs) -> Result<Self> {
        require(Self::KIND, &kwargs)?;
        Ok(Self { kwargs })
    }

    pub fn dataset(&self) -> Option<&KwargValue> {
        self.kwargs.get("dataset")
    }
}

impl PandasInMemoryBatchKwargs {
    pub fn new(kwargs: BatchKwargs, engines: &dyn EngineAvailability) -> Result<Self> {
        require_frame(Self::KIND, FrameKind::Pandas, &kwargs, engines)?;
        Ok(Self { kwargs })
    }

    pub fn dataset(&self) -> Option<&InMemoryDataset> {
        self.kwargs.get("dataset").and_then(KwargValue::as_dataset)
    }
}

impl SparkInMemoryBatchKwargs {
    pub fn new(kwargs: BatchKwargs, engines: &dyn EngineAvailability) -> Result<Self> {
        require_frame(Self::KIND, FrameKind::Spark, &kwargs, engines)?;
        Ok(Self { kwargs })
    }

    pub fn dataset(&self) -> Option<&InMemoryDataset> {
        self.kwargs.get("dataset").and_then(KwargValue::as_dataset)
    }
}

impl SqlAlchemyTableBatchKwargs {
    pub fn new(kwargs: BatchKwargs) -> Result<Self> {
        require(Self::KIND, &kwargs)?;
        Ok(Self { kwargs })
    }

    pub fn table(&self) -> Option<&Value> {
        self.kwargs.get_value("table")
    }

    pub fn limit(&self) -> Option<&Value> {
        self.kwargs.get_value("limit")
    }

    pub fn schema(&self) -> Option<&Value> {
        self.kwargs.get_value("schema")
    }
}

impl SqlAlchemyQueryBatchKwargs {
    pub fn new(kwargs: BatchKwargs) -> Result<Self> {
        require(Self::KIND, &kwargs)?;
        Ok(Self { kwargs })
    }

    pub fn query(&self) -> Option<&Value> {
        self.kwargs.get_value("query")
    }

    pub fn query_parameters(&self) -> Option<&Value> {
        self.kwargs.get_value("query_parameters")
    }

    pub fn limit(&self) -> Option<&Value> {
        self.kwargs.get_value("limit")
    }

    pub fn schema(&self) -> Option<&Value> {
        self.kwargs.get_value("schema")
    }
}

impl SparkQueryBatchKwargs {
    pub fn new(kwargs: BatchKwargs) -> Result<Self> {
        require(Self::KIND, &kwargs)?;
        Ok(Self { kwargs })
    }

    pub fn query(&self) -> Option<&Value> {
        self.kwargs.get_value("query")
    }
}

/// 검증을 통과한 batch kwargs
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBatchKwargs {
    Path(PathBatchKwargs),
    S3(S3BatchKwargs),
    InMemory(InMemoryBatchKwargs),
    PandasInMemory(PandasInMemoryBatchKwargs),
    SparkInMemory(SparkInMemoryBatchKwargs),
    SqlAlchemyTable(SqlAlchemyTableBatchKwargs),
    SqlAlchemyQuery(SqlAlchemyQueryBatchKwargs),
    SparkQuery(SparkQueryBatchKwargs),
}

impl TypedBatchKwargs {
    /// 태그에 해당하는 변형을 생성
    ///
    /// # Errors
    /// * 필수 키가 없으면 `GxError::InvalidBatchKwargs`
    /// * 인메모리 변형에서 프레임 종류가 다르거나 엔진을 사용할 수 없을 때도 같은 에러
    pub fn new(
        kind: BatchKwargsKind,
        kwargs: BatchKwargs,
        engines: &dyn EngineAvailability,
    ) -> Result<Self> {
        let typed = match kind {
            BatchKwargsKind::Path => Self::Path(PathBatchKwargs::new(kwargs)?),
            BatchKwargsKind::S3 => Self::S3(S3BatchKwargs::new(kwargs)?),
            BatchKwargsKind::InMemory => Self::InMemory(InMemoryBatchKwargs::new(kwargs)?),
            BatchKwargsKind::PandasInMemory => {
                Self::PandasInMemory(PandasInMemoryBatchKwargs::new(kwargs, engines)?)
            }
            BatchKwargsKind::SparkInMemory => {
                Self::SparkInMemory(SparkInMemoryBatchKwargs::new(kwargs, engines)?)
            }
            BatchKwargsKind::SqlAlchemyTable => {
                Self::SqlAlchemyTable(SqlAlchemyTableBatchKwargs::new(kwargs)?)
            }
            BatchKwargsKind::SqlAlchemyQuery => {
                Self::SqlAlchemyQuery(SqlAlchemyQueryBatchKwargs::new(kwargs)?)
            }
            BatchKwargsKind::SparkQuery => Self::SparkQuery(SparkQueryBatchKwargs::new(kwargs)?),
        };
        Ok(typed)
    }

    /// 주어진 엔진의 datasource가 이 매핑으로 만들 변형을 선택
    pub fn for_engine(
        engine: ExecutionEngine,
        kwargs: BatchKwargs,
        engines: &dyn EngineAvailability,
    ) -> Result<Self> {
        let candidates: &[BatchKwargsKind] = match engine {
            ExecutionEngine::Pandas => &[
                BatchKwargsKind::Path,
                BatchKwargsKind::S3,
                BatchKwargsKind::PandasInMemory,
            ],
            ExecutionEngine::Spark => &[
                BatchKwargsKind::Path,
                BatchKwargsKind::S3,
                BatchKwargsKind::SparkInMemory,
                BatchKwargsKind::SparkQuery,
            ],
            ExecutionEngine::SqlAlchemy => &[
                BatchKwargsKind::SqlAlchemyTable,
                BatchKwargsKind::SqlAlchemyQuery,
            ],
        };

        match candidates
            .iter()
            .find(|kind| kwargs.contains_key(kind.required_key()))
        {
            Some(kind) => Self::new(*kind, kwargs, engines),
            None => {
                let keys: Vec<&str> = candidates.iter().map(|k| k.required_key()).collect();
                Err(GxError::InvalidBatchKwargs(format!(
                    "Invalid batch_kwargs for a {} datasource: one of {} is required",
                    engine.as_str(),
                    keys.join(", ")
                )))
            }
        }
    }

    pub fn kind(&self) -> BatchKwargsKind {
        match self {
            Self::Path(_) => BatchKwargsKind::Path,
            Self::S3(_) => BatchKwargsKind::S3,
            Self::InMemory(_) => BatchKwargsKind::InMemory,
            Self::PandasInMemory(_) => BatchKwargsKind::PandasInMemory,
            Self::SparkInMemory(_) => BatchKwargsKind::SparkInMemory,
            Self::SqlAlchemyTable(_) => BatchKwargsKind::SqlAlchemyTable,
            Self::SqlAlchemyQuery(_) => BatchKwargsKind::SqlAlchemyQuery,
            Self::SparkQuery(_) => BatchKwargsKind::SparkQuery,
        }
    }

    pub fn supports(&self, engine: ExecutionEngine) -> bool {
        self.kind().supports(engine)
    }

    pub fn as_kwargs(&self) -> &BatchKwargs {
        match self {
            Self::Path(k) => k.as_kwargs(),
            Self::S3(k) => k.as_kwargs(),
            Self::InMemory(k) => k.as_kwargs(),
            Self::PandasInMemory(k) => k.as_kwargs(),
            Self::SparkInMemory(k) => k.as_kwargs(),
            Self::SqlAlchemyTable(k) => k.as_kwargs(),
            Self::SqlAlchemyQuery(k) => k.as_kwargs(),
            Self::SparkQuery(k) => k.as_kwargs(),
        }
    }

    pub fn into_kwargs(self) -> BatchKwargs {
        match self {
            Self::Path(k) => k.into_kwargs(),
            Self::S3(k) => k.into_kwargs(),
            Self::InMemory(k) => k.into_kwargs(),
            Self::PandasInMemory(k) => k.into_kwargs(),
            Self::SparkInMemory(k) => k.into_kwargs(),
            Self::SqlAlchemyTable(k) => k.into_kwargs(),
            Self::SqlAlchemyQuery(k) => k.into_kwargs(),
            Self::SparkQuery(k) => k.into_kwargs(),
        }
    }

    /// 인메모리 프레임 변형이 요구하는 프레임 종류
    pub fn frame_kind(&self) -> Option<FrameKind> {
        self.kind().frame_kind()
    }
}
