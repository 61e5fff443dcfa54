use crate::batch::{Batch, BatchKwargs, BatchMarkers, InMemoryDataset};
use crate::checkpoint::CheckpointConfig;
use crate::context::DataContext;
use crate::error::{GxError, Result};
use crate::operator::{BatchValidationResult, OperatorResult, RunId};
use crate::suite::ExpectationSuite;
use crate::usage::UsageEvent;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 메모리 안에서 동작하는 context
pub(crate) struct MockContext {
    pub(crate) root: PathBuf,
    pub(crate) checkpoints: HashMap<String, String>,
    pub(crate) suites: Vec<String>,
    pub(crate) broken_paths: Vec<String>,
    pub(crate) operators: Vec<String>,
    pub(crate) validation_success: bool,
    pub(crate) loads: RefCell<Vec<(String, String)>>,
    pub(crate) operator_calls: RefCell<Vec<(String, usize)>>,
    pub(crate) events: RefCell<Vec<UsageEvent>>,
}

impl MockContext {
    pub(crate) fn new() -> Self {
        Self {
            root: PathBuf::from("/project/great_expectations"),
            checkpoints: HashMap::new(),
            suites: vec!["iceberg".to_string(), "titanic.warning".to_string()],
            broken_paths: vec!["/totally/not/a/file.csv".to_string()],
            operators: vec!["action_list_operator".to_string()],
            validation_success: true,
            loads: RefCell::new(Vec::new()),
            operator_calls: RefCell::new(Vec::new()),
            events: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_checkpoint(mut self, name: &str, yaml: &str) -> Self {
        self.checkpoints.insert(name.to_string(), yaml.to_string());
        self
    }
}

impl DataContext for MockContext {
    fn root_directory(&self) -> &Path {
        &self.root
    }

    fn get_checkpoint(&self, name: &str) -> Result<CheckpointConfig> {
        match self.checkpoints.get(name) {
            Some(yaml) => CheckpointConfig::from_yaml(name, yaml),
            None => Err(GxError::CheckpointNotFound(name.to_string())),
        }
    }

    fn list_checkpoints(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.checkpoints.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn list_expectation_suite_names(&self) -> Result<Vec<String>> {
        Ok(self.suites.clone())
    }

    fn load_expectation_suite(&self, name: &str) -> Result<ExpectationSuite> {
        if self.suites.iter().any(|s| s == name) {
            Ok(ExpectationSuite::new(name))
        } else {
            Err(GxError::SuiteNotFound {
                name: name.to_string(),
                available: self.suites.clone(),
            })
        }
    }

    fn load_batch(&self, suite: &ExpectationSuite, batch_kwargs: &BatchKwargs) -> Result<Batch> {
        let path = batch_kwargs.get_str("path").unwrap_or_default().to_string();
        if self.broken_paths.contains(&path) {
            return Err(GxError::DataContext(format!("Unable to read `{}`", path)));
        }
        self.loads
            .borrow_mut()
            .push((suite.expectation_suite_name.clone(), path));
        Ok(Batch::new(
            "mydatasource",
            suite.clone(),
            batch_kwargs.clone(),
            BatchMarkers::now(),
            InMemoryDataset::pandas(Vec::new(), Vec::new()),
        ))
    }

    fn has_validation_operator(&self, name: &str) -> bool {
        self.operators.iter().any(|o| o == name)
    }

    fn run_validation_operator(
        &self,
        name: &str,
        batches: Vec<Batch>,
        run_id: RunId,
    ) -> Result<OperatorResult> {
        self.operator_calls
            .borrow_mut()
            .push((name.to_string(), batches.len()));
        let results = batches
            .iter()
            .map(|b| BatchValidationResult::for_batch(b, self.validation_success))
            .collect();
        Ok(OperatorResult::from_results(run_id, results))
    }

    fn emit_usage(&self, event: UsageEvent) {
        self.events.borrow_mut().push(event);
    }
}
