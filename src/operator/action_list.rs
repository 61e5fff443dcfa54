use crate::batch::Batch;
use crate::error::{GxError, Result};
use crate::operator::{
    BatchValidationResult, OperatorResult, RunId, SuiteEvaluator, ValidationOperator,
};
use crate::suite::ExpectationSuite;
use std::path::PathBuf;

/// 검증 결과마다 실행되는 후속 작업
pub trait ValidationAction: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, result: &BatchValidationResult, run_id: &RunId) -> Result<()>;
}

/// 검증 결과를 JSON 파일로 저장
///
/// `<base>/<suite path>/<run_name>/<run_time>/<batch_fingerprint>.json`
pub struct StoreValidationResultAction {
    name: String,
    base_directory: PathBuf,
}

impl StoreValidationResultAction {
    pub fn new(name: impl Into<String>, base_directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_directory: base_directory.into(),
        }
    }

    pub fn result_path(&self, result: &BatchValidationResult, run_id: &RunId) -> Result<PathBuf> {
        let suite_path = ExpectationSuite::relative_path(&result.expectation_suite_name)
            .ok_or_else(|| {
                GxError::DataContext(format!(
                    "Invalid expectation suite name `{}`",
                    result.expectation_suite_name
                ))
            })?;

        Ok(self
            .base_directory
            .join(suite_path.with_extension(""))
            .join(&run_id.run_name)
            .join(run_id.run_time_str())
            .join(format!("{}.json", result.batch_fingerprint)))
    }
}

impl ValidationAction for StoreValidationResultAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, result: &BatchValidationResult, run_id: &RunId) -> Result<()> {
        let path = self.result_path(result, run_id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "stored validation result");
        Ok(())
    }
}

/// 배치마다 evaluator를 돌리고 결과에 action 목록을 순서대로 적용
pub struct ActionListOperator {
    name: String,
    evaluator: Box<dyn SuiteEvaluator>,
    actions: Vec<Box<dyn ValidationAction>>,
}

impl ActionListOperator {
    pub fn new(name: impl Into<String>, evaluator: Box<dyn SuiteEvaluator>) -> Self {
        Self {
            name: name.into(),
            evaluator,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Box<dyn ValidationAction>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }
}

impl ValidationOperator for ActionListOperator {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, batches: Vec<Batch>, run_id: RunId) -> Result<OperatorResult> {
        tracing::info!(
            operator = %self.name,
            run_name = %run_id.run_name,
            batches = batches.len(),
            "running validation operator"
        );

        let mut run_results = Vec::with_capacity(batches.len());
        for batch in &batches {
            let result = self.evaluator.evaluate(batch)?;
            for action in &self.actions {
                action.run(&result, &run_id)?;
            }
            run_results.push(result);
        }

        Ok(OperatorResult::from_results(run_id, run_results))
    }
}
