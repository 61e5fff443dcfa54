pub mod file_context;
#[cfg(test)]
pub(crate) mod mock;
pub mod project;
pub mod reader;

use crate::batch::{Batch, BatchKwargs};
use crate::checkpoint::CheckpointConfig;
use crate::error::Result;
use crate::operator::{OperatorResult, RunId};
use crate::suite::ExpectationSuite;
use crate::usage::UsageEvent;
use std::path::Path;

pub use file_context::FileDataContext;
pub use project::ProjectConfig;

pub const CONFIG_FILE: &str = "great_expectations.yml";
pub const CHECKPOINTS_DIR: &str = "checkpoints";
pub const EXPECTATIONS_DIR: &str = "expectations";
pub const UNCOMMITTED_DIR: &str = "uncommitted";

/// 체크포인트 실행이 의존하는 프로젝트 핸들
///
/// 스위트/체크포인트 저장소, 배치 로딩, validation operator 실행을 제공합니다.
pub trait DataContext {
    fn root_directory(&self) -> &Path;

    /// # Errors
    /// * 파일이 없으면 `GxError::CheckpointNotFound`
    /// * 구조 문제는 `GxError::Checkpoint`
    fn get_checkpoint(&self, name: &str) -> Result<CheckpointConfig>;

    fn list_checkpoints(&self) -> Result<Vec<String>>;

    fn list_expectation_suite_names(&self) -> Result<Vec<String>>;

    /// # Errors
    /// * 없으면 `GxError::SuiteNotFound`
    fn load_expectation_suite(&self, name: &str) -> Result<ExpectationSuite>;

    /// # Errors
    /// * 소스에 접근할 수 없거나 kwargs가 잘못되면 에러
    fn load_batch(&self, suite: &ExpectationSuite, batch_kwargs: &BatchKwargs) -> Result<Batch>;

    fn has_validation_operator(&self, name: &str) -> bool;

    fn run_validation_operator(
        &self,
        name: &str,
        batches: Vec<Batch>,
        run_id: RunId,
    ) -> Result<OperatorResult>;

    fn emit_usage(&self, event: UsageEvent);

    /// 사용자에게 보여줄 체크포인트 파일 경로
    ///
    /// `great_expectations/checkpoints/<name>.yml`처럼 프로젝트 디렉토리 이름부터 표시합니다.
    fn checkpoint_file_display(&self, name: &str) -> String {
        let root = self.root_directory();
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        format!("{}/{}/{}.yml", root_name, CHECKPOINTS_DIR, name)
    }
}

/// `start`부터 부모 방향으로 프로젝트 루트를 찾음
///
/// `great_expectations.yml`이 있는 디렉토리, 또는 그런 `great_expectations/` 하위 디렉토리.
pub fn find_context_root(start: &Path) -> Option<std::path::PathBuf> {
    for dir in start.ancestors() {
        if dir.join(CONFIG_FILE).is_file() {
            return Some(dir.to_path_buf());
        }
        let nested = dir.join("great_expectations");
        if nested.join(CONFIG_FILE).is_file() {
            return Some(nested);
        }
    }
    None
}
