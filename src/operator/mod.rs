pub mod action_list;
pub mod registry;

use crate::batch::{Batch, BatchKwargs};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use action_list::{ActionListOperator, StoreValidationResultAction, ValidationAction};
pub use registry::OperatorRegistry;

pub const RUN_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// 검증 실행 식별자 (이름 + 시작 시각)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId {
    pub run_name: String,
    pub run_time: DateTime<Utc>,
}

impl RunId {
    pub fn new(run_name: impl Into<String>, run_time: DateTime<Utc>) -> Self {
        Self {
            run_name: run_name.into(),
            run_time,
        }
    }

    /// 체크포인트 실행용: 체크포인트 이름 + 현재 시각
    pub fn for_checkpoint(checkpoint_name: &str) -> Self {
        Self::new(checkpoint_name, Utc::now())
    }

    pub fn run_time_str(&self) -> String {
        self.run_time.format(RUN_TIME_FORMAT).to_string()
    }
}

/// 배치 하나에 대한 검증 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchValidationResult {
    pub expectation_suite_name: String,
    pub batch_kwargs: BatchKwargs,
    pub batch_kwargs_fingerprint: String,
    pub batch_fingerprint: String,
    pub success: bool,
    pub evaluated_expectations: usize,
    pub successful_expectations: usize,
    pub unsuccessful_expectations: usize,
}

impl BatchValidationResult {
    /// 배치 정보를 채운 결과 (통계는 0)
    pub fn for_batch(batch: &Batch, success: bool) -> Self {
        Self {
            expectation_suite_name: batch.expectation_suite_name().to_string(),
            batch_kwargs: batch.batch_kwargs.clone(),
            batch_kwargs_fingerprint: batch.batch_kwargs_fingerprint(),
            batch_fingerprint: batch.batch_fingerprint(),
            success,
            evaluated_expectations: 0,
            successful_expectations: 0,
            unsuccessful_expectations: 0,
        }
    }
}

/// validation operator의 집계 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorResult {
    pub success: bool,
    pub run_id: RunId,
    pub run_results: Vec<BatchValidationResult>,
}

impl OperatorResult {
    pub fn from_results(run_id: RunId, run_results: Vec<BatchValidationResult>) -> Self {
        let success = run_results.iter().all(|r| r.success);
        Self {
            success,
            run_id,
            run_results,
        }
    }
}

/// 로드된 배치들을 받아 검증하고 결과를 집계하는 컴포넌트
pub trait ValidationOperator: Send + Sync {
    fn name(&self) -> &str;

    /// 배치 목록 전체를 한 번에 검증
    fn run(&self, batches: Vec<Batch>, run_id: RunId) -> Result<OperatorResult>;
}

/// 배치를 스위트로 평가하는 엔진
pub trait SuiteEvaluator: Send + Sync {
    fn evaluate(&self, batch: &Batch) -> Result<BatchValidationResult>;
}

/// expectation을 평가하지 않고 스위트와 배치만 기록하는 evaluator
///
/// 실제 평가 엔진은 `SuiteEvaluator`를 구현해 operator에 연결합니다.
#[derive(Debug, Default)]
pub struct UnevaluatedSuiteEvaluator;

impl SuiteEvaluator for UnevaluatedSuiteEvaluator {
    fn evaluate(&self, batch: &Batch) -> Result<BatchValidationResult> {
        tracing::debug!(
            suite = %batch.expectation_suite_name(),
            expectations = batch.expectation_suite.expectations.len(),
            rows = batch.data.row_count(),
            "recording batch without evaluating expectations"
        );
        Ok(BatchValidationResult::for_batch(batch, true))
    }
}
