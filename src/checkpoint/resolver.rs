use crate::batch::Batch;
use crate::checkpoint::{CheckpointBatch, CheckpointConfig};
use crate::context::DataContext;
use crate::error::{GxError, Result};
use crate::operator::{OperatorResult, RunId};

/// 체크포인트의 배치들을 로드
///
/// 파일 순서를 유지하며, 첫 번째 실패에서 중단합니다 (부분 검증 없음).
///
/// # Errors
/// * 스위트 목록이 비어 있으면 `GxError::EmptySuiteList`
/// * 스위트가 없으면 `GxError::SuiteNotFound`
/// * 배치를 가져오지 못하면 `GxError::BatchLoad`
pub fn resolve_batches(
    context: &dyn DataContext,
    checkpoint_name: &str,
    checkpoint: &CheckpointConfig,
) -> Result<Vec<Batch>> {
    checkpoint
        .batches
        .iter()
        .try_fold(Vec::new(), |mut loaded, descriptor| {
            resolve_descriptor(context, checkpoint_name, descriptor, &mut loaded)?;
            Ok(loaded)
        })
}

fn resolve_descriptor(
    context: &dyn DataContext,
    checkpoint_name: &str,
    descriptor: &CheckpointBatch,
    loaded: &mut Vec<Batch>,
) -> Result<()> {
    if descriptor.expectation_suite_names.is_empty() {
        return Err(GxError::EmptySuiteList {
            batch_kwargs: descriptor.batch_kwargs.to_string(),
            checkpoint_file: context.checkpoint_file_display(checkpoint_name),
        });
    }

    for suite_name in &descriptor.expectation_suite_names {
        let suite = context.load_expectation_suite(suite_name)?;

        let batch = context
            .load_batch(&suite, &descriptor.batch_kwargs)
            .map_err(|e| GxError::BatchLoad {
                batch_kwargs: descriptor.batch_kwargs.to_string(),
                checkpoint_file: context.checkpoint_file_display(checkpoint_name),
                source: Box::new(e),
            })?;

        tracing::debug!(
            checkpoint = %checkpoint_name,
            suite = %suite_name,
            batch = %batch.batch_fingerprint(),
            "loaded batch"
        );
        loaded.push(batch);
    }

    Ok(())
}

/// 체크포인트 이름으로 검증 실행
///
/// 정의를 새로 읽고, 배치를 모두 로드한 뒤 validation operator를 한 번 호출합니다.
/// 검증 실패(`success: false`)는 에러가 아니라 정상 결과입니다.
///
/// # Errors
/// * `GxError::CheckpointNotFound`, `GxError::Checkpoint` - 정의를 읽을 수 없음
/// * `resolve_batches`의 에러
/// * `GxError::ValidationOperatorNotFound` - operator가 등록되지 않음
pub fn run_checkpoint(context: &dyn DataContext, checkpoint_name: &str) -> Result<OperatorResult> {
    let checkpoint = context.get_checkpoint(checkpoint_name)?;
    let batches = resolve_batches(context, checkpoint_name, &checkpoint)?;

    let operator_name = checkpoint.validation_operator_name.as_str();
    if !context.has_validation_operator(operator_name) {
        return Err(GxError::ValidationOperatorNotFound(operator_name.to_string()));
    }

    tracing::info!(
        checkpoint = %checkpoint_name,
        operator = %operator_name,
        batches = batches.len(),
        "running validation operator"
    );
    context.run_validation_operator(operator_name, batches, RunId::for_checkpoint(checkpoint_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::mock::MockContext;

    const GOOD: &str = r#"
validation_operator_name: action_list_operator
batches:
  - batch_kwargs:
      path: /data/Titanic.csv
      datasource: mydatasource
    expectation_suite_names: [iceberg, titanic.warning]
  - batch_kwargs:
      path: /data/Titanic_1912.csv
      datasource: mydatasource
    expectation_suite_names: [iceberg]
"#;

    #[test]
    fn test_run_checkpoint_success() {
        let context = MockContext::new().with_checkpoint("my_checkpoint", GOOD);
        let result = run_checkpoint(&context, "my_checkpoint").unwrap();

        assert!(result.success);
        assert_eq!(result.run_id.run_name, "my_checkpoint");
        assert_eq!(result.run_results.len(), 3);
        assert_eq!(
            *context.loads.borrow(),
            vec![
                ("iceberg".to_string(), "/data/Titanic.csv".to_string()),
                ("titanic.warning".to_string(), "/data/Titanic.csv".to_string()),
                ("iceberg".to_string(), "/data/Titanic_1912.csv".to_string()),
            ]
        );
        assert_eq!(
            *context.operator_calls.borrow(),
            vec![("action_list_operator".to_string(), 3)]
        );
    }

    #[test]
    fn test_validation_failure_is_a_result() {
        let mut context = MockContext::new().with_checkpoint("my_checkpoint", GOOD);
        context.validation_success = false;

        let result = run_checkpoint(&context, "my_checkpoint").unwrap();
        assert!(!result.success);
    }

    #[test]
    fn test_checkpoint_not_found() {
        let context = MockContext::new();
        let err = run_checkpoint(&context, "fake_checkpoint").unwrap_err();
        assert!(matches!(err, GxError::CheckpointNotFound(ref n) if n == "fake_checkpoint"));
        assert!(context.operator_calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_operator_name_is_checkpoint_error() {
        let yaml = "batches:\n  - batch_kwargs: {path: /data/Titanic.csv}\n    expectation_suite_names: [iceberg]\n";
        let context = MockContext::new().with_checkpoint("cp", yaml);

        let err = run_checkpoint(&context, "cp").unwrap_err();
        assert!(matches!(err, GxError::Checkpoint(_)));
        assert!(context.loads.borrow().is_empty());
    }

    #[test]
    fn test_empty_suite_list_aborts_before_loading() {
        let yaml = r#"
validation_operator_name: action_list_operator
batches:
  - batch_kwargs: {path: /data/Titanic.csv, datasource: mydatasource}
    expectation_suite_names: [iceberg]
  - batch_kwargs: {path: /data/Titanic.csv, datasource: mydatasource}
    expectation_suite_names: []
"#;
        let context = MockContext::new().with_checkpoint("bad_batch", yaml);

        match run_checkpoint(&context, "bad_batch").unwrap_err() {
            GxError::EmptySuiteList {
                batch_kwargs,
                checkpoint_file,
            } => {
                assert_eq!(
                    batch_kwargs,
                    "{'path': '/data/Titanic.csv', 'datasource': 'mydatasource'}"
                );
                assert_eq!(checkpoint_file, "great_expectations/checkpoints/bad_batch.yml");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(context.operator_calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_suite_lists_available() {
        let yaml = "validation_operator_name: action_list_operator\nbatches:\n  - batch_kwargs: {path: /data/Titanic.csv}\n    expectation_suite_names: [suite_one]\n";
        let context = MockContext::new().with_checkpoint("cp", yaml);

        match run_checkpoint(&context, "cp").unwrap_err() {
            GxError::SuiteNotFound { name, available } => {
                assert_eq!(name, "suite_one");
                assert_eq!(available, vec!["iceberg", "titanic.warning"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_batch_load_failure_stops_remaining_batches() {
        let yaml = r#"
validation_operator_name: action_list_operator
batches:
  - batch_kwargs: {path: /totally/not/a/file.csv, datasource: mydatasource}
    expectation_suite_names: [iceberg]
  - batch_kwargs: {path: /data/Titanic.csv, datasource: mydatasource}
    expectation_suite_names: [iceberg]
"#;
        let context = MockContext::new().with_checkpoint("bad_batch", yaml);

        let err = run_checkpoint(&context, "bad_batch").unwrap_err();
        match &err {
            GxError::BatchLoad {
                batch_kwargs,
                checkpoint_file,
                source,
            } => {
                assert!(batch_kwargs.contains("/totally/not/a/file.csv"));
                assert_eq!(checkpoint_file, "great_expectations/checkpoints/bad_batch.yml");
                assert!(matches!(**source, GxError::DataContext(_)));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(context.loads.borrow().is_empty());
    }

    #[test]
    fn test_unknown_operator() {
        let yaml = "validation_operator_name: foo\nbatches:\n  - batch_kwargs: {path: /data/Titanic.csv}\n    expectation_suite_names: [iceberg]\n";
        let context = MockContext::new().with_checkpoint("cp", yaml);

        let err = run_checkpoint(&context, "cp").unwrap_err();
        assert!(matches!(err, GxError::ValidationOperatorNotFound(ref n) if n == "foo"));
        assert!(context.operator_calls.borrow().is_empty());
    }

    #[test]
    fn test_no_batches_runs_operator_with_empty_list() {
        let yaml = "validation_operator_name: action_list_operator\nbatches: []\n";
        let context = MockContext::new().with_checkpoint("cp", yaml);

        let result = run_checkpoint(&context, "cp").unwrap();
        assert!(result.success);
        assert_eq!(
            *context.operator_calls.borrow(),
            vec![("action_list_operator".to_string(), 0)]
        );
    }
}
