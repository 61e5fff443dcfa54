use crate::batch::BatchKwargs;
use crate::error::{GxError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// 체크포인트의 배치 하나: 가져올 방법 + 적용할 스위트들
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointBatch {
    pub batch_kwargs: BatchKwargs,
    #[serde(deserialize_with = "null_as_empty")]
    pub expectation_suite_names: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn no_contents(checkpoint_name: &str) -> GxError {
    GxError::Checkpoint(format!(
        "Checkpoint `{}` has no contents. Please fix this.",
        checkpoint_name
    ))
}

/// 체크포인트 정의 (`checkpoints/<name>.yml`)
///
/// 실행할 때마다 파일에서 새로 읽으며, 읽은 뒤에는 변경하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub validation_operator_name: String,
    pub batches: Vec<CheckpointBatch>,
}

impl CheckpointConfig {
    /// YAML에서 체크포인트 정의 파싱
    ///
    /// # Errors
    /// * 구조가 잘못되면 `GxError::Checkpoint` (빈 파일, 필수 키 누락, 타입 불일치)
    pub fn from_yaml(checkpoint_name: &str, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(no_contents(checkpoint_name));
        }

        let value: Value = serde_yaml::from_str(content).map_err(|e| {
            GxError::Checkpoint(format!(
                "Checkpoint `{}` is not valid YAML: {}",
                checkpoint_name, e
            ))
        })?;

        Self::validate(checkpoint_name, &value)?;

        serde_yaml::from_value(value).map_err(|e| {
            GxError::Checkpoint(format!("Checkpoint `{}` is invalid: {}", checkpoint_name, e))
        })
    }

    fn validate(checkpoint_name: &str, value: &Value) -> Result<()> {
        let mapping = match value {
            Value::Null => return Err(no_contents(checkpoint_name)),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(GxError::Checkpoint(format!(
                    "Checkpoint `{}` must be a mapping.",
                    checkpoint_name
                )))
            }
        };

        for required in ["validation_operator_name", "batches"] {
            if !mapping.contains_key(required) {
                return Err(GxError::Checkpoint(format!(
                    "Checkpoint `{}` is missing required key: `{}`.",
                    checkpoint_name, required
                )));
            }
        }

        let batches = match mapping.get("batches") {
            Some(Value::Sequence(batches)) => batches,
            _ => {
                return Err(GxError::Checkpoint(format!(
                    "In the checkpoint `{}`, the key `batches` must be a list",
                    checkpoint_name
                )))
            }
        };

        for batch in batches {
            for required in ["batch_kwargs", "expectation_suite_names"] {
                if batch.get(required).is_none() {
                    return Err(GxError::Checkpoint(format!(
                        "Items in `batches` must have a key `{}`",
                        required
                    )));
                }
            }
        }

        Ok(())
    }
}
