use crate::context::project::{
    OperatorConfig, ACTION_LIST_OPERATOR_CLASS, STORE_VALIDATION_RESULT_CLASS,
};
use crate::error::{GxError, Result};
use crate::operator::{
    ActionListOperator, StoreValidationResultAction, UnevaluatedSuiteEvaluator,
    ValidationAction, ValidationOperator,
};
use std::collections::BTreeMap;
use std::path::Path;

/// 이름으로 validation operator를 찾는 레지스트리
#[derive(Default)]
pub struct OperatorRegistry {
    operators: BTreeMap<String, Box<dyn ValidationOperator>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로젝트 설정에서 operator 생성
    ///
    /// # Arguments
    /// * `configs` - `validation_operators` 섹션
    /// * `validations_dir` - `StoreValidationResultAction`이 쓰는 디렉토리
    ///
    /// # Errors
    /// * 지원하지 않는 operator/action class_name이면 `GxError::Config`
    pub fn from_config(
        configs: &BTreeMap<String, OperatorConfig>,
        validations_dir: &Path,
    ) -> Result<Self> {
        let mut registry = Self::new();

        for (name, config) in configs {
            if config.class_name != ACTION_LIST_OPERATOR_CLASS {
                return Err(GxError::Config(format!(
                    "Validation operator `{}` has unsupported class_name `{}`",
                    name, config.class_name
                )));
            }

            let mut operator = ActionListOperator::new(name, Box::new(UnevaluatedSuiteEvaluator));
            for action in &config.action_list {
                let built = build_action(
                    name,
                    &action.name,
                    &action.action.class_name,
                    validations_dir,
                )?;
                operator = operator.with_action(built);
            }

            registry.register(Box::new(operator));
        }

        Ok(registry)
    }

    /// operator 등록 (같은 이름이면 교체)
    pub fn register(&mut self, operator: Box<dyn ValidationOperator>) {
        self.operators.insert(operator.name().to_string(), operator);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ValidationOperator> {
        self.operators.get(name).map(|op| op.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.operators.keys().map(|k| k.as_str()).collect()
    }
}

fn build_action(
    operator_name: &str,
    action_name: &str,
    class_name: &str,
    validations_dir: &Path,
) -> Result<Box<dyn ValidationAction>> {
    match class_name {
        STORE_VALIDATION_RESULT_CLASS => Ok(Box::new(StoreValidationResultAction::new(
            action_name,
            validations_dir,
        ))),
        other => Err(GxError::Config(format!(
            "Action `{}` of validation operator `{}` has unsupported class_name `{}`",
            action_name, operator_name, other
        ))),
    }
}
