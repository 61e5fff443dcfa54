use crate::batch::{EngineRegistry, ExecutionEngine};
use crate::error::{GxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_OPERATOR_NAME: &str = "action_list_operator";
pub const ACTION_LIST_OPERATOR_CLASS: &str = "ActionListValidationOperator";
pub const STORE_VALIDATION_RESULT_CLASS: &str = "StoreValidationResultAction";

/// datasource 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceConfig {
    /// PandasDatasource, SparkDFDatasource, SqlAlchemyDatasource
    pub class_name: String,

    /// 상대 `path`를 해석할 기준 디렉토리 (프로젝트 루트 기준)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<String>,
}

impl DatasourceConfig {
    pub fn engine(&self) -> Result<ExecutionEngine> {
        match self.class_name.as_str() {
            "PandasDatasource" => Ok(ExecutionEngine::Pandas),
            "SparkDFDatasource" => Ok(ExecutionEngine::Spark),
            "SqlAlchemyDatasource" => Ok(ExecutionEngine::SqlAlchemy),
            other => Err(GxError::Config(format!(
                "Unknown datasource class_name `{}`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionClassConfig {
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    pub action: ActionClassConfig,
}

/// validation operator 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub class_name: String,
    #[serde(default)]
    pub action_list: Vec<ActionConfig>,
}

impl OperatorConfig {
    /// 결과를 저장하는 기본 action list operator
    pub fn default_action_list() -> Self {
        Self {
            class_name: ACTION_LIST_OPERATOR_CLASS.to_string(),
            action_list: vec![ActionConfig {
                name: "store_validation_result".to_string(),
                action: ActionClassConfig {
                    class_name: STORE_VALIDATION_RESULT_CLASS.to_string(),
                },
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStatisticsConfig {
    #[serde(default = "default_usage_enabled")]
    pub enabled: bool,

    /// 이벤트를 JSON Lines로 기록할 파일 (프로젝트 루트 기준)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_file: Option<String>,
}

fn default_usage_enabled() -> bool {
    true
}

impl Default for UsageStatisticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_usage_enabled(),
            events_file: None,
        }
    }
}

fn default_validation_operators() -> BTreeMap<String, OperatorConfig> {
    let mut operators = BTreeMap::new();
    operators.insert(
        DEFAULT_OPERATOR_NAME.to_string(),
        OperatorConfig::default_action_list(),
    );
    operators
}

/// 프로젝트 설정 (`great_expectations.yml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub datasources: BTreeMap<String, DatasourceConfig>,

    /// 이 환경에서 사용할 수 있는 엔진. 없으면 전부
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_engines: Option<Vec<ExecutionEngine>>,

    #[serde(default = "default_validation_operators")]
    pub validation_operators: BTreeMap<String, OperatorConfig>,

    #[serde(default)]
    pub anonymous_usage_statistics: UsageStatisticsConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            datasources: BTreeMap::new(),
            execution_engines: None,
            validation_operators: default_validation_operators(),
            anonymous_usage_statistics: UsageStatisticsConfig::default(),
        }
    }
}

impl ProjectConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        // 빈 파일은 기본값
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content)
            .map_err(|e| GxError::Config(format!("Unable to parse great_expectations.yml: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn engine_registry(&self) -> EngineRegistry {
        match &self.execution_engines {
            Some(engines) => EngineRegistry::only(engines.iter().copied()),
            None => EngineRegistry::all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::EngineAvailability;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ProjectConfig::from_yaml("").unwrap();
        assert!(config.datasources.is_empty());
        assert!(config.validation_operators.contains_key(DEFAULT_OPERATOR_NAME));
        assert!(config.anonymous_usage_statistics.enabled);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
datasources:
  mydatasource:
    class_name: PandasDatasource
    base_directory: ../data
  warehouse:
    class_name: SqlAlchemyDatasource
execution_engines: [pandas, sqlalchemy]
validation_operators:
  action_list_operator:
    class_name: ActionListValidationOperator
    action_list:
      - name: store_validation_result
        action:
          class_name: StoreValidationResultAction
anonymous_usage_statistics:
  enabled: false
  events_file: uncommitted/usage.jsonl
"#;
        let config = ProjectConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.datasources.len(), 2);
        assert_eq!(
            config.datasources["mydatasource"].engine().unwrap(),
            ExecutionEngine::Pandas
        );
        assert_eq!(
            config.datasources["mydatasource"].base_directory.as_deref(),
            Some("../data")
        );
        assert_eq!(
            config.datasources["warehouse"].engine().unwrap(),
            ExecutionEngine::SqlAlchemy
        );
        assert_eq!(
            config.validation_operators["action_list_operator"],
            OperatorConfig::default_action_list()
        );
        assert!(!config.anonymous_usage_statistics.enabled);

        let engines = config.engine_registry();
        assert!(engines.is_available(ExecutionEngine::Pandas));
        assert!(!engines.is_available(ExecutionEngine::Spark));
    }

    #[test]
    fn test_unknown_datasource_class() {
        let ds = DatasourceConfig {
            class_name: "MongoDatasource".to_string(),
            base_directory: None,
        };
        assert!(matches!(ds.engine(), Err(GxError::Config(_))));
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = ProjectConfig::from_yaml("datasources: [").unwrap_err();
        assert!(matches!(err, GxError::Config(_)));
    }
}
