use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

/// 단일 expectation 설정 (평가는 이 crate의 범위 밖)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationConfiguration {
    pub expectation_type: String,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// 이름이 붙은 expectation 묶음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSuite {
    pub expectation_suite_name: String,
    #[serde(default)]
    pub expectations: Vec<ExpectationConfiguration>,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_asset_type: Option<String>,
}

impl ExpectationSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            expectation_suite_name: name.into(),
            expectations: Vec::new(),
            meta: Map::new(),
            data_asset_type: None,
        }
    }

    pub fn with_expectation(mut self, expectation_type: impl Into<String>) -> Self {
        self.expectations.push(ExpectationConfiguration {
            expectation_type: expectation_type.into(),
            kwargs: Map::new(),
            meta: Map::new(),
        });
        self
    }

    /// 점으로 구분된 스위트 이름을 저장 경로로 변환
    ///
    /// `warehouse.orders` -> `warehouse/orders.json`.
    /// 빈 이름이나 경로를 벗어나는 이름은 `None`.
    pub fn relative_path(name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        let mut path = PathBuf::new();
        for part in name.split('.') {
            let is_plain = Path::new(part)
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
            if part.is_empty() || !is_plain || part.contains('/') || part.contains('\\') {
                return None;
            }
            path.push(part);
        }
        path.set_extension("json");
        Some(path)
    }

    /// `relative_path`의 역변환
    pub fn name_from_relative_path(path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return None;
        }

        let stem = path.with_extension("");
        let parts: Vec<&str> = stem
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("."))
    }
}
