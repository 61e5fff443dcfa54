use crate::batch::types::ExecutionEngine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 인메모리 프레임의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Pandas,
    Spark,
}

impl FrameKind {
    pub fn as_str(&self) -> &str {
        match self {
            FrameKind::Pandas => "pandas",
            FrameKind::Spark => "spark",
        }
    }

    /// 이 프레임을 소비할 수 있는 엔진
    pub fn engine(&self) -> ExecutionEngine {
        match self {
            FrameKind::Pandas => ExecutionEngine::Pandas,
            FrameKind::Spark => ExecutionEngine::Spark,
        }
    }
}

/// 메모리에 올라온 테이블 형태의 데이터
///
/// `dataset` 키의 값으로 batch kwargs에 들어가며, 파일에서 읽은 배치의
/// 데이터로도 사용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InMemoryDataset {
    pub kind: FrameKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl InMemoryDataset {
    pub fn new(kind: FrameKind, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { kind, columns, rows }
    }

    pub fn pandas(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self::new(FrameKind::Pandas, columns, rows)
    }

    pub fn spark(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self::new(FrameKind::Spark, columns, rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 열과 행만 담은 표현 (fingerprint 계산용, 프레임 종류는 따로 해싱)
    pub fn content_value(&self) -> Value {
        serde_json::json!({
            "columns": self.columns,
            "rows": self.rows,
        })
    }
}
