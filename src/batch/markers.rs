use crate::batch::kwargs::{BatchKwargs, KwargValue};
use crate::error::{GxError, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// `ge_load_time` 값의 형식
pub const LOAD_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// 배치를 실제로 가져온 결과(출력) 쪽 메타데이터
///
/// batch kwargs가 "무엇을 가져올지"라면 markers는 "언제 어떻게 가져왔는지"입니다.
/// 두 fingerprint를 비교하면 배치 정의가 바뀐 것인지 내용이 바뀐 것인지 구분할 수 있습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMarkers {
    markers: BatchKwargs,
}

impl BatchMarkers {
    /// # Errors
    /// * `ge_load_time`이 없으면 `GxError::InvalidBatchId`
    pub fn new(markers: BatchKwargs) -> Result<Self> {
        if !markers.contains_key("ge_load_time") {
            return Err(GxError::InvalidBatchId(
                "BatchMarkers requires a ge_load_time".to_string(),
            ));
        }
        Ok(Self { markers })
    }

    /// 주어진 시각으로 찍은 markers
    pub fn at(load_time: DateTime<Utc>) -> Self {
        let markers = BatchKwargs::new().with(
            "ge_load_time",
            load_time.format(LOAD_TIME_FORMAT).to_string(),
        );
        Self { markers }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// 추가 provenance 정보 (예: 실행한 쿼리)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<KwargValue>) -> Self {
        let key = key.into();
        if key != "ge_load_time" {
            self.markers.insert(key, value);
        }
        self
    }

    pub fn ge_load_time(&self) -> Option<&Value> {
        self.markers.get_value("ge_load_time")
    }

    pub fn as_kwargs(&self) -> &BatchKwargs {
        &self.markers
    }

    /// batch fingerprint
    pub fn to_id(&self) -> String {
        self.markers.to_id()
    }
}
