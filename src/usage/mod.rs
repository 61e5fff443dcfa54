//! 사용 통계
//!
//! CLI 호출마다 프로젝트를 열 때 `data_context.__init__` 이벤트 하나,
//! 명령 자체에 대한 이벤트 하나를 남깁니다.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const DATA_CONTEXT_INIT: &str = "data_context.__init__";
pub const CHECKPOINT_LIST: &str = "cli.checkpoint.list";
pub const CHECKPOINT_RUN: &str = "cli.checkpoint.run";

/// 사용 통계 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub event: String,
    pub event_payload: Value,
    pub success: bool,
}

impl UsageEvent {
    pub fn new(event: impl Into<String>, success: bool) -> Self {
        Self {
            event: event.into(),
            event_payload: Value::Object(Default::default()),
            success,
        }
    }
}

/// 이벤트를 내보내는 곳
pub trait UsageSink: Send + Sync {
    fn emit(&self, event: &UsageEvent) -> Result<()>;
}

/// tracing 이벤트로만 기록
pub struct TracingSink;

impl UsageSink for TracingSink {
    fn emit(&self, event: &UsageEvent) -> Result<()> {
        tracing::debug!(
            target: "usage_statistics",
            event = %event.event,
            success = event.success,
            "usage event"
        );
        Ok(())
    }
}

/// JSON Lines 파일에 이벤트를 한 줄씩 추가
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UsageSink for JsonLinesSink {
    fn emit(&self, event: &UsageEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// 메모리에 이벤트를 모아두는 sink (테스트, 임베딩용)
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<UsageEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl UsageSink for RecordingSink {
    fn emit(&self, event: &UsageEvent) -> Result<()> {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
        Ok(())
    }
}

/// 활성화 여부를 확인하고 sink로 이벤트를 전달
///
/// 전송 실패는 명령 결과에 영향을 주지 않습니다.
pub struct UsageStatisticsHandler {
    enabled: bool,
    sink: Box<dyn UsageSink>,
}

impl UsageStatisticsHandler {
    pub fn new(enabled: bool, sink: Box<dyn UsageSink>) -> Self {
        Self { enabled, sink }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn emit(&self, event: UsageEvent) {
        if !self.enabled {
            return;
        }

        if let Err(e) = self.sink.emit(&event) {
            tracing::debug!(event = %event.event, error = %e, "failed to emit usage event");
        }
    }
}

impl std::fmt::Debug for UsageStatisticsHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageStatisticsHandler")
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = UsageEvent::new(CHECKPOINT_RUN, false);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "cli.checkpoint.run", "event_payload": {}, "success": false})
        );
    }

    #[test]
    fn test_disabled_handler_drops_events() {
        let sink = RecordingSink::new();
        let handler = UsageStatisticsHandler::new(false, Box::new(sink.clone()));
        handler.emit(UsageEvent::new(DATA_CONTEXT_INIT, true));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        let handler = UsageStatisticsHandler::new(true, Box::new(sink.clone()));
        handler.emit(UsageEvent::new(DATA_CONTEXT_INIT, true));
        handler.emit(UsageEvent::new(CHECKPOINT_LIST, true));

        let names: Vec<String> = sink.events().into_iter().map(|e| e.event).collect();
        assert_eq!(names, vec![DATA_CONTEXT_INIT, CHECKPOINT_LIST]);
    }

    #[test]
    fn test_json_lines_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uncommitted").join("usage.jsonl");
        let sink = JsonLinesSink::new(&path);

        sink.emit(&UsageEvent::new(DATA_CONTEXT_INIT, true)).unwrap();
        sink.emit(&UsageEvent::new(CHECKPOINT_RUN, false)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<UsageEvent> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], UsageEvent::new(CHECKPOINT_RUN, false));
    }
}
