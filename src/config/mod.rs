use crate::error::{GxError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 사용 통계를 끄는 환경 변수
pub const USAGE_STATS_ENV: &str = "GE_USAGE_STATS";

/// gxcheck 사용자 설정
///
/// ~/.gxcheck/config.toml에서 읽습니다. 이 도구는 설정 파일을 쓰지 않습니다.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// 로그 레벨 (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 익명 사용 통계 전송 여부
    #[serde(default = "default_usage_statistics")]
    pub usage_statistics: bool,

    /// `-d`가 없을 때 사용할 프로젝트 디렉토리
    #[serde(default)]
    pub default_directory: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_usage_statistics() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            usage_statistics: default_usage_statistics(),
            default_directory: None,
        }
    }
}

impl Config {
    /// 설정 디렉토리 경로
    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gxcheck")
    }

    /// 설정 파일 경로 가져오기
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// 설정 파일에서 로드 (없으면 기본값 사용)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GxError::Config(format!("Invalid {}: {}", Self::config_path().display(), e)))
    }

    /// 설정과 `GE_USAGE_STATS` 환경 변수를 함께 고려
    pub fn usage_statistics_enabled(&self) -> bool {
        let env_value = std::env::var(USAGE_STATS_ENV).ok();
        self.usage_statistics && !env_disables_usage(env_value.as_deref())
    }

    /// 프로젝트 디렉토리: 인자 > 설정 > 현재 디렉토리
    pub fn project_directory(&self, directory: Option<&str>) -> PathBuf {
        directory
            .or(self.default_directory.as_deref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn env_disables_usage(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("false") | Some("0") | Some("no") | Some("off")
    )
}
