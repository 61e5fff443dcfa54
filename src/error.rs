use thiserror::Error;

#[derive(Error, Debug)]
pub enum GxError {
    // 데이터 식별 에러: 생성 시점에 바로 발생
    #[error("{0}")]
    InvalidBatchKwargs(String),

    #[error("{0}")]
    InvalidBatchId(String),

    // 설정 에러: 사용자가 고칠 수 있음
    #[error("Could not find checkpoint `{0}`.")]
    CheckpointNotFound(String),

    #[error("{0}")]
    Checkpoint(String),

    #[error("A batch has no suites associated with it. At least one suite is required.")]
    EmptySuiteList {
        batch_kwargs: String,
        checkpoint_file: String,
    },

    #[error("No validation operator `{0}` was found in your project. Please verify this in your great_expectations.yml")]
    ValidationOperatorNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // 데이터 접근 에러
    #[error("Could not find a suite named `{name}`.")]
    SuiteNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("There was a problem loading a batch with these batch_kwargs: {batch_kwargs}")]
    BatchLoad {
        batch_kwargs: String,
        checkpoint_file: String,
        #[source]
        source: Box<GxError>,
    },

    #[error("{0}")]
    DataContext(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GxError {
    /// 사용자 입력(설정 파일, 체크포인트)을 고치면 해결되는 에러인지
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::CheckpointNotFound(_)
                | Self::Checkpoint(_)
                | Self::EmptySuiteList { .. }
                | Self::ValidationOperatorNotFound(_)
                | Self::Config(_)
                | Self::SuiteNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GxError>;
