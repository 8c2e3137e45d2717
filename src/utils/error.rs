use thiserror::Error;

/// Failure reported by the remote data service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Transient service failure: {message}")]
    Retryable { message: String },

    #[error("Service request failed: {message}")]
    Fatal { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Could not decode service response: {message}")]
    Decode { message: String },
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Retryable { .. })
    }
}

#[derive(Error, Debug)]
pub enum GuildError {
    #[error("Guild {guild_id} not found")]
    GuildNotFound { guild_id: u64 },

    #[error("Failed to fetch guild {guild_id}: {source}")]
    GuildFetch {
        guild_id: u64,
        #[source]
        source: ServiceError,
    },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Run interrupted before completion")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 使用者參數或遠端公會資料問題
    Medium,
    /// 設定或輸出寫入問題
    High,
    /// 被中斷
    Critical,
}

impl GuildError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GuildError::GuildNotFound { .. } | GuildError::GuildFetch { .. } => {
                ErrorSeverity::Medium
            }
            GuildError::Interrupted => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 3,
            ErrorSeverity::Critical => 130,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GuildError::GuildNotFound { guild_id } => {
                format!("找不到公會 {}", guild_id)
            }
            GuildError::GuildFetch { guild_id, .. } => {
                format!("無法取得公會 {} 的成員清單", guild_id)
            }
            GuildError::Interrupted => "執行已中斷，未寫入任何輸出".to_string(),
            GuildError::IoError(e) => format!("檔案操作失敗: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            GuildError::GuildNotFound { .. } => "Check the guild ID on the service website",
            GuildError::GuildFetch { .. } | GuildError::HttpError(_) => {
                "Check network connectivity and the service base URL, then retry"
            }
            GuildError::IoError(_) => "Check that the output and cache paths are writable",
            GuildError::SerializationError(_) => "Report this as a bug",
            GuildError::ConfigValidationError { .. } | GuildError::InvalidConfigValueError { .. } => {
                "Fix the settings file or CLI arguments"
            }
            GuildError::Interrupted => "Run the command again",
        }
    }
}

pub type Result<T> = std::result::Result<T, GuildError>;
