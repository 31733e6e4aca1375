use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source unavailable: {source_name}: {message}")]
    SourceUnavailable { source_name: String, message: String },

    #[error("Source blocked: {source_name}: {message}")]
    SourceBlocked { source_name: String, message: String },

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Dispatch error: {notifier}: {message}")]
    Dispatch { notifier: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn unavailable(source_name: &str, message: impl Into<String>) -> Self {
        AppError::SourceUnavailable {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn blocked(source_name: &str, message: impl Into<String>) -> Self {
        AppError::SourceBlocked {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn dispatch(notifier: &str, message: impl Into<String>) -> Self {
        AppError::Dispatch {
            notifier: notifier.to_string(),
            message: message.into(),
        }
    }

    /// Blocked sources get a cooldown instead of being retried on the next pass.
    pub fn is_blocked(&self) -> bool {
        matches!(self, AppError::SourceBlocked { .. })
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
