use aws_smithy_types::error::display::DisplayErrorContext;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Resource '{name}' is not attached to this request context")]
    MissingResource { name: String },

    #[error("Resource '{name}' is attached but is not a {expected}")]
    ResourceTypeMismatch { name: String, expected: &'static str },

    #[error("{service} {operation} failed: {message}")]
    Backend {
        service: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("Handler failed: {message}")]
    Handler { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AdapterError {
    /// 下游 handler 自行回報的錯誤
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// 把 SDK 錯誤包成 Backend 錯誤，保留完整的錯誤鏈
    pub fn backend<E>(service: &'static str, operation: &'static str, err: E) -> Self
    where
        E: std::error::Error,
    {
        Self::Backend {
            service,
            operation,
            message: DisplayErrorContext(&err).to_string(),
        }
    }

    pub fn is_missing_resource(&self) -> bool {
        matches!(self, Self::MissingResource { .. })
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
