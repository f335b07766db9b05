use std::fmt;

#[derive(Debug)]
pub enum FaqError {
    ApiError {
        status: u16,
        message: String,
    },
    ConfigError(String),
    ToolError(String),
    IndexError(String),
    NetworkError(reqwest::Error),
    Timeout,
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    YamlError(serde_yaml::Error),
    /// A value handed to the log writer could not be turned into JSON.
    Unserializable {
        type_name: &'static str,
        source: serde_json::Error,
    },
    InvalidTimestamp(String),
    Other(String),
}

impl fmt::Display for FaqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaqError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            FaqError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            FaqError::ToolError(msg) => write!(f, "Tool error: {}", msg),
            FaqError::IndexError(msg) => write!(f, "Index error: {}", msg),
            FaqError::NetworkError(e) => write!(f, "Network error: {}", e),
            FaqError::Timeout => write!(f, "Request timeout"),
            FaqError::IoError(e) => write!(f, "IO error: {}", e),
            FaqError::JsonError(e) => write!(f, "JSON error: {}", e),
            FaqError::YamlError(e) => write!(f, "YAML error: {}", e),
            FaqError::Unserializable { type_name, source } => {
                write!(f, "Type {} not serializable: {}", type_name, source)
            }
            FaqError::InvalidTimestamp(raw) => write!(f, "Invalid timestamp: {}", raw),
            FaqError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FaqError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FaqError::NetworkError(e) => Some(e),
            FaqError::IoError(e) => Some(e),
            FaqError::JsonError(e) => Some(e),
            FaqError::YamlError(e) => Some(e),
            FaqError::Unserializable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FaqError {
    fn from(err: reqwest::Error) -> Self {
        FaqError::NetworkError(err)
    }
}

impl From<std::io::Error> for FaqError {
    fn from(err: std::io::Error) -> Self {
        FaqError::IoError(err)
    }
}

impl From<serde_json::Error> for FaqError {
    fn from(err: serde_json::Error) -> Self {
        FaqError::JsonError(err)
    }
}

impl From<serde_yaml::Error> for FaqError {
    fn from(err: serde_yaml::Error) -> Self {
        FaqError::YamlError(err)
    }
}

impl From<anyhow::Error> for FaqError {
    fn from(err: anyhow::Error) -> Self {
        FaqError::Other(err.to_string())
    }
}

impl From<String> for FaqError {
    fn from(msg: String) -> Self {
        FaqError::Other(msg)
    }
}

impl From<&str> for FaqError {
    fn from(msg: &str) -> Self {
        FaqError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FaqError>;
