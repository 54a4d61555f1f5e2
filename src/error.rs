use thiserror::Error;

/// Error types that can occur when synchronizing store resources.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Non-2xx HTTP response with the status preserved for classification
    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },
    /// Transport-level failures (connect, DNS, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),
    /// Authentication and authorization errors (401/403)
    #[error("Auth error: {0}")]
    Auth(String),
    /// Business-rule validation failures reported by the platform
    #[error("Validation error: {0}")]
    Validation(String),
    /// Referenced resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    Json(String),
    /// Sidecar metadata serialization errors
    #[error("YAML error: {0}")]
    Yaml(String),
    /// Local filesystem errors
    #[error("IO error: {0}")]
    Io(String),
    /// Invalid invocation or missing credentials
    #[error("Config error: {0}")]
    Config(String),
    /// Generic error
    #[error("Generic error: {0}")]
    Generic(String),
}

impl SyncError {
    /// HTTP status hint, when one is known for this error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Http { status, .. } => Some(*status),
            SyncError::Auth(_) => Some(401),
            SyncError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Converts reqwest transport errors into SyncErrors
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return SyncError::Network(err.to_string());
        }
        match err.status() {
            Some(status) => SyncError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => SyncError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Json(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<serde_yaml::Error> for SyncError {
    fn from(err: serde_yaml::Error) -> Self {
        SyncError::Yaml(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}
