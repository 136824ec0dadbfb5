use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GhtknError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("GitHub returned status {status}: {body}")]
    ProviderError { status: u16, body: String },

    #[error("Unexpected response from GitHub: {0}")]
    MalformedResponse(String),

    #[error("Authorization failed: {0}")]
    AuthorizationDenied(String),

    #[error("The device code expired before authorization completed")]
    AuthorizationExpired,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("Token cache error: {0}")]
    CacheError(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GhtknError {
    /// Error code string for structured output and logs.
    pub fn code(&self) -> &'static str {
        match self {
            GhtknError::InvalidArgument(_) => "invalid_argument",
            GhtknError::ProviderError { .. } => "provider_error",
            GhtknError::MalformedResponse(_) => "provider_error",
            GhtknError::AuthorizationDenied(_) => "authorization_denied",
            GhtknError::AuthorizationExpired => "authorization_expired",
            GhtknError::Cancelled => "cancelled",
            GhtknError::ConfigError { .. } => "config_error",
            GhtknError::CacheError(_) => "cache_error",
            GhtknError::Http(_) => "http_error",
            GhtknError::IoError(_) => "io_error",
        }
    }

    /// Config error that is not tied to a file on disk.
    pub(crate) fn config(detail: impl Into<String>) -> Self {
        GhtknError::ConfigError {
            path: PathBuf::from("<config>"),
            detail: detail.into(),
        }
    }

    /// Map a terminal device-flow error code returned by the provider.
    pub fn from_provider_code(code: &str) -> Self {
        match code {
            "expired_token" => GhtknError::AuthorizationExpired,
            other => GhtknError::AuthorizationDenied(other.to_string()),
        }
    }
}
