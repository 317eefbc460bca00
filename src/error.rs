//! Error types for mcp-chat

use thiserror::Error;

/// Result type alias using mcp-chat's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mcp-chat
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language-model provider API error
    #[error("LLM provider error: {0}")]
    Provider(String),

    /// Error reported by an MCP server
    #[error("MCP error: {0}")]
    Mcp(String),

    /// Failure talking to an MCP server process or endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimit(_) | Error::Timeout(_) => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<json5::Error> for Error {
    fn from(err: json5::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::RateLimit("slow down".into()).is_retryable());
        assert!(Error::Timeout("60s".into()).is_retryable());
        assert!(!Error::Unauthorized("bad key".into()).is_retryable());
        assert!(!Error::Mcp("boom".into()).is_retryable());
    }

    #[test]
    fn test_display_carries_message() {
        let err = Error::Provider("API error (500): oops".into());
        assert_eq!(err.to_string(), "LLM provider error: API error (500): oops");
    }
}
