use thiserror::Error;

/// Global error type for platform API calls.
///
/// Every gateway operation resolves to one of these. The split matters for
/// callers: `Unauthorized` forces a session clear, `Rejected` carries the
/// server's message verbatim for the user, and `Network`/`Decode` are shown
/// as a generic retryable failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The token or credentials were not accepted (HTTP 401).
    #[error("authentication required")]
    Unauthorized,

    /// The server refused the operation on business grounds
    /// (insufficient shares, insufficient funds, duplicate email, ...).
    #[error("{0}")]
    Rejected(String),

    /// The request never completed (connect, DNS, timeout).
    #[error("network failure: {0}")]
    Network(String),

    /// The response arrived but could not be decoded.
    #[error("malformed server response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// True for failures where a retry of the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// A specialized Result type for gateway operations.
pub type Result<T> = std::result::Result<T, ApiError>;
