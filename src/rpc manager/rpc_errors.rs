use solana_client::client_error::ClientError;
use thiserror::Error;

/// Errors surfaced by a single RPC round-trip
///
/// None of these describe the fate of a transaction on-chain; they only say
/// that one request did not produce a usable answer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcManagerError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport {
        endpoint: String,
        message: String,
    },

    /// Timeout errors
    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout {
        endpoint: String,
        timeout_ms: u64,
    },

    /// RPC response errors (from the RPC server)
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimitExceeded {
        endpoint: String,
    },

    #[error("Blockhash not found (endpoint: {endpoint})")]
    BlockhashNotFound {
        endpoint: String,
    },

    /// The node answered but the payload could not be decoded
    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse {
        endpoint: String,
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RpcManagerError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcManagerError::Transport { .. } => true,
            RpcManagerError::Timeout { .. } => true,
            RpcManagerError::RateLimitExceeded { .. } => true,
            RpcManagerError::BlockhashNotFound { .. } => true,

            RpcManagerError::MalformedResponse { .. } => false,
            RpcManagerError::Configuration(_) => false,

            // Retry on server errors (5xx) and JSON-RPC node-side failures
            RpcManagerError::RpcResponse { code, .. } => match code {
                Some(c) => (*c >= 500 && *c < 600) || (-32099..=-32000).contains(c),
                None => false,
            },
        }
    }

    /// Get the endpoint associated with this error, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            RpcManagerError::Transport { endpoint, .. } => Some(endpoint),
            RpcManagerError::Timeout { endpoint, .. } => Some(endpoint),
            RpcManagerError::RpcResponse { endpoint, .. } => Some(endpoint),
            RpcManagerError::RateLimitExceeded { endpoint } => Some(endpoint),
            RpcManagerError::BlockhashNotFound { endpoint } => Some(endpoint),
            RpcManagerError::MalformedResponse { endpoint, .. } => Some(endpoint),
            RpcManagerError::Configuration(_) => None,
        }
    }

    /// Short label used as a metrics / log field
    pub fn kind(&self) -> &'static str {
        match self {
            RpcManagerError::Transport { .. } => "transport",
            RpcManagerError::Timeout { .. } => "timeout",
            RpcManagerError::RpcResponse { .. } => "rpc_response",
            RpcManagerError::RateLimitExceeded { .. } => "rate_limited",
            RpcManagerError::BlockhashNotFound { .. } => "blockhash_not_found",
            RpcManagerError::MalformedResponse { .. } => "malformed_response",
            RpcManagerError::Configuration(_) => "configuration",
        }
    }

    /// Create from ClientError with context
    pub fn from_client_error(err: ClientError, endpoint: &str, timeout_ms: u64) -> Self {
        Self::classify(&err.to_string(), endpoint, timeout_ms)
    }

    /// Classify a client error message
    fn classify(message: &str, endpoint: &str, timeout_ms: u64) -> Self {
        let lowered = message.to_lowercase();

        if lowered.contains("blockhash not found") {
            RpcManagerError::BlockhashNotFound {
                endpoint: endpoint.to_string(),
            }
        } else if lowered.contains("rate limit")
            || lowered.contains("too many requests")
            || lowered.contains("429")
        {
            RpcManagerError::RateLimitExceeded {
                endpoint: endpoint.to_string(),
            }
        } else if lowered.contains("timeout") || lowered.contains("timed out") {
            RpcManagerError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms,
            }
        } else if lowered.contains("error sending request")
            || lowered.contains("connection")
            || lowered.contains("io error")
        {
            RpcManagerError::Transport {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
            }
        } else {
            // Extract error code if available
            let code = lowered
                .split("code:")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.trim_end_matches(|c: char| !c.is_ascii_digit()).parse::<i64>().ok());

            RpcManagerError::RpcResponse {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
                code,
            }
        }
    }
}
