use thiserror::Error;

/// Comprehensive RPC Manager error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcManagerError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    /// Timeout errors
    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// RPC response errors (from the RPC server)
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    /// Account cannot pay `gas_limit × gas_price`
    #[error("Insufficient funds: {message} (endpoint: {endpoint})")]
    InsufficientFunds { endpoint: String, message: String },

    /// Node already saw a transaction with this nonce mined
    #[error("Nonce too low: {message} (endpoint: {endpoint})")]
    NonceTooLow { endpoint: String, message: String },

    /// Same nonce already pending with a higher or equal gas price
    #[error("Replacement transaction underpriced: {message} (endpoint: {endpoint})")]
    ReplacementUnderpriced { endpoint: String, message: String },

    /// Node already has this exact transaction in its pool
    #[error("Transaction already known (endpoint: {endpoint})")]
    AlreadyKnown { endpoint: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimitExceeded { endpoint: String },
}

impl RpcManagerError {
    /// The node answered and refused the transaction, so it is definitely not
    /// in any mempool
    pub fn rejected_by_node(&self) -> bool {
        matches!(
            self,
            RpcManagerError::InsufficientFunds { .. }
                | RpcManagerError::NonceTooLow { .. }
                | RpcManagerError::ReplacementUnderpriced { .. }
                | RpcManagerError::RpcResponse { .. }
        )
    }

    /// Classify a JSON-RPC error response by its message
    pub fn from_error_response(endpoint: &str, message: &str, code: Option<i64>) -> Self {
        let lower = message.to_lowercase();
        let endpoint = endpoint.to_string();
        let message = message.to_string();

        if lower.contains("insufficient funds") {
            RpcManagerError::InsufficientFunds { endpoint, message }
        } else if lower.contains("nonce too low") {
            RpcManagerError::NonceTooLow { endpoint, message }
        } else if lower.contains("replacement transaction underpriced") {
            RpcManagerError::ReplacementUnderpriced { endpoint, message }
        } else if lower.contains("already known") || lower.contains("known transaction") {
            RpcManagerError::AlreadyKnown { endpoint }
        } else if lower.contains("rate limit")
            || lower.contains("too many requests")
            || code == Some(429)
        {
            RpcManagerError::RateLimitExceeded { endpoint }
        } else {
            RpcManagerError::RpcResponse {
                endpoint,
                message,
                code,
            }
        }
    }

    /// Classify a transport failure (no JSON-RPC error payload)
    pub fn from_transport_message(endpoint: &str, message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") {
            RpcManagerError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: 0,
            }
        } else if lower.contains("429") || lower.contains("too many requests") {
            RpcManagerError::RateLimitExceeded {
                endpoint: endpoint.to_string(),
            }
        } else {
            RpcManagerError::Transport {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
            }
        }
    }
}

/// Result type for chain RPC operations
pub type RpcResult<T> = Result<T, RpcManagerError>;
