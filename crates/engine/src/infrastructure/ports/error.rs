//! Error types for port operations.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
}

impl LlmError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            // Don't retry on auth errors or bad requests
            Self::RequestFailed(msg) => {
                !msg.contains("401")
                    && !msg.contains("403")
                    && !msg.contains("400")
                    && !msg.contains("Invalid")
            }
            // Malformed bodies are usually a cut-off connection
            Self::InvalidResponse(_) => true,
            Self::Timeout(_) => true,
        }
    }
}
