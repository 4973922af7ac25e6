/// Unified error type for the leakscope harness.
///
/// All crates use this error type for propagation across crate boundaries.
/// Internal module errors should be converted into the appropriate variant.
#[derive(Debug, thiserror::Error)]
pub enum LeakscopeError {
    /// Error from the generation backend (API call failures, malformed responses).
    ///
    /// Timeouts are NOT surfaced through this variant: backends absorb them
    /// internally and return a sentinel answer string instead.
    #[error("generation backend error: {0}")]
    Backend(String),

    /// Error from the knowledge-base document store (corpus missing, corpus malformed).
    #[error("knowledge base error: {0}")]
    Kb(String),

    /// Error from the session store (persistence write failures).
    #[error("session store error: {0}")]
    Session(String),

    /// Error from configuration loading or validation.
    #[error("config error: {0}")]
    Config(String),

    /// Error from the episode log sink (append failures).
    #[error("log sink error: {0}")]
    Sink(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for LeakscopeError {
    fn from(err: serde_json::Error) -> Self {
        LeakscopeError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for LeakscopeError {
    fn from(err: serde_yaml::Error) -> Self {
        LeakscopeError::Serialization(err.to_string())
    }
}
