use thiserror::Error;

/// Error reported by an event client from inside a call-in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallInError {
    #[error("script error: {0}")]
    Script(String),

    #[error("call-in failed: {0}")]
    Failed(String),
}

/// Result type returned by every call-in.
pub type CallInResult<T = ()> = Result<T, CallInError>;

#[derive(Error, Debug)]
pub enum EventError {
    /// A client failed inside a draw call-in. The pass bracket has already
    /// been disabled when this is returned.
    #[error("{client}::{event} failed: {source}")]
    CallIn {
        client: String,
        event: &'static str,
        #[source]
        source: CallInError,
    },

    #[error("{event} pass state rejected the bracket: {cause:#}")]
    Pass {
        event: &'static str,
        cause: anyhow::Error,
    },
}
