use thiserror::Error;

/// Errors that can occur in the observability layer.
#[derive(Debug, Error)]
pub enum ObserveError {
    /// An event payload could not be serialised to JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
