use thiserror::Error;

/// Errors that can occur while building or running the moderation engine.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// A term pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// An event record could not be written.
    #[error("observe error: {0}")]
    Observe(#[from] vesper_observe::ObserveError),
}
