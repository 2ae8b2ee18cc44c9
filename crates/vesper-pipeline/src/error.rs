use thiserror::Error;
use vesper_types::GuildId;

use crate::platform::PlatformError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An operation was attempted on a guild with no established
    /// connection. Returned to the caller instead of dereferencing absent
    /// state.
    #[error("guild {0} is not connected")]
    NotConnected(GuildId),

    /// The guild's playback consumer has shut down.
    #[error("playback queue closed for guild {0}")]
    PlaybackClosed(GuildId),

    /// An error surfaced by the voice platform.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The moderation engine could not be built.
    #[error("moderation error: {0}")]
    Moderation(#[from] vesper_moderation::ModerationError),
}
