//! The voice platform boundary.
//!
//! Everything the pipeline needs from the hosting voice platform is behind
//! [`VoicePlatform`]: frame decoding, playback on a guild's live
//! connection, member lookups, and the enforcement actions moderation may
//! request. No vendor SDK types cross this boundary.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use vesper_moderation::EnforcementAction;
use vesper_types::{ChannelId, GuildId, UserId};

use crate::playback::PlaybackItem;

/// Errors surfaced by the platform adapter.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// A compressed frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The platform refused an operation for missing rights.
    #[error("permission denied: {0}")]
    Denied(String),

    /// Transport or connection failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// One event from a guild's per-speaker audio subscription.
///
/// The platform brackets each utterance with explicit start/end signals;
/// frames arrive only between them. End-of-speech is raised by the platform
/// after its trailing-silence window.
#[derive(Debug, Clone)]
pub enum SpeakerEvent {
    SpeakingStart { user: UserId },
    AudioFrame { user: UserId, payload: Vec<u8> },
    SpeakingEnd { user: UserId },
}

impl SpeakerEvent {
    pub fn user(&self) -> UserId {
        match self {
            Self::SpeakingStart { user }
            | Self::AudioFrame { user, .. }
            | Self::SpeakingEnd { user } => *user,
        }
    }
}

/// Adapter to the hosting voice platform.
///
/// Methods returning futures are declared `Send` so pipeline tasks can be
/// spawned onto the runtime. All enforcement methods must be side-effect
/// free when they fail: a denied kick leaves the member untouched.
pub trait VoicePlatform: Send + Sync + 'static {
    /// Decodes one compressed audio frame to interleaved stereo s16le
    /// samples at the platform rate.
    fn decode_frame(&self, payload: &[u8]) -> Result<Vec<i16>, PlatformError>;

    /// Plays an item on the guild's connection. Resolves when playback
    /// finishes or is stopped via [`VoicePlatform::stop`].
    fn play(
        &self,
        guild: GuildId,
        item: PlaybackItem,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Stops the currently playing item, if any. Idempotent.
    fn stop(&self, guild: GuildId);

    /// Resolves a member's display name for prompts and notices.
    fn display_name(&self, guild: GuildId, user: UserId)
        -> impl Future<Output = String> + Send;

    /// Whether the agent holds the rights needed for `action`.
    fn can_enforce(
        &self,
        guild: GuildId,
        action: EnforcementAction,
    ) -> impl Future<Output = bool> + Send;

    /// Temporarily mutes a member.
    fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        duration: Duration,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Removes a member from the guild.
    fn kick_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Bans a member from the guild.
    fn ban_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Posts a status message to a text channel.
    fn send_notice(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}
