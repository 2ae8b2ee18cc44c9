//! Shared types and constants for the Vesper voice pipeline.
//!
//! This crate provides the foundational types used across all Vesper crates:
//! platform identifiers, the wake profile, per-guild policy configuration,
//! lockdown levels, and raw audio buffer types.
//!
//! No crate in the workspace depends on anything *except* `vesper-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// Sample rate of the voice platform's PCM streams, in Hz.
pub const PLATFORM_SAMPLE_RATE: u32 = 48_000;

/// Channel count of the platform's decoded capture streams (interleaved).
pub const PLATFORM_CHANNELS: u32 = 2;

/// Identifier of a guild (one voice community) on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

/// Identifier of a user on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Identifier of a text or voice channel on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl std::fmt::Display for GuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key for per-speaker state: one speaker inside one guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeakerKey {
    pub guild: GuildId,
    pub user: UserId,
}

impl SpeakerKey {
    pub fn new(guild: GuildId, user: UserId) -> Self {
        Self { guild, user }
    }
}

impl std::fmt::Display for SpeakerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.guild, self.user)
    }
}

/// Severity of a moderator-issued lockdown on a user.
///
/// A lockdown temporarily tightens moderation sensitivity for that user; a
/// hard lockdown lowers the violation threshold further than a soft one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockdownLevel {
    Soft,
    Hard,
}

impl LockdownLevel {
    /// Returns the canonical string label for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Soft => "soft",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for LockdownLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mono PCM buffer at a known sample rate.
///
/// All capture hand-offs and synthesized replies move through this type;
/// samples are signed 16-bit, the platform's native raw format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration of the clip in milliseconds. Zero when the rate is unset.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Serializes the samples as little-endian bytes (s16le), the wire
    /// format expected by the speech backends.
    pub fn to_s16le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for s in &self.samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    /// Parses an s16le byte stream into a clip. A trailing odd byte is
    /// ignored rather than rejected; truncated streams are common at the
    /// end of a cut-off capture.
    pub fn from_s16le_bytes(bytes: &[u8], sample_rate: u32) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        Self {
            samples,
            sample_rate,
        }
    }
}

mod policy;
mod wake;

pub use policy::{GuildPolicy, StrikeThresholds};
pub use wake::{SensitivityTier, WakeProfile};
