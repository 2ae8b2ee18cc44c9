//! Event domain, payload, and record types for the voice event log.

use serde::{Deserialize, Serialize};
use vesper_types::GuildId;

/// Observability event domains.
///
/// Each domain groups related event types for filtering and auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventDomain {
    /// Per-speaker audio capture lifecycle.
    #[serde(rename = "CAPTURE")]
    Capture,
    /// Speech-to-text outcomes.
    #[serde(rename = "TRANSCRIPTION")]
    Transcription,
    /// Wake events and conversational windows.
    #[serde(rename = "SESSION")]
    Session,
    /// Content-safety scans and enforcement.
    #[serde(rename = "MODERATION")]
    Moderation,
    /// Guild playback queue activity.
    #[serde(rename = "PLAYBACK")]
    Playback,
}

impl EventDomain {
    /// Returns the canonical string label for this domain.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "CAPTURE",
            Self::Transcription => "TRANSCRIPTION",
            Self::Session => "SESSION",
            Self::Moderation => "MODERATION",
            Self::Playback => "PLAYBACK",
        }
    }
}

impl std::fmt::Display for EventDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventDomain {
    type Err = ParseEventDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CAPTURE" => Ok(Self::Capture),
            "TRANSCRIPTION" => Ok(Self::Transcription),
            "SESSION" => Ok(Self::Session),
            "MODERATION" => Ok(Self::Moderation),
            "PLAYBACK" => Ok(Self::Playback),
            _ => Err(ParseEventDomainError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown event domain string.
#[derive(Debug, Clone)]
pub struct ParseEventDomainError(pub String);

impl std::fmt::Display for ParseEventDomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown event domain: {}", self.0)
    }
}

impl std::error::Error for ParseEventDomainError {}

/// Structured event payloads for each event type.
///
/// Payloads are serialised to JSON and stored in the `payload_json` field of
/// the log record. Each variant corresponds to an `event_type` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ── Capture domain ───────────────────────────────────────────────
    /// A speaker started talking and a capture was opened.
    CaptureStarted {
        /// The speaker's user id as a string.
        speaker: String,
    },

    /// A finished capture was below the minimum audible duration.
    CaptureDiscarded {
        speaker: String,
        /// Length of the discarded mono buffer in milliseconds.
        duration_ms: u64,
    },

    /// A capture was decoded, downmixed, and handed to transcription.
    CaptureFinished {
        speaker: String,
        duration_ms: u64,
    },

    // ── Transcription domain ─────────────────────────────────────────
    /// A transcript was produced for a finished capture.
    TranscriptReady {
        speaker: String,
        /// Whitespace-normalized transcript text.
        text: String,
    },

    /// Every transcription backend failed or returned empty output.
    TranscriptionFailed {
        speaker: String,
    },

    // ── Session domain ───────────────────────────────────────────────
    /// An utterance was judged to be directed at the agent.
    WakeDetected {
        speaker: String,
        /// The alias that matched, if the wake was explicit.
        alias: Option<String>,
        confidence: f32,
    },

    /// A conversational window was opened or refreshed for a speaker.
    SessionOpened {
        speaker: String,
    },

    /// The agent asked a clarifying question for a pending slot.
    SlotPrompted {
        speaker: String,
        slot: String,
    },

    // ── Moderation domain ────────────────────────────────────────────
    /// A transcript violated the content-safety policy.
    ViolationDetected {
        user: String,
        reason: String,
        weight: u32,
        /// Soft violations log and notify only; they accrue no strike.
        soft: bool,
    },

    /// A hard violation was added to the strike ledger.
    StrikeRecorded {
        user: String,
        /// Decayed count after the new weight was applied.
        count: u32,
    },

    /// An enforcement action was carried out.
    EnforcementApplied {
        user: String,
        action: String,
    },

    /// An enforcement action could not be carried out.
    EnforcementDenied {
        user: String,
        action: String,
        reason: String,
    },

    // ── Playback domain ──────────────────────────────────────────────
    /// An item was appended to the guild's playback queue.
    PlaybackEnqueued {
        kind: String,
        /// Queue depth after the append, current item excluded.
        queue_len: usize,
    },

    /// The player began a queued item.
    PlaybackStarted {
        kind: String,
    },

    /// A new speaker interrupted playback; the queue was cleared.
    PlaybackInterrupted {
        by: String,
        dropped: usize,
    },
}

impl EventPayload {
    /// Returns the canonical event type string for this payload.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CaptureStarted { .. } => "CAPTURE_STARTED",
            Self::CaptureDiscarded { .. } => "CAPTURE_DISCARDED",
            Self::CaptureFinished { .. } => "CAPTURE_FINISHED",
            Self::TranscriptReady { .. } => "TRANSCRIPT_READY",
            Self::TranscriptionFailed { .. } => "TRANSCRIPTION_FAILED",
            Self::WakeDetected { .. } => "WAKE_DETECTED",
            Self::SessionOpened { .. } => "SESSION_OPENED",
            Self::SlotPrompted { .. } => "SLOT_PROMPTED",
            Self::ViolationDetected { .. } => "VIOLATION_DETECTED",
            Self::StrikeRecorded { .. } => "STRIKE_RECORDED",
            Self::EnforcementApplied { .. } => "ENFORCEMENT_APPLIED",
            Self::EnforcementDenied { .. } => "ENFORCEMENT_DENIED",
            Self::PlaybackEnqueued { .. } => "PLAYBACK_ENQUEUED",
            Self::PlaybackStarted { .. } => "PLAYBACK_STARTED",
            Self::PlaybackInterrupted { .. } => "PLAYBACK_INTERRUPTED",
        }
    }

    /// Returns the entity type for this payload.
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::CaptureStarted { .. }
            | Self::CaptureDiscarded { .. }
            | Self::CaptureFinished { .. } => "capture",
            Self::TranscriptReady { .. } | Self::TranscriptionFailed { .. } => "transcript",
            Self::WakeDetected { .. } | Self::SessionOpened { .. } | Self::SlotPrompted { .. } => {
                "session"
            }
            Self::ViolationDetected { .. }
            | Self::StrikeRecorded { .. }
            | Self::EnforcementApplied { .. }
            | Self::EnforcementDenied { .. } => "moderation",
            Self::PlaybackEnqueued { .. }
            | Self::PlaybackStarted { .. }
            | Self::PlaybackInterrupted { .. } => "playback",
        }
    }

    /// Returns the domain for this payload.
    pub fn domain(&self) -> EventDomain {
        match self {
            Self::CaptureStarted { .. }
            | Self::CaptureDiscarded { .. }
            | Self::CaptureFinished { .. } => EventDomain::Capture,
            Self::TranscriptReady { .. } | Self::TranscriptionFailed { .. } => {
                EventDomain::Transcription
            }
            Self::WakeDetected { .. } | Self::SessionOpened { .. } | Self::SlotPrompted { .. } => {
                EventDomain::Session
            }
            Self::ViolationDetected { .. }
            | Self::StrikeRecorded { .. }
            | Self::EnforcementApplied { .. }
            | Self::EnforcementDenied { .. } => EventDomain::Moderation,
            Self::PlaybackEnqueued { .. }
            | Self::PlaybackStarted { .. }
            | Self::PlaybackInterrupted { .. } => EventDomain::Playback,
        }
    }
}

/// A single record in the voice event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceEvent {
    /// The guild this event belongs to.
    pub guild: GuildId,
    /// The event domain (e.g., `CAPTURE`, `MODERATION`).
    pub domain: String,
    /// The specific event type (e.g., `CAPTURE_STARTED`).
    pub event_type: String,
    /// The type of entity involved (e.g., `capture`, `session`).
    pub entity_type: String,
    /// The identifier of the entity involved.
    pub entity_id: String,
    /// Monotonically increasing sequence number within the guild.
    pub seq: u64,
    /// The structured event payload as a JSON string.
    pub payload_json: String,
    /// ISO 8601 timestamp of when the event occurred.
    pub occurred_at: String,
}
