//! Observability layer for the Vesper voice pipeline.
//!
//! Every capture, transcription, session, moderation, and playback event is
//! recorded as a structured entry in a bounded in-memory log and mirrored to
//! a `tracing` line. An external log/metrics sink drains the log through
//! [`EventLog::query`]; nothing here is durable by design — durability is a
//! collaborator's concern.
//!
//! # Event domains
//!
//! | Domain | Example events |
//! |--------|---------------|
//! | `CAPTURE` | `CAPTURE_STARTED`, `CAPTURE_DISCARDED`, `CAPTURE_FINISHED` |
//! | `TRANSCRIPTION` | `TRANSCRIPT_READY`, `TRANSCRIPTION_FAILED` |
//! | `SESSION` | `WAKE_DETECTED`, `SESSION_OPENED`, `SLOT_PROMPTED` |
//! | `MODERATION` | `VIOLATION_DETECTED`, `STRIKE_RECORDED`, `ENFORCEMENT_APPLIED`, `ENFORCEMENT_DENIED` |
//! | `PLAYBACK` | `PLAYBACK_ENQUEUED`, `PLAYBACK_STARTED`, `PLAYBACK_INTERRUPTED` |

mod error;
mod event;
mod log;

pub use error::ObserveError;
pub use event::{EventDomain, EventPayload, ParseEventDomainError, VoiceEvent};
pub use log::{EventFilter, EventLog};

#[cfg(test)]
mod tests;
