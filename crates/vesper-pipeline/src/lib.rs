//! The Vesper voice pipeline: capture, routing, and playback.
//!
//! This is the integration crate. It owns the per-guild state arena and the
//! flow of one speaker turn: platform audio event → capture state machine →
//! transcription gateway → moderation engine → intent router → (command |
//! conversational reply) → synthesis gateway → playback queue.
//!
//! The voice platform itself (connection handles, codecs, member
//! operations), the command surface, and the conversational brain are
//! external collaborators consumed behind the traits in [`platform`],
//! [`router::CommandSurface`], and [`router::Brain`].
//!
//! Concurrency model: one task per actively capturing speaker, one playback
//! consumer per guild, and no cross-guild shared state beyond the
//! process-wide moderation ledgers.

pub mod audio;
pub mod capture;
pub mod config;
mod error;
pub mod guild;
pub mod history;
pub mod intents;
pub mod platform;
pub mod playback;
pub mod router;

mod pipeline;

pub use error::PipelineError;
pub use pipeline::VoicePipeline;
pub use platform::{PlatformError, SpeakerEvent, VoicePlatform};
pub use playback::{PlaybackItem, PlaybackQueue};
pub use router::{Brain, CommandSurface, IntentRouter};
