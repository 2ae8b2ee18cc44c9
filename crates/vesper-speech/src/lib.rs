//! Speech gateways for the Vesper pipeline.
//!
//! Adapters around external transcription and synthesis services. Both
//! gateways absorb provider failure: transcription falls through a
//! primary/fallback chain and synthesis retries with exponential backoff,
//! and when everything fails the caller gets `None` — a silently dropped
//! turn, never a crashed pipeline.

pub mod config;
mod error;
mod stt;
mod tts;

pub use config::{SpeechConfig, SttConfig, TtsConfig};
pub use error::SpeechError;
pub use stt::{HttpStt, ProcessStt, SttBackend, TranscriptionGateway};
pub use tts::{decode_wav, HttpTts, ProcessTts, SynthesisGateway, TtsBackend};
