//! Content-safety engine for the Vesper voice pipeline.
//!
//! Everything the agent hears passes through this crate after transcription.
//! Two independent detection paths produce a verdict: harassment term
//! matching over unicode-hardened text, and a weighted intent score for
//! threats and self-harm. Hard violations feed a time-decaying strike
//! ledger whose thresholds drive escalating enforcement (timeout, removal,
//! ban); soft violations only log and notify.
//!
//! The engine decides; it does not act. Enforcement actions are planned
//! here and executed by the pipeline, which owns the platform handle and
//! its permission checks.

mod engine;
mod error;
mod ledger;
mod normalize;
mod scanner;
mod terms;

pub use engine::{ModerationEngine, ModerationOutcome};
pub use error::ModerationError;
pub use ledger::{
    plan_escalation, EnforcementAction, LockdownEntry, LockdownRegistry, StrikeLedger,
};
pub use normalize::normalize_text;
pub use scanner::{ScanContext, ScanVerdict, Scanner, ViolationReason};
