//! Fuzzy wake detection for the Vesper agent.
//!
//! Decides whether an utterance is directed at the agent by comparing its
//! first meaningful token against the guild's alias list. Matching is
//! phonetic rather than literal: transcription services routinely confuse
//! labial stops, voiced fricatives, and semivowels ("vesper" arrives as
//! "besper", "fesper", or "wesper"), so candidate tokens and aliases are
//! folded into confusability classes before an edit-distance comparison.
//!
//! Detection is stateless and never fails: misses carry a reason code and
//! the decision about session continuation belongs to the caller.

mod detector;
mod normalize;

pub use detector::{detect, WakeMiss, WakeOutcome};
pub use normalize::{levenshtein, normalize_token};
