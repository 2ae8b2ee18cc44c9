//! The wake decision.

use serde::{Deserialize, Serialize};
use vesper_types::WakeProfile;

use crate::normalize::{levenshtein, normalize_token};

/// Leading particles that often precede an alias ("hey vesper, ...").
/// At most one is skipped, and its presence raises confidence slightly.
const GREETING_PARTICLES: &[&str] = &["hey", "okay", "ok", "yo"];

/// Confidence bonus applied when a greeting particle preceded the alias.
const GREETING_BONUS: f32 = 0.1;

/// Confidence reported for a session-continuation wake, where no alias was
/// matched at all.
const CONTINUATION_CONFIDENCE: f32 = 0.5;

/// Why an utterance was not judged to be a wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeMiss {
    /// The transcript was empty or contained no usable tokens.
    EmptyInput,
    /// No alias came within the profile's edit-distance tolerance.
    NoAliasMatched,
}

/// Result of a wake decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeOutcome {
    pub wake: bool,
    /// 0.0..=1.0; inversely related to edit distance.
    pub confidence: f32,
    /// The alias that matched, absent for continuations and misses.
    pub alias: Option<String>,
    /// The utterance with greeting particle and alias removed.
    pub remainder: Option<String>,
    /// Populated only when `wake` is false.
    pub reason: Option<WakeMiss>,
}

impl WakeOutcome {
    fn miss(reason: WakeMiss) -> Self {
        Self {
            wake: false,
            confidence: 0.0,
            alias: None,
            remainder: None,
            reason: Some(reason),
        }
    }

    /// A wake granted because the speaker already holds an active session;
    /// no alias was required or matched. Produced by the router, never by
    /// [`detect`] — cold utterances always need an alias.
    pub fn continuation(remainder: &str) -> Self {
        Self {
            wake: true,
            confidence: CONTINUATION_CONFIDENCE,
            alias: None,
            remainder: non_empty(remainder.trim()),
            reason: None,
        }
    }
}

/// Decides whether `transcript` engages the agent under `profile`.
///
/// The first token (after an optional greeting particle) is normalized and
/// compared against every normalized alias; the minimum edit distance wins
/// and must be within the profile's tolerance. Never fails: empty input and
/// non-matching input return `wake: false` with a reason code.
pub fn detect(transcript: &str, profile: &WakeProfile) -> WakeOutcome {
    let tokens: Vec<&str> = transcript.split_whitespace().collect();
    if tokens.is_empty() {
        return WakeOutcome::miss(WakeMiss::EmptyInput);
    }

    let mut idx = 0;
    let greeted = GREETING_PARTICLES.contains(&normalize_token(tokens[0]).as_str())
        && tokens.len() > 1;
    if greeted {
        idx = 1;
    }

    let candidate = normalize_token(tokens[idx]);
    if candidate.is_empty() {
        return WakeOutcome::miss(WakeMiss::EmptyInput);
    }

    let tolerance = profile.tolerance();
    let best = profile
        .aliases
        .iter()
        .map(|alias| (alias, levenshtein(&candidate, &normalize_token(alias))))
        .min_by_key(|(_, dist)| *dist);

    match best {
        Some((alias, dist)) if dist <= tolerance => {
            let mut confidence =
                (tolerance + 1 - dist) as f32 / (tolerance + 1) as f32;
            if greeted {
                confidence = (confidence + GREETING_BONUS).min(1.0);
            }
            let remainder = tokens[idx + 1..].join(" ");
            tracing::debug!(
                alias = alias.as_str(),
                distance = dist,
                confidence,
                "wake detected"
            );
            WakeOutcome {
                wake: true,
                confidence,
                alias: Some(alias.clone()),
                remainder: non_empty(&remainder),
                reason: None,
            }
        }
        _ => WakeOutcome::miss(WakeMiss::NoAliasMatched),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
