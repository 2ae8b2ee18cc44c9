//! The violation scanner.
//!
//! Two independent detection paths over normalized text:
//!
//! 1. Harassment classification: literal terms and targeted second-person
//!    patterns, behind a benign-phrase allow-list.
//! 2. Intent scoring for threats and self-harm: a weighted sum of signals
//!    offset by recreational context, compared against a threshold that
//!    tightens when the user is under lockdown.
//!
//! Two special rules run regardless of the score: a sparse-token check for
//! self-harm-encouragement abbreviations, and a proximity rule flagging a
//! violent verb near a self-referential phrase.

use regex::Regex;
use serde::{Deserialize, Serialize};
use vesper_types::LockdownLevel;

use crate::error::ModerationError;
use crate::normalize::normalize_text;
use crate::terms;

/// Base intent-score threshold for a violation.
const INTENT_THRESHOLD: i32 = 5;
/// Threshold while the user is under a soft lockdown.
const INTENT_THRESHOLD_SOFT_LOCKDOWN: i32 = 4;
/// Threshold while the user is under a hard lockdown.
const INTENT_THRESHOLD_HARD_LOCKDOWN: i32 = 3;

/// Token window for the violent-verb / self-reference proximity rule.
const SELF_HARM_WINDOW: usize = 3;

/// Why a transcript was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    Harassment,
    Threat,
    SelfHarm,
    SelfHarmEncouragement,
}

impl ViolationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Harassment => "harassment",
            Self::Threat => "threat",
            Self::SelfHarm => "self_harm",
            Self::SelfHarmEncouragement => "self_harm_encouragement",
        }
    }
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context the scanner needs about where and from whom the text came.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanContext {
    /// The channel is flagged relaxed; the intent score is discounted.
    pub relaxed_channel: bool,
    /// Active lockdown on the speaking user, if any.
    pub lockdown: Option<LockdownLevel>,
}

/// Outcome of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub violated: bool,
    pub reason: Option<ViolationReason>,
    /// Severity weight added to the strike ledger for hard violations.
    pub weight: u32,
    /// Soft violations log and notify only; no strike.
    pub soft: bool,
}

impl ScanVerdict {
    fn clean() -> Self {
        Self {
            violated: false,
            reason: None,
            weight: 0,
            soft: false,
        }
    }

    fn hard(reason: ViolationReason, weight: u32) -> Self {
        Self {
            violated: true,
            reason: Some(reason),
            weight,
            soft: false,
        }
    }

    fn soft(reason: ViolationReason) -> Self {
        Self {
            violated: true,
            reason: Some(reason),
            weight: 1,
            soft: true,
        }
    }
}

/// Stateless violation classifier. Compile once, share freely.
pub struct Scanner {
    literal_terms: Regex,
    targeted_patterns: Vec<Regex>,
}

impl Scanner {
    pub fn new() -> Result<Self, ModerationError> {
        let escaped: Vec<String> = terms::HARASSMENT_TERMS
            .iter()
            .map(|t| regex::escape(t))
            .collect();
        let literal_terms = Regex::new(&format!(r"\b(?:{})\b", escaped.join("|")))?;

        let targeted_patterns = terms::HARASSMENT_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            literal_terms,
            targeted_patterns,
        })
    }

    /// Classifies `text`. Never fails; unscannable input is clean.
    pub fn scan(&self, text: &str, ctx: &ScanContext) -> ScanVerdict {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return ScanVerdict::clean();
        }

        // Known-safe phrases short-circuit everything.
        if terms::BENIGN_PHRASES
            .iter()
            .any(|p| contains_phrase(&normalized, p))
        {
            return ScanVerdict::clean();
        }

        let tokens: Vec<&str> = normalized.split(' ').collect();

        // Sparse-token abbreviations are a violation regardless of score.
        if self.sparse_abbreviation_hit(&tokens) {
            return ScanVerdict::hard(ViolationReason::SelfHarmEncouragement, 3);
        }

        // Targeted harassment is hard; a stray literal term is soft.
        if self
            .targeted_patterns
            .iter()
            .any(|p| p.is_match(&normalized))
        {
            return ScanVerdict::hard(ViolationReason::Harassment, 2);
        }

        // Intent scoring path.
        if let Some(verdict) = self.score_intent(&normalized, &tokens, ctx) {
            return verdict;
        }

        if self.literal_terms.is_match(&normalized) {
            return ScanVerdict::soft(ViolationReason::Harassment);
        }

        ScanVerdict::clean()
    }

    /// Joins runs of single-character tokens ("k y s") and checks both the
    /// joined runs and whole tokens against the abbreviation list.
    fn sparse_abbreviation_hit(&self, tokens: &[&str]) -> bool {
        if tokens
            .iter()
            .any(|t| terms::SELF_HARM_ABBREVIATIONS.contains(t))
        {
            return true;
        }

        let mut run = String::new();
        for token in tokens.iter().chain(std::iter::once(&"")) {
            if token.chars().count() == 1 {
                run.push_str(token);
            } else {
                if terms::SELF_HARM_ABBREVIATIONS
                    .iter()
                    .any(|a| run.contains(a))
                {
                    return true;
                }
                run.clear();
            }
        }
        false
    }

    fn score_intent(
        &self,
        normalized: &str,
        tokens: &[&str],
        ctx: &ScanContext,
    ) -> Option<ScanVerdict> {
        let mut score = 0i32;

        let first_person = terms::FIRST_PERSON_INTENT
            .iter()
            .any(|p| contains_phrase(normalized, p));
        if first_person {
            score += 2;
        }

        let violent = tokens.iter().any(|t| verb_matches(t));
        if violent {
            score += 1;
        }

        let self_target = tokens.iter().any(|t| *t == "myself");
        if tokens.iter().any(|t| terms::HUMAN_TARGETS.contains(t)) {
            score += 2;
        }

        if tokens
            .iter()
            .any(|t| terms::REAL_WORLD_LOCATIONS.contains(t))
        {
            score += 2;
        }

        if terms::DANGEROUS_ACTIONS
            .iter()
            .any(|p| contains_phrase(normalized, p))
        {
            score += 3;
        }

        if tokens.iter().any(|t| terms::GAMING_CONTEXT.contains(t)) {
            score -= 2;
        }
        if ctx.relaxed_channel {
            score -= 2;
        }

        let threshold = match ctx.lockdown {
            Some(LockdownLevel::Hard) => INTENT_THRESHOLD_HARD_LOCKDOWN,
            Some(LockdownLevel::Soft) => INTENT_THRESHOLD_SOFT_LOCKDOWN,
            None => INTENT_THRESHOLD,
        };

        if score >= threshold {
            let reason = if self_target {
                ViolationReason::SelfHarm
            } else {
                ViolationReason::Threat
            };
            tracing::debug!(score, threshold, reason = %reason, "intent threshold crossed");
            return Some(ScanVerdict::hard(reason, 3));
        }

        // A violent verb close to a self-referential phrase is self-harm
        // even when the general score stays under the line.
        if violent && self.self_reference_near_verb(tokens) {
            return Some(ScanVerdict::hard(ViolationReason::SelfHarm, 3));
        }

        None
    }

    fn self_reference_near_verb(&self, tokens: &[&str]) -> bool {
        let verb_positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| verb_matches(t))
            .map(|(i, _)| i)
            .collect();
        if verb_positions.is_empty() {
            return false;
        }

        for phrase in terms::SELF_REFERENTIAL {
            let phrase_tokens: Vec<&str> = phrase.split(' ').collect();
            for start in 0..tokens.len() {
                if tokens[start..]
                    .iter()
                    .take(phrase_tokens.len())
                    .eq(phrase_tokens.iter())
                {
                    if verb_positions
                        .iter()
                        .any(|&v| v.abs_diff(start) <= SELF_HARM_WINDOW)
                    {
                        return true;
                    }
                }
            }
        }
        false
    }
}

/// A violent verb matches with simple inflections ("kill", "kills",
/// "killing", "killed").
fn verb_matches(token: &str) -> bool {
    terms::VIOLENT_VERBS.iter().any(|v| {
        token == *v
            || token.strip_suffix('s') == Some(v)
            || token.strip_suffix("ing").is_some_and(|stem| stem == *v || format!("{stem}e") == *v)
            || token.strip_suffix("ed").is_some_and(|stem| stem == *v || format!("{stem}e") == *v)
    })
}

/// Word-boundary-aware phrase containment over space-separated text.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    let padded_text = format!(" {text} ");
    let padded_phrase = format!(" {phrase} ");
    padded_text.contains(&padded_phrase)
}
