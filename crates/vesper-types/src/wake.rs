//! Wake profile configuration.
//!
//! A `WakeProfile` tells the wake detector which alias strings engage the
//! agent in a guild and how forgiving the fuzzy match should be.

use serde::{Deserialize, Serialize};

/// How strictly utterances must match a wake alias.
///
/// Each tier maps to a maximum edit distance between the (normalized) first
/// token of an utterance and the nearest (normalized) alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityTier {
    /// Distance 1: near-exact matches only.
    Strict,
    /// Distance 2: typical transcription drift.
    #[default]
    Default,
    /// Distance 3: noisy rooms, heavy accents.
    Lenient,
}

impl SensitivityTier {
    /// Maximum edit distance this tier tolerates.
    pub fn tolerance(self) -> usize {
        match self {
            Self::Strict => 1,
            Self::Default => 2,
            Self::Lenient => 3,
        }
    }

    /// Parses a tier from its configuration label. Unknown labels map to
    /// `None` so the caller can fall back to the default.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "default" => Some(Self::Default),
            "lenient" => Some(Self::Lenient),
            _ => None,
        }
    }
}

/// Per-guild wake configuration.
///
/// Immutable during a turn; built lazily from guild policy on first use and
/// replaced wholesale when configuration changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeProfile {
    /// Alias strings that address the agent, in priority order.
    pub aliases: Vec<String>,
    /// When false, an utterance during an active session continues that
    /// session without re-matching an alias. A fresh wake always requires
    /// an alias match regardless of this flag.
    pub engagement_required: bool,
    /// Fuzzy-match tolerance tier.
    pub sensitivity: SensitivityTier,
}

impl Default for WakeProfile {
    fn default() -> Self {
        Self {
            aliases: vec!["vesper".to_string(), "ves".to_string()],
            engagement_required: true,
            sensitivity: SensitivityTier::default(),
        }
    }
}

impl WakeProfile {
    /// Edit-distance tolerance for this profile.
    pub fn tolerance(&self) -> usize {
        self.sensitivity.tolerance()
    }
}
