//! Pipeline configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;
use vesper_speech::SpeechConfig;
use vesper_types::{ChannelId, GuildPolicy, SensitivityTier, UserId, WakeProfile};

use crate::capture::CaptureConfig;

/// Wake detector settings as they appear in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WakeSettings {
    /// Alias list override.
    pub aliases: Vec<String>,
    /// Whether plain in-session follow-ups must re-match an alias.
    pub engagement_required: bool,
    /// Sensitivity tier label: "strict", "default", or "lenient".
    pub sensitivity: String,
}

impl Default for WakeSettings {
    fn default() -> Self {
        let profile = WakeProfile::default();
        Self {
            aliases: profile.aliases,
            engagement_required: profile.engagement_required,
            sensitivity: "default".to_string(),
        }
    }
}

impl WakeSettings {
    /// Resolves the settings into a validated profile. Unknown sensitivity
    /// labels fall back to the default tier.
    pub fn to_profile(&self) -> WakeProfile {
        WakeProfile {
            aliases: self.aliases.clone(),
            engagement_required: self.engagement_required,
            sensitivity: SensitivityTier::from_label(&self.sensitivity).unwrap_or_default(),
        }
    }
}

/// Session window settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Conversational window TTL after a wake event, in seconds.
    pub ttl_secs: u64,
    /// Minimum interval between repeats of a clarifying question.
    pub prompt_debounce_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 15,
            prompt_debounce_secs: 10,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub wake: WakeSettings,
    pub session: SessionSettings,
    pub capture: CaptureConfig,
    pub policy: GuildPolicy,
    pub speech: SpeechConfig,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VESPER_WAKE_ALIASES` (comma-separated) overrides `wake.aliases`
/// - `VESPER_WAKE_REQUIRED` overrides `wake.engagement_required`
/// - `VESPER_WAKE_SENSITIVITY` overrides `wake.sensitivity`
/// - `VESPER_MODERATION_ENABLED` overrides `policy.moderation_enabled`
/// - `VESPER_DELETE_VIOLATIONS` overrides `policy.delete_violations`
/// - `VESPER_STRIKE_TIMEOUT` / `VESPER_STRIKE_KICK` / `VESPER_STRIKE_BAN`
///   override the escalation thresholds
/// - `VESPER_TIMEOUT_SECS` overrides `policy.timeout_secs`
/// - `VESPER_STRIKE_DECAY_HOURS` overrides `policy.strike_decay_hours`
/// - `VESPER_RELAXED_CHANNELS` / `VESPER_EXEMPT_CHANNELS` /
///   `VESPER_EXEMPT_USERS` (comma-separated ids) override the policy lists
/// - `VESPER_STT_ENDPOINT`, `VESPER_STT_API_KEY`, `VESPER_STT_BINARY`,
///   `VESPER_STT_MODEL`, `VESPER_TTS_ENDPOINT`, `VESPER_TTS_API_KEY`,
///   `VESPER_TTS_BINARY`, `VESPER_TTS_VOICE` override speech settings
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<PipelineConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                PipelineConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => PipelineConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut PipelineConfig) {
    if let Ok(aliases) = std::env::var("VESPER_WAKE_ALIASES") {
        let parsed: Vec<String> = aliases
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if !parsed.is_empty() {
            config.wake.aliases = parsed;
        }
    }
    if let Ok(required) = std::env::var("VESPER_WAKE_REQUIRED") {
        config.wake.engagement_required = truthy(&required);
    }
    if let Ok(tier) = std::env::var("VESPER_WAKE_SENSITIVITY") {
        config.wake.sensitivity = tier;
    }

    if let Ok(enabled) = std::env::var("VESPER_MODERATION_ENABLED") {
        config.policy.moderation_enabled = truthy(&enabled);
    }
    if let Ok(delete) = std::env::var("VESPER_DELETE_VIOLATIONS") {
        config.policy.delete_violations = truthy(&delete);
    }
    if let Ok(Ok(t)) = std::env::var("VESPER_STRIKE_TIMEOUT").map(|v| v.parse()) {
        config.policy.strike_thresholds.timeout = t;
    }
    if let Ok(Ok(t)) = std::env::var("VESPER_STRIKE_KICK").map(|v| v.parse()) {
        config.policy.strike_thresholds.kick = t;
    }
    if let Ok(Ok(t)) = std::env::var("VESPER_STRIKE_BAN").map(|v| v.parse()) {
        config.policy.strike_thresholds.ban = t;
    }
    if let Ok(Ok(secs)) = std::env::var("VESPER_TIMEOUT_SECS").map(|v| v.parse()) {
        config.policy.timeout_secs = secs;
    }
    if let Ok(Ok(hours)) = std::env::var("VESPER_STRIKE_DECAY_HOURS").map(|v| v.parse()) {
        config.policy.strike_decay_hours = hours;
    }
    if let Ok(list) = std::env::var("VESPER_RELAXED_CHANNELS") {
        config.policy.relaxed_channels = id_list(&list).into_iter().map(ChannelId).collect();
    }
    if let Ok(list) = std::env::var("VESPER_EXEMPT_CHANNELS") {
        config.policy.exempt_channels = id_list(&list).into_iter().map(ChannelId).collect();
    }
    if let Ok(list) = std::env::var("VESPER_EXEMPT_USERS") {
        config.policy.exempt_users = id_list(&list).into_iter().map(UserId).collect();
    }

    if let Ok(endpoint) = std::env::var("VESPER_STT_ENDPOINT") {
        config.speech.stt.endpoint = endpoint;
    }
    if let Ok(key) = std::env::var("VESPER_STT_API_KEY") {
        config.speech.stt.api_key = key;
    }
    if let Ok(binary) = std::env::var("VESPER_STT_BINARY") {
        config.speech.stt.binary_path = binary;
    }
    if let Ok(model) = std::env::var("VESPER_STT_MODEL") {
        config.speech.stt.model_path = model;
    }
    if let Ok(endpoint) = std::env::var("VESPER_TTS_ENDPOINT") {
        config.speech.tts.endpoint = endpoint;
    }
    if let Ok(key) = std::env::var("VESPER_TTS_API_KEY") {
        config.speech.tts.api_key = key;
    }
    if let Ok(binary) = std::env::var("VESPER_TTS_BINARY") {
        config.speech.tts.binary_path = binary;
    }
    if let Ok(voice) = std::env::var("VESPER_TTS_VOICE") {
        config.speech.tts.voice = voice;
    }
}

fn truthy(value: &str) -> bool {
    value == "true" || value == "1"
}

fn id_list(value: &str) -> Vec<u64> {
    value
        .split(',')
        .filter_map(|v| v.trim().parse().ok())
        .collect()
}
