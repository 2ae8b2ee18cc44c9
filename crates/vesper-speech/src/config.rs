//! Speech provider configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

fn default_voice() -> String {
    "vesper-warm".to_string()
}

/// Configuration for one transcription provider chain.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SttConfig {
    /// Endpoint of the primary (vendor) recognizer. Empty disables it.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Path to a local recognizer binary used as the fallback. Empty
    /// disables the fallback.
    #[serde(default)]
    pub binary_path: String,
    /// Model file handed to the local recognizer.
    #[serde(default)]
    pub model_path: String,
}

impl fmt::Debug for SttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SttConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("binary_path", &self.binary_path)
            .field("model_path", &self.model_path)
            .finish()
    }
}

/// Configuration for the synthesis provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Endpoint of the vendor synthesizer. Empty disables HTTP synthesis.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Path to a local synthesizer binary, used when no endpoint is set.
    #[serde(default)]
    pub binary_path: String,
    /// Voice identity requested from the provider; also the cache key.
    #[serde(default = "default_voice")]
    pub voice: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            binary_path: String::new(),
            voice: default_voice(),
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("binary_path", &self.binary_path)
            .field("voice", &self.voice)
            .finish()
    }
}

/// Combined speech configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub stt: SttConfig,
    #[serde(default)]
    pub tts: TtsConfig,
}
