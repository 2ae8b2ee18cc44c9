//! Transcription gateway.
//!
//! Tries a primary provider and falls through to a secondary on failure or
//! empty output. Both providers receive phrase-boost hints (wake aliases
//! and command verbs) to raise recognition accuracy on the vocabulary the
//! router actually dispatches on.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use vesper_types::AudioClip;

use crate::error::SpeechError;

/// Maximum audio input size for transcription (10 MiB). Prevents OOM from
/// oversized payloads.
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for one transcription attempt.
const STT_TIMEOUT: Duration = Duration::from_secs(30);

/// A vendor HTTP recognizer: raw s16le PCM in, JSON `{"text": ...}` out.
#[derive(Debug, Clone)]
pub struct HttpStt {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpStt {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    async fn transcribe(
        &self,
        audio: &AudioClip,
        hints: &[String],
    ) -> Result<String, SpeechError> {
        let bytes = audio.to_s16le_bytes();
        if bytes.len() > MAX_STT_INPUT_BYTES {
            return Err(SpeechError::Transcription(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                bytes.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .query(&[
                ("sample_rate", audio.sample_rate.to_string()),
                ("hints", hints.join(",")),
            ])
            .header("content-type", "audio/l16")
            .timeout(STT_TIMEOUT)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        let text = body
            .get("text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                SpeechError::Transcription("response missing text field".to_string())
            })?;
        Ok(text.to_string())
    }
}

/// A local recognizer subprocess fed s16le PCM on stdin.
#[derive(Debug, Clone)]
pub struct ProcessStt {
    model_path: PathBuf,
    binary_path: PathBuf,
}

impl ProcessStt {
    pub fn new(model_path: impl Into<PathBuf>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            binary_path: binary_path.into(),
        }
    }

    async fn transcribe(
        &self,
        audio: &AudioClip,
        hints: &[String],
    ) -> Result<String, SpeechError> {
        let bytes = audio.to_s16le_bytes();
        if bytes.len() > MAX_STT_INPUT_BYTES {
            return Err(SpeechError::Transcription(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                bytes.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("--sample-rate")
            .arg(audio.sample_rate.to_string())
            .arg("-f")
            .arg("-") // read from stdin
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        if !hints.is_empty() {
            command.arg("--prompt").arg(hints.join(" "));
        }

        let mut child = command
            .spawn()
            .map_err(|e| SpeechError::Transcription(format!("failed to spawn recognizer: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SpeechError::Transcription("failed to open stdin".to_string()))?;

        stdin
            .write_all(&bytes)
            .await
            .map_err(|e| SpeechError::Transcription(format!("failed to write to stdin: {e}")))?;
        drop(stdin); // close stdin to signal EOF

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                SpeechError::Transcription(format!(
                    "recognizer timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| SpeechError::Transcription(format!("failed to read stdout: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Transcription(format!(
                "recognizer failed: {stderr}"
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// One link in the provider chain.
#[derive(Debug, Clone)]
pub enum SttBackend {
    Http(HttpStt),
    Process(ProcessStt),
}

impl SttBackend {
    async fn transcribe(
        &self,
        audio: &AudioClip,
        hints: &[String],
    ) -> Result<String, SpeechError> {
        match self {
            Self::Http(b) => b.transcribe(audio, hints).await,
            Self::Process(b) => b.transcribe(audio, hints).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Process(_) => "process",
        }
    }
}

/// Primary/fallback transcription with phrase-boost hints.
#[derive(Debug)]
pub struct TranscriptionGateway {
    primary: SttBackend,
    fallback: Option<SttBackend>,
    hints: Vec<String>,
}

impl TranscriptionGateway {
    pub fn new(primary: SttBackend, fallback: Option<SttBackend>, hints: Vec<String>) -> Self {
        Self {
            primary,
            fallback,
            hints,
        }
    }

    /// Transcribes a finished capture.
    ///
    /// Failure of every provider yields `None`, not an error, so the caller
    /// can silently drop the turn.
    pub async fn transcribe(&self, audio: &AudioClip) -> Option<String> {
        match self.primary.transcribe(audio, &self.hints).await {
            Ok(text) => {
                let text = normalize_whitespace(&text);
                if !text.is_empty() {
                    return Some(text);
                }
                tracing::debug!(provider = self.primary.name(), "empty transcript");
            }
            Err(e) => {
                tracing::warn!(provider = self.primary.name(), error = %e, "transcription failed");
            }
        }

        let fallback = self.fallback.as_ref()?;
        match fallback.transcribe(audio, &self.hints).await {
            Ok(text) => {
                let text = normalize_whitespace(&text);
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                tracing::warn!(provider = fallback.name(), error = %e, "fallback transcription failed");
                None
            }
        }
    }
}

/// Collapses all whitespace runs to single spaces and trims the ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
