//! Synthesis gateway.
//!
//! Converts reply text to platform PCM via an external synthesizer, caching
//! by (voice, exact text) and retrying transient failures with exponential
//! backoff before giving up and returning `None`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::RwLock;
use vesper_types::AudioClip;

use crate::error::SpeechError;

/// Maximum text input size for synthesis (16 KiB). Prevents resource
/// exhaustion from oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 16 * 1024;

/// Timeout for one synthesis attempt.
const TTS_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded retry schedule: attempts and base backoff (doubled per attempt).
const MAX_SYNTH_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(250);

/// A vendor HTTP synthesizer: JSON request in, WAV payload out.
#[derive(Debug, Clone)]
pub struct HttpTts {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpTts {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(TTS_TIMEOUT)
            .json(&serde_json::json!({ "text": text, "voice": voice }))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// A local synthesizer subprocess that prints a WAV payload to stdout.
#[derive(Debug, Clone)]
pub struct ProcessTts {
    binary_path: PathBuf,
}

impl ProcessTts {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError> {
        let child = Command::new(&self.binary_path)
            .arg("--voice")
            .arg(voice)
            .arg("--stdout")
            .arg(text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpeechError::Synthesis(format!("failed to spawn synthesizer: {e}")))?;

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                SpeechError::Synthesis(format!(
                    "synthesizer timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| SpeechError::Synthesis(format!("failed to wait for synthesizer: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Synthesis(format!("synthesizer failed: {stderr}")));
        }

        Ok(output.stdout)
    }
}

/// The configured synthesis provider.
#[derive(Debug, Clone)]
pub enum TtsBackend {
    Http(HttpTts),
    Process(ProcessTts),
}

impl TtsBackend {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError> {
        match self {
            Self::Http(b) => b.synthesize(text, voice).await,
            Self::Process(b) => b.synthesize(text, voice).await,
        }
    }
}

/// Caching, retrying synthesis front-end.
pub struct SynthesisGateway {
    backend: TtsBackend,
    voice: String,
    cache: RwLock<HashMap<(String, String), Arc<AudioClip>>>,
}

impl SynthesisGateway {
    pub fn new(backend: TtsBackend, voice: impl Into<String>) -> Self {
        Self {
            backend,
            voice: voice.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Synthesizes `text` in the gateway's voice.
    ///
    /// Repeated phrases ("queue is empty", confirmations) hit the cache and
    /// never touch the network. Provider failure after the bounded retry
    /// schedule yields `None`.
    pub async fn synthesize(&self, text: &str) -> Option<Arc<AudioClip>> {
        if text.is_empty() || text.len() > MAX_TTS_INPUT_BYTES {
            tracing::warn!(len = text.len(), "rejecting synthesis input size");
            return None;
        }

        let cache_key = (self.voice.clone(), text.to_string());
        if let Some(clip) = self.cache.read().await.get(&cache_key) {
            return Some(Arc::clone(clip));
        }

        let mut backoff = BACKOFF_BASE;
        for attempt in 1..=MAX_SYNTH_ATTEMPTS {
            match self.backend.synthesize(text, &self.voice).await {
                Ok(payload) => match decode_wav(&payload) {
                    Ok(clip) => {
                        let clip = Arc::new(clip);
                        self.cache
                            .write()
                            .await
                            .insert(cache_key, Arc::clone(&clip));
                        return Some(clip);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "synthesizer returned undecodable payload");
                        return None;
                    }
                },
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "synthesis attempt failed");
                    if attempt < MAX_SYNTH_ATTEMPTS {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }
        None
    }

    /// Number of cached phrases, for diagnostics.
    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.len()
    }
}

/// Decodes a canonical WAV payload (PCM s16le) to a mono clip.
///
/// Only the canonical 44-byte header layout is supported; stereo payloads
/// are downmixed by per-sample averaging. Anything else is an
/// `InvalidAudio` error.
pub fn decode_wav(payload: &[u8]) -> Result<AudioClip, SpeechError> {
    if payload.len() < 44 || &payload[0..4] != b"RIFF" || &payload[8..12] != b"WAVE" {
        return Err(SpeechError::InvalidAudio("not a WAV payload".to_string()));
    }

    let channels = u16::from_le_bytes([payload[22], payload[23]]);
    let sample_rate = u32::from_le_bytes([payload[24], payload[25], payload[26], payload[27]]);
    let bits = u16::from_le_bytes([payload[34], payload[35]]);

    if bits != 16 {
        return Err(SpeechError::InvalidAudio(format!(
            "unsupported bit depth: {bits}"
        )));
    }
    if channels == 0 || channels > 2 {
        return Err(SpeechError::InvalidAudio(format!(
            "unsupported channel count: {channels}"
        )));
    }

    let data = &payload[44..];
    let samples: Vec<i16> = data
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();

    let mono = if channels == 2 {
        samples
            .chunks_exact(2)
            .map(|pair| (((pair[0] as i32) + (pair[1] as i32)) / 2) as i16)
            .collect()
    } else {
        samples
    };

    Ok(AudioClip::new(mono, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a canonical WAV payload around raw s16le samples.
    fn wav(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let byte_rate = sample_rate * channels as u32 * 2;
        let mut out = Vec::with_capacity(44 + data.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    #[test]
    fn decodes_mono_wav() {
        let clip = decode_wav(&wav(&[1, -2, 3], 1, 22_050)).unwrap();
        assert_eq!(clip.samples, vec![1, -2, 3]);
        assert_eq!(clip.sample_rate, 22_050);
    }

    #[test]
    fn downmixes_stereo_wav() {
        let clip = decode_wav(&wav(&[100, 200, -100, -200], 2, 48_000)).unwrap();
        assert_eq!(clip.samples, vec![150, -150]);
    }

    #[test]
    fn rejects_non_wav_payload() {
        assert!(decode_wav(b"not audio at all").is_err());
        assert!(decode_wav(&[]).is_err());
    }

    #[test]
    fn rejects_unsupported_formats() {
        let mut payload = wav(&[0; 4], 1, 48_000);
        payload[34] = 8; // 8-bit
        assert!(decode_wav(&payload).is_err());

        let mut payload = wav(&[0; 4], 1, 48_000);
        payload[22] = 6; // 6 channels
        assert!(decode_wav(&payload).is_err());
    }

    #[tokio::test]
    async fn failed_synthesis_returns_none() {
        let gateway = SynthesisGateway::new(
            TtsBackend::Process(ProcessTts::new("/nonexistent/synth")),
            "vesper-warm",
        );
        // Spawn fails instantly, so the bounded retry loop stays fast.
        assert!(gateway.synthesize("hello").await.is_none());
        assert_eq!(gateway.cache_len().await, 0);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let gateway = SynthesisGateway::new(
            TtsBackend::Process(ProcessTts::new("/nonexistent/synth")),
            "vesper-warm",
        );
        assert!(gateway.synthesize("").await.is_none());
    }
}
