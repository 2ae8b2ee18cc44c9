//! Per-speaker capture state machine.
//!
//! `Idle → Capturing → (Decoding → Handoff) | Discarded`, driven by the
//! platform's speaking signals. The manager's `active` map doubles as the
//! guild's busy-speaker set: a speaker present in the map has a live
//! capture and re-entrant start signals are ignored. A capture leaves the
//! map the moment it finishes — before decoding — so a decode failure can
//! never wedge the speaker out of future captures.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vesper_types::{AudioClip, UserId, PLATFORM_SAMPLE_RATE};

use crate::audio::downmix_stereo;
use crate::platform::{PlatformError, VoicePlatform};

/// Capture bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Hard cap on one capture; the platform's end-of-speech signal
    /// normally fires first.
    pub max_capture_secs: u64,
    /// Mono buffers shorter than this are discarded without transcription.
    pub min_capture_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_capture_secs: 30,
            min_capture_ms: 500,
        }
    }
}

/// A capture in progress: raw compressed frames, not yet decoded.
#[derive(Debug)]
struct CaptureSession {
    id: Uuid,
    frames: Vec<Vec<u8>>,
    started_at: Instant,
}

/// A capture that has left the busy set and is ready for decoding.
#[derive(Debug)]
pub struct FinishedCapture {
    pub id: Uuid,
    pub user: UserId,
    frames: Vec<Vec<u8>>,
}

/// What became of a finished capture after decoding.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Decoded, downmixed, long enough to matter.
    Handoff(AudioClip),
    /// Below the minimum audible duration; dropped silently.
    Discarded { duration_ms: u64 },
}

/// Tracks all live captures for one guild.
#[derive(Debug)]
pub struct CaptureManager {
    config: CaptureConfig,
    active: HashMap<UserId, CaptureSession>,
}

impl CaptureManager {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            active: HashMap::new(),
        }
    }

    /// Opens a capture for `user`. Returns false (and changes nothing) when
    /// the speaker is already busy, so duplicate start signals cannot
    /// double-subscribe.
    pub fn begin(&mut self, user: UserId) -> bool {
        if self.active.contains_key(&user) {
            tracing::debug!(%user, "ignoring re-entrant capture start");
            return false;
        }
        self.active.insert(
            user,
            CaptureSession {
                id: Uuid::new_v4(),
                frames: Vec::new(),
                started_at: Instant::now(),
            },
        );
        true
    }

    /// Appends a frame to the speaker's capture. Frames for speakers with
    /// no open capture are dropped. Returns the finished capture when the
    /// hard duration cap forces an early end.
    pub fn push_frame(&mut self, user: UserId, payload: Vec<u8>) -> Option<FinishedCapture> {
        let session = self.active.get_mut(&user)?;
        session.frames.push(payload);

        if session.started_at.elapsed() >= Duration::from_secs(self.config.max_capture_secs) {
            tracing::warn!(%user, "capture hit hard duration cap");
            return self.end(user);
        }
        None
    }

    /// Ends the speaker's capture on the platform's end-of-speech signal.
    /// Removal from the busy set happens here, unconditionally.
    pub fn end(&mut self, user: UserId) -> Option<FinishedCapture> {
        let session = self.active.remove(&user)?;
        Some(FinishedCapture {
            id: session.id,
            user,
            frames: session.frames,
        })
    }

    /// Whether the speaker currently has a live capture.
    pub fn is_busy(&self, user: UserId) -> bool {
        self.active.contains_key(&user)
    }

    pub fn busy_count(&self) -> usize {
        self.active.len()
    }

    pub fn min_capture_ms(&self) -> u64 {
        self.config.min_capture_ms
    }
}

impl FinishedCapture {
    /// Decodes the frame stream to stereo PCM, downmixes to mono, and
    /// applies the minimum-duration check.
    ///
    /// Runs after the capture already left the busy set; an error here
    /// affects only this turn.
    pub fn decode<P: VoicePlatform>(
        self,
        platform: &P,
        min_capture_ms: u64,
    ) -> Result<CaptureOutcome, PlatformError> {
        let mut stereo: Vec<i16> = Vec::new();
        for frame in &self.frames {
            stereo.extend(platform.decode_frame(frame)?);
        }

        let mono = downmix_stereo(&stereo);
        let clip = AudioClip::new(mono, PLATFORM_SAMPLE_RATE);
        let duration_ms = clip.duration_ms();

        if duration_ms < min_capture_ms {
            return Ok(CaptureOutcome::Discarded { duration_ms });
        }
        Ok(CaptureOutcome::Handoff(clip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubDecoder;

    impl VoicePlatform for StubDecoder {
        fn decode_frame(&self, payload: &[u8]) -> Result<Vec<i16>, PlatformError> {
            if payload.is_empty() {
                return Err(PlatformError::Decode("empty frame".to_string()));
            }
            // One input byte expands to 960 interleaved stereo samples
            // (10ms at 48kHz), value taken from the byte.
            Ok(vec![payload[0] as i16; 960])
        }

        async fn play(
            &self,
            _guild: vesper_types::GuildId,
            _item: crate::playback::PlaybackItem,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        fn stop(&self, _guild: vesper_types::GuildId) {}

        async fn display_name(
            &self,
            _guild: vesper_types::GuildId,
            user: UserId,
        ) -> String {
            user.to_string()
        }

        async fn can_enforce(
            &self,
            _guild: vesper_types::GuildId,
            _action: vesper_moderation::EnforcementAction,
        ) -> bool {
            true
        }

        async fn timeout_member(
            &self,
            _guild: vesper_types::GuildId,
            _user: UserId,
            _duration: Duration,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn kick_member(
            &self,
            _guild: vesper_types::GuildId,
            _user: UserId,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn ban_member(
            &self,
            _guild: vesper_types::GuildId,
            _user: UserId,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn send_notice(
            &self,
            _channel: vesper_types::ChannelId,
            _text: &str,
        ) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn manager() -> CaptureManager {
        CaptureManager::new(CaptureConfig::default())
    }

    #[test]
    fn reentrant_start_is_ignored() {
        let mut m = manager();
        assert!(m.begin(UserId(1)));
        assert!(!m.begin(UserId(1)));
        assert_eq!(m.busy_count(), 1);
    }

    #[test]
    fn frames_without_capture_are_dropped() {
        let mut m = manager();
        assert!(m.push_frame(UserId(1), vec![1, 2, 3]).is_none());
        assert!(!m.is_busy(UserId(1)));
    }

    #[test]
    fn end_releases_busy_slot() {
        let mut m = manager();
        m.begin(UserId(1));
        m.push_frame(UserId(1), vec![5]);
        let finished = m.end(UserId(1)).expect("capture finishes");
        assert_eq!(finished.user, UserId(1));
        assert!(!m.is_busy(UserId(1)));
        // A fresh capture can start immediately.
        assert!(m.begin(UserId(1)));
    }

    #[test]
    fn end_without_capture_is_none() {
        let mut m = manager();
        assert!(m.end(UserId(1)).is_none());
    }

    #[test]
    fn short_capture_is_discarded() {
        let mut m = manager();
        m.begin(UserId(1));
        // One frame: 960 stereo samples → 480 mono = 10ms, below 500ms.
        m.push_frame(UserId(1), vec![9]);
        let finished = m.end(UserId(1)).unwrap();
        match finished.decode(&StubDecoder, 500).unwrap() {
            CaptureOutcome::Discarded { duration_ms } => assert!(duration_ms < 500),
            CaptureOutcome::Handoff(_) => panic!("short capture must be discarded"),
        }
    }

    #[test]
    fn long_capture_hands_off_mono() {
        let mut m = manager();
        m.begin(UserId(1));
        // 60 frames × 10ms = 600ms of audio.
        for _ in 0..60 {
            m.push_frame(UserId(1), vec![4]);
        }
        let finished = m.end(UserId(1)).unwrap();
        match finished.decode(&StubDecoder, 500).unwrap() {
            CaptureOutcome::Handoff(clip) => {
                assert_eq!(clip.sample_rate, PLATFORM_SAMPLE_RATE);
                assert_eq!(clip.duration_ms(), 600);
                // Equal stereo channels average to themselves.
                assert!(clip.samples.iter().all(|&s| s == 4));
            }
            CaptureOutcome::Discarded { .. } => panic!("long capture must hand off"),
        }
    }

    #[test]
    fn decode_failure_does_not_wedge_speaker() {
        let mut m = manager();
        m.begin(UserId(1));
        m.push_frame(UserId(1), Vec::new()); // undecodable frame
        let finished = m.end(UserId(1)).unwrap();
        assert!(finished.decode(&StubDecoder, 500).is_err());
        // The busy slot was already released at end().
        assert!(m.begin(UserId(1)));
    }
}
