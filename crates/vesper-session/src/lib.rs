//! Per-speaker conversational windows for the Vesper agent.
//!
//! A session is the short window after a wake event during which follow-up
//! utterances from the same speaker are treated as directed at the agent
//! without a fresh alias match. Sessions also carry the pending-slot state
//! used for multi-turn slot filling ("which city?").
//!
//! All operations are synchronous and self-expiring: every read checks the
//! TTL first and evicts stale entries, so no background sweeper is needed.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use vesper_types::SpeakerKey;

/// Default conversational window after a wake event.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15);

/// A clarifying question the agent is waiting to have answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwaitingSlot {
    /// A location for a pending weather query.
    WeatherLocation,
}

impl AwaitingSlot {
    /// Short label used in log records and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WeatherLocation => "weather_location",
        }
    }
}

/// One speaker's live conversational window.
#[derive(Debug, Clone)]
pub struct Session {
    /// The session is absent once `Instant::now()` passes this.
    pub active_until: Instant,
    /// Slot the agent is waiting on, if any.
    pub awaiting: Option<AwaitingSlot>,
    /// When the agent last asked the clarifying question.
    pub last_prompt_at: Option<Instant>,
}

/// Tracks conversational windows for every (guild, speaker) pair.
pub struct SessionTracker {
    ttl: Duration,
    sessions: Mutex<HashMap<SpeakerKey, Session>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live session for `key`, evicting it first if expired.
    pub fn get(&self, key: SpeakerKey) -> Option<Session> {
        let mut sessions = self.lock();
        match sessions.get(&key) {
            Some(s) if s.active_until > Instant::now() => Some(s.clone()),
            Some(_) => {
                sessions.remove(&key);
                tracing::debug!(speaker = %key, "session expired");
                None
            }
            None => None,
        }
    }

    /// Opens a fresh window for `key`, or refreshes an existing one.
    ///
    /// A refresh keeps the pending slot; a wake after expiry starts clean.
    pub fn wake(&self, key: SpeakerKey) {
        let now = Instant::now();
        let mut sessions = self.lock();
        match sessions.get_mut(&key) {
            Some(s) if s.active_until > now => {
                s.active_until = now + self.ttl;
            }
            _ => {
                sessions.insert(
                    key,
                    Session {
                        active_until: now + self.ttl,
                        awaiting: None,
                        last_prompt_at: None,
                    },
                );
            }
        }
    }

    /// Pushes `active_until` forward for a live session. No-op when the
    /// session is absent or already expired.
    pub fn extend(&self, key: SpeakerKey) {
        let now = Instant::now();
        let mut sessions = self.lock();
        if let Some(s) = sessions.get_mut(&key) {
            if s.active_until > now {
                s.active_until = now + self.ttl;
            }
        }
    }

    /// Sets or clears the pending slot on a live session; stamps the prompt
    /// time when a slot is set.
    pub fn set_awaiting(&self, key: SpeakerKey, slot: Option<AwaitingSlot>) {
        let now = Instant::now();
        let mut sessions = self.lock();
        if let Some(s) = sessions.get_mut(&key) {
            if s.active_until > now {
                s.last_prompt_at = slot.as_ref().map(|_| now);
                s.awaiting = slot;
            }
        }
    }

    /// Returns the pending slot for a live session.
    pub fn awaiting(&self, key: SpeakerKey) -> Option<AwaitingSlot> {
        self.get(key).and_then(|s| s.awaiting)
    }

    /// Whether enough time has passed since the last clarifying question to
    /// ask it again. Prevents the agent from re-asking in a tight loop when
    /// the speaker does not answer.
    pub fn should_prompt_again(&self, key: SpeakerKey, min_interval: Duration) -> bool {
        match self.get(key) {
            Some(s) => match s.last_prompt_at {
                Some(at) => at.elapsed() >= min_interval,
                None => true,
            },
            None => true,
        }
    }

    /// Drops the session outright, e.g. after a slot is filled.
    pub fn clear(&self, key: SpeakerKey) {
        self.lock().remove(&key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SpeakerKey, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
