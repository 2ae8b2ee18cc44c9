//! Rolling short-term turn history.
//!
//! The conversational brain receives the last few exchanges with a speaker
//! for short-term coherence. The window is small and in-memory only; this
//! core keeps no durable conversation history.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use vesper_types::SpeakerKey;

/// Default number of turns remembered per speaker.
const DEFAULT_WINDOW: usize = 8;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    Speaker,
    Agent,
}

/// One remembered exchange line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: TurnRole,
    pub text: String,
}

/// Per-speaker rolling windows.
pub struct TurnHistory {
    window: usize,
    turns: Mutex<HashMap<SpeakerKey, VecDeque<HistoryTurn>>>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            turns: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, key: SpeakerKey, role: TurnRole, text: &str) {
        let mut turns = self.lock();
        let window = turns.entry(key).or_default();
        if window.len() == self.window {
            window.pop_front();
        }
        window.push_back(HistoryTurn {
            role,
            text: text.to_string(),
        });
    }

    /// Snapshot of the speaker's window, oldest first.
    pub fn context(&self, key: SpeakerKey) -> Vec<HistoryTurn> {
        self.lock()
            .get(&key)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<SpeakerKey, VecDeque<HistoryTurn>>> {
        self.turns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TurnHistory {
    fn default() -> Self {
        Self::new()
    }
}
