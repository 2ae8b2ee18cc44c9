//! Strike ledger, lockdown registry, and escalation planning.
//!
//! Both ledgers are process-lifetime in-memory maps, updated atomically per
//! key. Durability is an external collaborator's concern.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use vesper_types::{LockdownLevel, SpeakerKey, StrikeThresholds, UserId};

/// One user's accumulated strike state in one guild.
#[derive(Debug, Clone, Copy)]
struct StrikeEntry {
    /// Weighted severity accumulator.
    count: u32,
    /// Anchor for time-based decay.
    last: Instant,
}

/// Weighted, time-decaying strike counts keyed by (guild, user).
///
/// One unit of weight decays per full decay window elapsed since the last
/// violation; the count never goes below zero.
pub struct StrikeLedger {
    entries: Mutex<HashMap<SpeakerKey, StrikeEntry>>,
}

impl StrikeLedger {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Applies decay, adds `weight`, and returns the new count.
    pub fn record(&self, key: SpeakerKey, weight: u32, decay_window: Duration) -> u32 {
        self.record_at(key, weight, decay_window, Instant::now())
    }

    /// Returns the decayed count without mutating the decay anchor.
    pub fn current(&self, key: SpeakerKey, decay_window: Duration) -> u32 {
        self.current_at(key, decay_window, Instant::now())
    }

    fn record_at(
        &self,
        key: SpeakerKey,
        weight: u32,
        decay_window: Duration,
        now: Instant,
    ) -> u32 {
        let mut entries = self.lock();
        let entry = entries.entry(key).or_insert(StrikeEntry {
            count: 0,
            last: now,
        });
        entry.count = decayed(entry.count, entry.last, now, decay_window) + weight;
        entry.last = now;
        entry.count
    }

    fn current_at(&self, key: SpeakerKey, decay_window: Duration, now: Instant) -> u32 {
        let entries = self.lock();
        match entries.get(&key) {
            Some(e) => decayed(e.count, e.last, now, decay_window),
            None => 0,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SpeakerKey, StrikeEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StrikeLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// One decay step removes one weight unit per full window elapsed.
fn decayed(count: u32, last: Instant, now: Instant, window: Duration) -> u32 {
    if window.is_zero() {
        return count;
    }
    let elapsed = now.saturating_duration_since(last);
    let steps = (elapsed.as_secs() / window.as_secs().max(1)) as u32;
    count.saturating_sub(steps)
}

/// A moderator-issued lockdown on a user.
#[derive(Debug, Clone)]
pub struct LockdownEntry {
    pub level: LockdownLevel,
    pub until: Instant,
    /// The moderator who issued the lockdown.
    pub by: UserId,
    pub reason: Option<String>,
}

/// Active lockdowns keyed by (guild, user), with read-side expiry.
pub struct LockdownRegistry {
    entries: Mutex<HashMap<SpeakerKey, LockdownEntry>>,
}

impl LockdownRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn lock_down(
        &self,
        key: SpeakerKey,
        level: LockdownLevel,
        duration: Duration,
        by: UserId,
        reason: Option<String>,
    ) {
        tracing::info!(target = %key, %level, ?duration, "lockdown issued");
        self.lock().insert(
            key,
            LockdownEntry {
                level,
                until: Instant::now() + duration,
                by,
                reason,
            },
        );
    }

    /// Returns the active lockdown level, evicting expired entries.
    pub fn active(&self, key: SpeakerKey) -> Option<LockdownLevel> {
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(e) if e.until > Instant::now() => Some(e.level),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Returns the full active entry, evicting expired entries.
    pub fn entry(&self, key: SpeakerKey) -> Option<LockdownEntry> {
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(e) if e.until > Instant::now() => Some(e.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn lift(&self, key: SpeakerKey) {
        self.lock().remove(&key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SpeakerKey, LockdownEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LockdownRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// An enforcement consequence, in escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementAction {
    /// Temporary mute for the configured duration.
    Timeout,
    /// Removal from the guild.
    Kick,
    /// Permanent ban.
    Ban,
}

impl EnforcementAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Kick => "kick",
            Self::Ban => "ban",
        }
    }
}

impl std::fmt::Display for EnforcementAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions triggered by the strike count moving from `previous` to
/// `current`: each threshold crossed from below fires its action once, in
/// escalation order.
pub fn plan_escalation(
    previous: u32,
    current: u32,
    thresholds: &StrikeThresholds,
) -> Vec<EnforcementAction> {
    let mut actions = Vec::new();
    let crossed = |t: u32| previous < t && current >= t;
    if crossed(thresholds.timeout) {
        actions.push(EnforcementAction::Timeout);
    }
    if crossed(thresholds.kick) {
        actions.push(EnforcementAction::Kick);
    }
    if crossed(thresholds.ban) {
        actions.push(EnforcementAction::Ban);
    }
    actions
}
