//! Per-guild state arena.
//!
//! Each connected guild owns its wake profile, policy, capture manager, and
//! playback handle. Guilds share nothing with each other; operating on a
//! guild with no established connection is an explicit error, not a panic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use vesper_observe::EventLog;
use vesper_types::{ChannelId, GuildId, GuildPolicy, WakeProfile};

use crate::capture::{CaptureConfig, CaptureManager};
use crate::error::PipelineError;
use crate::platform::VoicePlatform;
use crate::playback::PlaybackQueue;

/// Live state for one connected guild.
pub struct GuildState {
    pub guild: GuildId,
    pub profile: WakeProfile,
    pub policy: GuildPolicy,
    pub playback: PlaybackQueue,
    /// Optional channel for status messages ("connected", moderation
    /// notices).
    pub status_channel: Option<ChannelId>,
    captures: Mutex<CaptureManager>,
}

impl GuildState {
    /// Runs `f` against the guild's capture manager under its lock.
    pub fn with_captures<R>(&self, f: impl FnOnce(&mut CaptureManager) -> R) -> R {
        let mut captures = self
            .captures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut captures)
    }
}

/// Concurrency-safe map of connected guilds.
pub struct GuildRegistry {
    guilds: RwLock<HashMap<GuildId, Arc<GuildState>>>,
}

impl GuildRegistry {
    pub fn new() -> Self {
        Self {
            guilds: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a guild connection, spawning its playback consumer.
    /// Reconnecting an already-connected guild replaces its state.
    #[allow(clippy::too_many_arguments)]
    pub fn connect<P: VoicePlatform>(
        &self,
        platform: Arc<P>,
        log: Arc<EventLog>,
        guild: GuildId,
        profile: WakeProfile,
        policy: GuildPolicy,
        capture: CaptureConfig,
        status_channel: Option<ChannelId>,
    ) -> Arc<GuildState> {
        let state = Arc::new(GuildState {
            guild,
            profile,
            policy,
            playback: PlaybackQueue::spawn(platform, guild, log),
            status_channel,
            captures: Mutex::new(CaptureManager::new(capture)),
        });
        self.write().insert(guild, Arc::clone(&state));
        tracing::info!(%guild, "guild connected");
        state
    }

    /// Returns the guild's state, or `NotConnected`.
    pub fn get(&self, guild: GuildId) -> Result<Arc<GuildState>, PipelineError> {
        self.read()
            .get(&guild)
            .cloned()
            .ok_or(PipelineError::NotConnected(guild))
    }

    pub fn disconnect(&self, guild: GuildId) -> Result<(), PipelineError> {
        match self.write().remove(&guild) {
            Some(_) => {
                tracing::info!(%guild, "guild disconnected");
                Ok(())
            }
            None => Err(PipelineError::NotConnected(guild)),
        }
    }

    pub fn connected_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<GuildId, Arc<GuildState>>> {
        self.guilds.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<GuildId, Arc<GuildState>>> {
        self.guilds.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for GuildRegistry {
    fn default() -> Self {
        Self::new()
    }
}
