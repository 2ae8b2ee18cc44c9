//! Per-guild playback queue.
//!
//! One consumer task per guild owns the queue and the player: `enqueue`
//! plays immediately when idle and appends otherwise, finished items pull
//! the next head, and a human speaking mid-playback interrupts — the player
//! stops and the queue is cleared, so people always have priority over a
//! pending reply. Single-owner actor, no shared locks.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use vesper_observe::{EventLog, EventPayload};
use vesper_types::{AudioClip, GuildId, UserId};

use crate::error::PipelineError;
use crate::platform::{PlatformError, VoicePlatform};

/// One queued playback unit. A bare tone and a synthesized reply are the
/// same thing to the queue.
#[derive(Debug, Clone)]
pub enum PlaybackItem {
    /// Raw mono PCM, synthesized speech or a generated tone.
    Pcm(Arc<AudioClip>),
    /// A pre-built platform audio resource, passed through untouched.
    Resource(Arc<Vec<u8>>),
}

impl PlaybackItem {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pcm(_) => "pcm",
            Self::Resource(_) => "resource",
        }
    }
}

enum PlaybackCommand {
    Enqueue(PlaybackItem),
    Interrupt { by: UserId },
}

/// Handle to a guild's playback consumer task.
#[derive(Debug, Clone)]
pub struct PlaybackQueue {
    guild: GuildId,
    tx: mpsc::UnboundedSender<PlaybackCommand>,
}

impl PlaybackQueue {
    /// Spawns the consumer task for `guild`. The task exits when the last
    /// handle is dropped.
    pub fn spawn<P: VoicePlatform>(platform: Arc<P>, guild: GuildId, log: Arc<EventLog>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_consumer(platform, guild, log, rx));
        Self { guild, tx }
    }

    /// Appends an item; the consumer plays it immediately when idle.
    pub fn enqueue(&self, item: PlaybackItem) -> Result<(), PipelineError> {
        self.tx
            .send(PlaybackCommand::Enqueue(item))
            .map_err(|_| PipelineError::PlaybackClosed(self.guild))
    }

    /// Signals that `by` started speaking: stop the player, clear the
    /// queue. No-op when nothing is playing or queued.
    pub fn interrupt(&self, by: UserId) -> Result<(), PipelineError> {
        self.tx
            .send(PlaybackCommand::Interrupt { by })
            .map_err(|_| PipelineError::PlaybackClosed(self.guild))
    }
}

type PlayingFuture = Pin<Box<dyn Future<Output = Result<(), PlatformError>> + Send>>;

enum Step {
    Command(Option<PlaybackCommand>),
    Finished(Result<(), PlatformError>),
}

async fn run_consumer<P: VoicePlatform>(
    platform: Arc<P>,
    guild: GuildId,
    log: Arc<EventLog>,
    mut rx: mpsc::UnboundedReceiver<PlaybackCommand>,
) {
    let mut queue: VecDeque<PlaybackItem> = VecDeque::new();
    let mut playing: Option<PlayingFuture> = None;

    loop {
        // Idle with a non-empty queue: start the head item.
        if playing.is_none() {
            if let Some(item) = queue.pop_front() {
                emit(&log, guild, &EventPayload::PlaybackStarted {
                    kind: item.kind().to_string(),
                });
                playing = Some(Box::pin({
                    let platform = Arc::clone(&platform);
                    async move { platform.play(guild, item).await }
                }));
            }
        }

        let step = match playing.as_mut() {
            Some(fut) => tokio::select! {
                cmd = rx.recv() => Step::Command(cmd),
                result = fut => Step::Finished(result),
            },
            None => Step::Command(rx.recv().await),
        };

        match step {
            Step::Command(None) => break,
            Step::Command(Some(PlaybackCommand::Enqueue(item))) => {
                emit(&log, guild, &EventPayload::PlaybackEnqueued {
                    kind: item.kind().to_string(),
                    queue_len: queue.len() + 1,
                });
                queue.push_back(item);
            }
            Step::Command(Some(PlaybackCommand::Interrupt { by })) => {
                if playing.is_some() || !queue.is_empty() {
                    platform.stop(guild);
                    playing = None;
                    let dropped = queue.len();
                    queue.clear();
                    emit(&log, guild, &EventPayload::PlaybackInterrupted {
                        by: by.to_string(),
                        dropped,
                    });
                }
            }
            Step::Finished(result) => {
                if let Err(e) = result {
                    tracing::warn!(%guild, error = %e, "playback item failed");
                }
                playing = None;
            }
        }
    }

    tracing::debug!(%guild, "playback consumer stopped");
}

fn emit(log: &EventLog, guild: GuildId, payload: &EventPayload) {
    if let Err(e) = log.emit(guild, &guild.to_string(), payload) {
        tracing::error!(error = %e, "failed to record playback event");
    }
}
