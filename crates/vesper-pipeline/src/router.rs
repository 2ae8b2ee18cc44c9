//! The intent router.
//!
//! Receives one finished transcript per speaker turn and walks it through
//! the decision chain: session/wake gate → moderation review → pending-slot
//! resolution → fast-path intents → conversational fallback. Every spoken
//! reply goes through the synthesis gateway into the guild's playback
//! queue, never directly to the player, so ordering stays FIFO even when
//! several speakers finish turns concurrently.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use vesper_moderation::{EnforcementAction, ModerationEngine, ModerationOutcome};
use vesper_observe::{EventLog, EventPayload};
use vesper_session::{AwaitingSlot, SessionTracker};
use vesper_speech::SynthesisGateway;
use vesper_types::{GuildId, SpeakerKey, UserId};
use vesper_wake::{detect, WakeOutcome};

use crate::audio::test_tone;
use crate::guild::GuildState;
use crate::history::{HistoryTurn, TurnHistory, TurnRole};
use crate::intents::{parse_fast_path, CommandIntent};
use crate::platform::VoicePlatform;
use crate::playback::PlaybackItem;

/// Default debounce between repeats of the same clarifying question.
const DEFAULT_PROMPT_DEBOUNCE: Duration = Duration::from_secs(10);

/// Test-tone parameters for the fast-path intent.
const TONE_FREQ_HZ: u32 = 880;
const TONE_DURATION_MS: u64 = 400;

/// The conversational brain collaborator: transcript plus short-term
/// context in, reply text out.
pub trait Brain: Send + Sync + 'static {
    fn respond(
        &self,
        transcript: &str,
        context: &[HistoryTurn],
    ) -> impl Future<Output = String> + Send;
}

/// The command-surface collaborator: a routing table from recognized
/// intents to handlers. Handlers may enqueue playback items themselves;
/// the returned text, if any, is spoken as the confirmation.
pub trait CommandSurface: Send + Sync + 'static {
    fn dispatch(
        &self,
        guild: GuildId,
        user: UserId,
        intent: CommandIntent,
    ) -> impl Future<Output = Option<String>> + Send;
}

impl<T: Brain + ?Sized> Brain for Arc<T> {
    fn respond(
        &self,
        transcript: &str,
        context: &[HistoryTurn],
    ) -> impl Future<Output = String> + Send {
        (**self).respond(transcript, context)
    }
}

impl<T: CommandSurface + ?Sized> CommandSurface for Arc<T> {
    fn dispatch(
        &self,
        guild: GuildId,
        user: UserId,
        intent: CommandIntent,
    ) -> impl Future<Output = Option<String>> + Send {
        (**self).dispatch(guild, user, intent)
    }
}

/// Ties wake detection, sessions, moderation, command dispatch, and reply
/// synthesis together for every finished transcript.
pub struct IntentRouter<P, B, C> {
    platform: Arc<P>,
    brain: B,
    commands: C,
    sessions: SessionTracker,
    moderation: Arc<ModerationEngine>,
    synthesis: SynthesisGateway,
    history: TurnHistory,
    log: Arc<EventLog>,
    prompt_debounce: Duration,
}

impl<P, B, C> IntentRouter<P, B, C>
where
    P: VoicePlatform,
    B: Brain,
    C: CommandSurface,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: Arc<P>,
        brain: B,
        commands: C,
        moderation: Arc<ModerationEngine>,
        synthesis: SynthesisGateway,
        log: Arc<EventLog>,
        session_ttl: Duration,
        prompt_debounce: Option<Duration>,
    ) -> Self {
        Self {
            platform,
            brain,
            commands,
            sessions: SessionTracker::with_ttl(session_ttl),
            moderation,
            synthesis,
            history: TurnHistory::new(),
            log,
            prompt_debounce: prompt_debounce.unwrap_or(DEFAULT_PROMPT_DEBOUNCE),
        }
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub fn moderation(&self) -> &ModerationEngine {
        &self.moderation
    }

    /// Routes one finished transcript for one speaker.
    ///
    /// A wake miss is a silent no-op. Failures further down resolve to
    /// "drop this turn" at worst; nothing here propagates.
    pub async fn handle_transcript(&self, state: &GuildState, user: UserId, transcript: &str) {
        let key = SpeakerKey::new(state.guild, user);
        let awaiting = self.sessions.awaiting(key);
        let session_active = self.sessions.get(key).is_some();

        // Alias-free continuation only inside an active session, and only
        // for slot answers or engagement-not-required profiles. A session
        // is only ever opened by an explicit wake; there is no trigger-less
        // cold listening.
        let outcome = if session_active
            && (awaiting.is_some() || !state.profile.engagement_required)
        {
            self.sessions.extend(key);
            WakeOutcome::continuation(transcript)
        } else {
            let outcome = detect(transcript, &state.profile);
            if !outcome.wake {
                tracing::trace!(%key, ?outcome.reason, "transcript dropped, no wake");
                return;
            }
            self.sessions.wake(key);
            self.emit(
                state.guild,
                key,
                &EventPayload::WakeDetected {
                    speaker: user.to_string(),
                    alias: outcome.alias.clone(),
                    confidence: outcome.confidence,
                },
            );
            self.emit(
                state.guild,
                key,
                &EventPayload::SessionOpened {
                    speaker: user.to_string(),
                },
            );
            outcome
        };

        // Moderation sees the full transcript, not just the remainder.
        let review = self
            .moderation
            .review(key, state.status_channel, transcript, &state.policy);
        if review.violated() {
            self.apply_moderation(state, user, &review).await;
            if !review.verdict.soft {
                return; // hard violations never get a reply
            }
        }

        let content = outcome.remainder.clone().unwrap_or_default();

        // A pending slot consumes the utterance before intent matching.
        if let Some(slot) = awaiting {
            if !content.is_empty() {
                self.sessions.set_awaiting(key, None);
                let intent = fill_slot(&slot, &content);
                let confirmation = self.commands.dispatch(state.guild, user, intent).await;
                if let Some(text) = confirmation {
                    self.speak(state, &text).await;
                }
                // Slot filled: the window has served its purpose.
                self.sessions.clear(key);
                return;
            }
        }

        if let Some(intent) = parse_fast_path(&content) {
            self.dispatch_intent(state, key, intent).await;
            return;
        }

        // Conversational fallback. An empty remainder ("hey vesper") hands
        // the brain the original utterance.
        let prompt = if content.is_empty() {
            transcript
        } else {
            content.as_str()
        };
        let context = self.history.context(key);
        let reply = self.brain.respond(prompt, &context).await;
        self.history.record(key, TurnRole::Speaker, prompt);
        self.history.record(key, TurnRole::Agent, &reply);
        self.speak(state, &reply).await;
    }

    async fn dispatch_intent(&self, state: &GuildState, key: SpeakerKey, intent: CommandIntent) {
        match intent {
            CommandIntent::Say(text) => {
                self.speak(state, &text).await;
            }
            CommandIntent::TestTone => {
                self.speak(state, "here comes the test tone").await;
                let tone = PlaybackItem::Pcm(Arc::new(test_tone(TONE_FREQ_HZ, TONE_DURATION_MS)));
                if let Err(e) = state.playback.enqueue(tone) {
                    tracing::warn!(error = %e, "failed to enqueue test tone");
                }
            }
            CommandIntent::Weather(None) => {
                // Missing location: ask once, debounced, and remember what
                // we are waiting for.
                if self.sessions.should_prompt_again(key, self.prompt_debounce) {
                    self.sessions
                        .set_awaiting(key, Some(AwaitingSlot::WeatherLocation));
                    self.emit(
                        state.guild,
                        key,
                        &EventPayload::SlotPrompted {
                            speaker: key.user.to_string(),
                            slot: AwaitingSlot::WeatherLocation.label().to_string(),
                        },
                    );
                    self.speak(state, "which city should I check?").await;
                }
            }
            other => {
                let label = other.label();
                let confirmation = self.commands.dispatch(state.guild, key.user, other).await;
                match confirmation {
                    Some(text) => self.speak(state, &text).await,
                    None => tracing::debug!(intent = label, "handler produced no confirmation"),
                }
            }
        }
    }

    /// Executes planned enforcement and posts notices. Every step is
    /// permission-checked and failure-isolated: a denied or failed action
    /// is logged and recorded, never propagated.
    async fn apply_moderation(
        &self,
        state: &GuildState,
        user: UserId,
        review: &ModerationOutcome,
    ) {
        let key = SpeakerKey::new(state.guild, user);

        if let Some(channel) = state.status_channel {
            let name = self.platform.display_name(state.guild, user).await;
            let reason = review
                .verdict
                .reason
                .map(|r| r.as_str())
                .unwrap_or("violation");
            let notice = if review.verdict.soft {
                format!("heads up: flagged {reason} from {name}")
            } else {
                format!("moderation: {reason} from {name}, strike recorded")
            };
            if let Err(e) = self.platform.send_notice(channel, &notice).await {
                tracing::warn!(error = %e, "failed to post moderation notice");
            }
        }

        for action in &review.actions {
            if !self.platform.can_enforce(state.guild, *action).await {
                self.emit(
                    state.guild,
                    key,
                    &EventPayload::EnforcementDenied {
                        user: user.to_string(),
                        action: action.as_str().to_string(),
                        reason: "missing permission".to_string(),
                    },
                );
                self.notify_enforcement_failure(state, *action).await;
                continue;
            }

            let result = match action {
                EnforcementAction::Timeout => {
                    let duration = Duration::from_secs(state.policy.timeout_secs);
                    self.platform
                        .timeout_member(state.guild, user, duration)
                        .await
                }
                EnforcementAction::Kick => self.platform.kick_member(state.guild, user).await,
                EnforcementAction::Ban => self.platform.ban_member(state.guild, user).await,
            };

            match result {
                Ok(()) => {
                    self.emit(
                        state.guild,
                        key,
                        &EventPayload::EnforcementApplied {
                            user: user.to_string(),
                            action: action.as_str().to_string(),
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(%user, action = action.as_str(), error = %e, "enforcement failed");
                    self.emit(
                        state.guild,
                        key,
                        &EventPayload::EnforcementDenied {
                            user: user.to_string(),
                            action: action.as_str().to_string(),
                            reason: e.to_string(),
                        },
                    );
                    self.notify_enforcement_failure(state, *action).await;
                }
            }
        }
    }

    async fn notify_enforcement_failure(&self, state: &GuildState, action: EnforcementAction) {
        if let Some(channel) = state.status_channel {
            let notice = format!("could not apply {action}: missing rights or platform error");
            if let Err(e) = self.platform.send_notice(channel, &notice).await {
                tracing::warn!(error = %e, "failed to post enforcement notice");
            }
        }
    }

    /// Synthesizes and enqueues one reply. Synthesis failure degrades to
    /// silence.
    async fn speak(&self, state: &GuildState, text: &str) {
        match self.synthesis.synthesize(text).await {
            Some(clip) => {
                if let Err(e) = state.playback.enqueue(PlaybackItem::Pcm(clip)) {
                    tracing::warn!(error = %e, "failed to enqueue reply");
                }
            }
            None => {
                tracing::warn!(guild = %state.guild, "synthesis failed, dropping reply");
            }
        }
    }

    fn emit(&self, guild: GuildId, key: SpeakerKey, payload: &EventPayload) {
        if let Err(e) = self.log.emit(guild, &key.user.to_string(), payload) {
            tracing::error!(error = %e, "failed to record router event");
        }
    }
}

fn fill_slot(slot: &AwaitingSlot, answer: &str) -> CommandIntent {
    match slot {
        AwaitingSlot::WeatherLocation => CommandIntent::Weather(Some(answer.to_string())),
    }
}
