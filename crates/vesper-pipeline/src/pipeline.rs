//! The assembled pipeline.
//!
//! `VoicePipeline` wires the guild registry, capture managers, speech
//! gateways, moderation engine, and router together, and exposes the two
//! entry points the platform embedder drives: `connect`/`disconnect` for
//! guild lifecycle and `handle_event` for the per-speaker audio
//! subscription stream.

use std::sync::Arc;
use std::time::Duration;

use vesper_moderation::{ModerationEngine, Scanner};
use vesper_observe::{EventLog, EventPayload};
use vesper_speech::{
    HttpStt, HttpTts, ProcessStt, ProcessTts, SpeechConfig, SttBackend, SynthesisGateway,
    TranscriptionGateway, TtsBackend,
};
use vesper_types::{ChannelId, GuildId, GuildPolicy, WakeProfile};

use crate::capture::{CaptureConfig, CaptureOutcome, FinishedCapture};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::guild::{GuildRegistry, GuildState};
use crate::platform::{SpeakerEvent, VoicePlatform};
use crate::router::{Brain, CommandSurface, IntentRouter};

/// Command verbs added to the transcription phrase-boost hints alongside
/// the wake aliases.
const COMMAND_VERBS: &[&str] = &["play", "pause", "skip", "say", "weather", "beep"];

/// The fully assembled voice pipeline for one process.
pub struct VoicePipeline<P, B, C> {
    platform: Arc<P>,
    registry: GuildRegistry,
    router: Arc<IntentRouter<P, B, C>>,
    transcription: Arc<TranscriptionGateway>,
    log: Arc<EventLog>,
    profile: WakeProfile,
    policy: GuildPolicy,
    capture: CaptureConfig,
}

impl<P, B, C> VoicePipeline<P, B, C>
where
    P: VoicePlatform,
    B: Brain,
    C: CommandSurface,
{
    /// Assembles the pipeline from configuration.
    pub fn new(
        platform: Arc<P>,
        brain: B,
        commands: C,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let log = Arc::new(EventLog::new());
        let moderation = Arc::new(ModerationEngine::new(Scanner::new()?, Arc::clone(&log)));

        let profile = config.wake.to_profile();
        let mut hints = profile.aliases.clone();
        hints.extend(COMMAND_VERBS.iter().map(|v| v.to_string()));

        let transcription = Arc::new(build_transcription(&config.speech, hints));
        let synthesis = build_synthesis(&config.speech);

        let router = Arc::new(IntentRouter::new(
            Arc::clone(&platform),
            brain,
            commands,
            moderation,
            synthesis,
            Arc::clone(&log),
            Duration::from_secs(config.session.ttl_secs),
            Some(Duration::from_secs(config.session.prompt_debounce_secs)),
        ));

        Ok(Self {
            platform,
            registry: GuildRegistry::new(),
            router,
            transcription,
            log,
            profile,
            policy: config.policy,
            capture: config.capture,
        })
    }

    /// Registers a guild connection and posts the "connected" notice when a
    /// status channel is bound.
    pub async fn connect(
        &self,
        guild: GuildId,
        status_channel: Option<ChannelId>,
    ) -> Arc<GuildState> {
        let state = self.registry.connect(
            Arc::clone(&self.platform),
            Arc::clone(&self.log),
            guild,
            self.profile.clone(),
            self.policy.clone(),
            self.capture,
            status_channel,
        );
        if let Some(channel) = status_channel {
            if let Err(e) = self.platform.send_notice(channel, "connected").await {
                tracing::warn!(%guild, error = %e, "failed to post connected notice");
            }
        }
        state
    }

    pub fn disconnect(&self, guild: GuildId) -> Result<(), PipelineError> {
        self.registry.disconnect(guild)
    }

    /// Feeds one event from a guild's audio subscription into the
    /// pipeline.
    ///
    /// Returns `NotConnected` for guilds without an established
    /// connection. Everything after capture hand-off runs on its own task,
    /// so one speaker's transcription latency never stalls another's
    /// frames.
    pub async fn handle_event(
        &self,
        guild: GuildId,
        event: SpeakerEvent,
    ) -> Result<(), PipelineError> {
        let state = self.registry.get(guild)?;

        match event {
            SpeakerEvent::SpeakingStart { user } => {
                // The human always has priority over a pending reply.
                let _ = state.playback.interrupt(user);

                let began = state.with_captures(|c| c.begin(user));
                if began {
                    self.emit(guild, &user.to_string(), &EventPayload::CaptureStarted {
                        speaker: user.to_string(),
                    });
                }
            }
            SpeakerEvent::AudioFrame { user, payload } => {
                // A forced finish here means the hard duration cap fired.
                if let Some(finished) = state.with_captures(|c| c.push_frame(user, payload)) {
                    self.process_capture(Arc::clone(&state), finished);
                }
            }
            SpeakerEvent::SpeakingEnd { user } => {
                if let Some(finished) = state.with_captures(|c| c.end(user)) {
                    self.process_capture(Arc::clone(&state), finished);
                }
            }
        }
        Ok(())
    }

    /// Decode → minimum-duration gate → transcription → routing, on a
    /// dedicated task per finished capture.
    fn process_capture(&self, state: Arc<GuildState>, finished: FinishedCapture) {
        let platform = Arc::clone(&self.platform);
        let transcription = Arc::clone(&self.transcription);
        let router = Arc::clone(&self.router);
        let log = Arc::clone(&self.log);
        let min_capture_ms = self.capture.min_capture_ms;

        tokio::spawn(async move {
            let guild = state.guild;
            let user = finished.user;
            let capture_id = finished.id;

            let clip = match finished.decode(platform.as_ref(), min_capture_ms) {
                Err(e) => {
                    tracing::warn!(%guild, %user, %capture_id, error = %e, "capture decode failed");
                    return;
                }
                Ok(CaptureOutcome::Discarded { duration_ms }) => {
                    emit(&log, guild, &user.to_string(), &EventPayload::CaptureDiscarded {
                        speaker: user.to_string(),
                        duration_ms,
                    });
                    return;
                }
                Ok(CaptureOutcome::Handoff(clip)) => {
                    emit(&log, guild, &user.to_string(), &EventPayload::CaptureFinished {
                        speaker: user.to_string(),
                        duration_ms: clip.duration_ms(),
                    });
                    clip
                }
            };

            match transcription.transcribe(&clip).await {
                None => {
                    emit(&log, guild, &user.to_string(), &EventPayload::TranscriptionFailed {
                        speaker: user.to_string(),
                    });
                }
                Some(text) => {
                    emit(&log, guild, &user.to_string(), &EventPayload::TranscriptReady {
                        speaker: user.to_string(),
                        text: text.clone(),
                    });
                    router.handle_transcript(&state, user, &text).await;
                }
            }
        });
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.log
    }

    pub fn router(&self) -> &Arc<IntentRouter<P, B, C>> {
        &self.router
    }

    pub fn registry(&self) -> &GuildRegistry {
        &self.registry
    }

    fn emit(&self, guild: GuildId, entity: &str, payload: &EventPayload) {
        emit(&self.log, guild, entity, payload);
    }
}

fn emit(log: &EventLog, guild: GuildId, entity: &str, payload: &EventPayload) {
    if let Err(e) = log.emit(guild, entity, payload) {
        tracing::error!(error = %e, "failed to record pipeline event");
    }
}

/// Builds the primary/fallback transcription chain from configuration: the
/// vendor HTTP recognizer first when configured, the local subprocess as
/// the fallback (or as primary when it is the only one configured).
fn build_transcription(speech: &SpeechConfig, hints: Vec<String>) -> TranscriptionGateway {
    let http = (!speech.stt.endpoint.is_empty())
        .then(|| SttBackend::Http(HttpStt::new(&speech.stt.endpoint, &speech.stt.api_key)));
    let process = (!speech.stt.binary_path.is_empty()).then(|| {
        SttBackend::Process(ProcessStt::new(
            &speech.stt.model_path,
            &speech.stt.binary_path,
        ))
    });

    match (http, process) {
        (Some(primary), fallback) => TranscriptionGateway::new(primary, fallback, hints),
        (None, Some(primary)) => TranscriptionGateway::new(primary, None, hints),
        (None, None) => {
            tracing::warn!("no transcription provider configured; every turn will drop");
            TranscriptionGateway::new(
                SttBackend::Process(ProcessStt::new("", "")),
                None,
                hints,
            )
        }
    }
}

fn build_synthesis(speech: &SpeechConfig) -> SynthesisGateway {
    let backend = if !speech.tts.endpoint.is_empty() {
        TtsBackend::Http(HttpTts::new(&speech.tts.endpoint, &speech.tts.api_key))
    } else {
        if speech.tts.binary_path.is_empty() {
            tracing::warn!("no synthesis provider configured; replies will be silent");
        }
        TtsBackend::Process(ProcessTts::new(&speech.tts.binary_path))
    };
    SynthesisGateway::new(backend, &speech.tts.voice)
}
