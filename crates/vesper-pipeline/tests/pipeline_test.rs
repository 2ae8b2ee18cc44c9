//! End-to-end pipeline behavior against a scripted fake platform.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use vesper_moderation::EnforcementAction;
use vesper_observe::{EventFilter, EventLog};
use vesper_pipeline::config::PipelineConfig;
use vesper_pipeline::history::HistoryTurn;
use vesper_pipeline::intents::CommandIntent;
use vesper_pipeline::platform::PlatformError;
use vesper_pipeline::{
    Brain, CommandSurface, PlaybackItem, PlaybackQueue, SpeakerEvent, VoicePipeline, VoicePlatform,
};
use vesper_types::{AudioClip, ChannelId, GuildId, SpeakerKey, UserId, PLATFORM_SAMPLE_RATE};

/// Everything the fake platform was asked to do, in order.
#[derive(Default)]
struct Recorder {
    played: Mutex<Vec<String>>,
    stops: AtomicUsize,
    timeouts: Mutex<Vec<UserId>>,
    kicks: Mutex<Vec<UserId>>,
    bans: Mutex<Vec<UserId>>,
    notices: Mutex<Vec<String>>,
}

struct FakePlatform {
    rec: Arc<Recorder>,
    /// Wall-clock length of one played item.
    play_ms: u64,
    allow_enforcement: AtomicBool,
    interrupts: Mutex<HashMap<GuildId, Arc<Notify>>>,
}

impl FakePlatform {
    fn new(play_ms: u64) -> (Arc<Self>, Arc<Recorder>) {
        let rec = Arc::new(Recorder::default());
        let platform = Arc::new(Self {
            rec: Arc::clone(&rec),
            play_ms,
            allow_enforcement: AtomicBool::new(true),
            interrupts: Mutex::new(HashMap::new()),
        });
        (platform, rec)
    }

    fn notify_for(&self, guild: GuildId) -> Arc<Notify> {
        let mut map = self.interrupts.lock().unwrap();
        Arc::clone(map.entry(guild).or_default())
    }
}

fn item_label(item: &PlaybackItem) -> String {
    match item {
        PlaybackItem::Pcm(clip) => clip.samples.len().to_string(),
        PlaybackItem::Resource(bytes) => format!("res:{}", bytes.len()),
    }
}

impl VoicePlatform for FakePlatform {
    fn decode_frame(&self, payload: &[u8]) -> Result<Vec<i16>, PlatformError> {
        if payload.is_empty() {
            return Err(PlatformError::Decode("empty frame".to_string()));
        }
        // One frame byte expands to 10ms of interleaved stereo.
        Ok(vec![payload[0] as i16; 960])
    }

    async fn play(&self, guild: GuildId, item: PlaybackItem) -> Result<(), PlatformError> {
        let label = item_label(&item);
        let notify = self.notify_for(guild);
        self.rec.played.lock().unwrap().push(format!("start:{label}"));
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(self.play_ms)) => {
                self.rec.played.lock().unwrap().push(format!("end:{label}"));
            }
            _ = notify.notified() => {}
        }
        Ok(())
    }

    fn stop(&self, guild: GuildId) {
        self.rec.stops.fetch_add(1, Ordering::SeqCst);
        self.notify_for(guild).notify_waiters();
    }

    async fn display_name(&self, _guild: GuildId, user: UserId) -> String {
        format!("member-{user}")
    }

    async fn can_enforce(&self, _guild: GuildId, _action: EnforcementAction) -> bool {
        self.allow_enforcement.load(Ordering::SeqCst)
    }

    async fn timeout_member(
        &self,
        _guild: GuildId,
        user: UserId,
        _duration: Duration,
    ) -> Result<(), PlatformError> {
        self.rec.timeouts.lock().unwrap().push(user);
        Ok(())
    }

    async fn kick_member(&self, _guild: GuildId, user: UserId) -> Result<(), PlatformError> {
        self.rec.kicks.lock().unwrap().push(user);
        Ok(())
    }

    async fn ban_member(&self, _guild: GuildId, user: UserId) -> Result<(), PlatformError> {
        self.rec.bans.lock().unwrap().push(user);
        Ok(())
    }

    async fn send_notice(&self, _channel: ChannelId, text: &str) -> Result<(), PlatformError> {
        self.rec.notices.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct FakeBrain {
    prompts: Mutex<Vec<String>>,
}

impl Brain for FakeBrain {
    async fn respond(&self, transcript: &str, _context: &[HistoryTurn]) -> String {
        self.prompts.lock().unwrap().push(transcript.to_string());
        format!("echo {transcript}")
    }
}

#[derive(Default)]
struct FakeCommands {
    dispatched: Mutex<Vec<CommandIntent>>,
}

impl CommandSurface for FakeCommands {
    async fn dispatch(
        &self,
        _guild: GuildId,
        _user: UserId,
        intent: CommandIntent,
    ) -> Option<String> {
        let label = intent.label().to_string();
        self.dispatched.lock().unwrap().push(intent);
        Some(format!("done {label}"))
    }
}

struct Harness {
    pipeline: VoicePipeline<FakePlatform, Arc<FakeBrain>, Arc<FakeCommands>>,
    rec: Arc<Recorder>,
    platform: Arc<FakePlatform>,
    brain: Arc<FakeBrain>,
    commands: Arc<FakeCommands>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness(play_ms: u64) -> Harness {
    init_tracing();
    let (platform, rec) = FakePlatform::new(play_ms);
    let brain = Arc::new(FakeBrain::default());
    let commands = Arc::new(FakeCommands::default());
    let pipeline = VoicePipeline::new(
        Arc::clone(&platform),
        Arc::clone(&brain),
        Arc::clone(&commands),
        PipelineConfig::default(),
    )
    .expect("pipeline assembles");
    Harness {
        pipeline,
        rec,
        platform,
        brain,
        commands,
    }
}

const GUILD: GuildId = GuildId(1);
const SPEAKER: UserId = UserId(10);

fn clip(samples: usize) -> PlaybackItem {
    PlaybackItem::Pcm(Arc::new(AudioClip::new(vec![1; samples], PLATFORM_SAMPLE_RATE)))
}

async fn count_events(log: &EventLog, guild: GuildId, event_type: &str) -> usize {
    log.query(
        guild,
        &EventFilter {
            event_type: Some(event_type.to_string()),
            ..Default::default()
        },
    )
    .len()
}

/// Polls until at least one event of `event_type` exists or a second
/// passes.
async fn wait_for_event(log: &EventLog, guild: GuildId, event_type: &str) -> bool {
    for _ in 0..100 {
        if count_events(log, guild, event_type).await > 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// ── Playback ─────────────────────────────────────────────────────────

#[tokio::test]
async fn playback_is_fifo_per_guild() {
    let (platform, rec) = FakePlatform::new(30);
    let log = Arc::new(EventLog::new());
    let queue = PlaybackQueue::spawn(platform, GUILD, log);

    queue.enqueue(clip(100)).unwrap();
    queue.enqueue(clip(200)).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let played = rec.played.lock().unwrap().clone();
    assert_eq!(
        played,
        vec!["start:100", "end:100", "start:200", "end:200"],
        "A plays to completion before B begins"
    );
}

#[tokio::test]
async fn interruption_stops_player_and_clears_queue() {
    let (platform, rec) = FakePlatform::new(500);
    let log = Arc::new(EventLog::new());
    let queue = PlaybackQueue::spawn(platform, GUILD, Arc::clone(&log));

    queue.enqueue(clip(100)).unwrap();
    queue.enqueue(clip(200)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    queue.interrupt(SPEAKER).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let played = rec.played.lock().unwrap().clone();
    assert_eq!(played, vec!["start:100"], "second item never starts");
    assert_eq!(rec.stops.load(Ordering::SeqCst), 1);
    assert!(wait_for_event(&log, GUILD, "PLAYBACK_INTERRUPTED").await);

    // Queue is empty and the player idle: a fresh item plays immediately.
    queue.enqueue(clip(300)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let played = rec.played.lock().unwrap().clone();
    assert!(played.contains(&"start:300".to_string()));
}

#[tokio::test]
async fn interrupt_when_idle_is_a_noop() {
    let (platform, rec) = FakePlatform::new(30);
    let log = Arc::new(EventLog::new());
    let queue = PlaybackQueue::spawn(platform, GUILD, Arc::clone(&log));

    queue.interrupt(SPEAKER).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(rec.stops.load(Ordering::SeqCst), 0);
    assert_eq!(count_events(&log, GUILD, "PLAYBACK_INTERRUPTED").await, 0);
    assert!(rec.played.lock().unwrap().is_empty());
}

#[tokio::test]
async fn speaking_start_interrupts_playback() {
    let h = harness(500);
    let state = h.pipeline.connect(GUILD, None).await;

    state.playback.enqueue(clip(100)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    h.pipeline
        .handle_event(GUILD, SpeakerEvent::SpeakingStart { user: SPEAKER })
        .await
        .unwrap();

    assert!(wait_for_event(h.pipeline.events(), GUILD, "PLAYBACK_INTERRUPTED").await);
    assert_eq!(h.rec.stops.load(Ordering::SeqCst), 1);
}

// ── Capture ──────────────────────────────────────────────────────────

#[tokio::test]
async fn short_capture_is_discarded_without_transcription() {
    let h = harness(10);
    h.pipeline.connect(GUILD, None).await;

    h.pipeline
        .handle_event(GUILD, SpeakerEvent::SpeakingStart { user: SPEAKER })
        .await
        .unwrap();
    // One frame = 10ms of audio, far below the 500ms minimum.
    h.pipeline
        .handle_event(
            GUILD,
            SpeakerEvent::AudioFrame {
                user: SPEAKER,
                payload: vec![7],
            },
        )
        .await
        .unwrap();
    h.pipeline
        .handle_event(GUILD, SpeakerEvent::SpeakingEnd { user: SPEAKER })
        .await
        .unwrap();

    assert!(wait_for_event(h.pipeline.events(), GUILD, "CAPTURE_DISCARDED").await);
    // Transcription was never attempted.
    assert_eq!(count_events(h.pipeline.events(), GUILD, "TRANSCRIPT_READY").await, 0);
    assert_eq!(
        count_events(h.pipeline.events(), GUILD, "TRANSCRIPTION_FAILED").await,
        0
    );
}

#[tokio::test]
async fn long_capture_reaches_transcription() {
    let h = harness(10);
    h.pipeline.connect(GUILD, None).await;

    h.pipeline
        .handle_event(GUILD, SpeakerEvent::SpeakingStart { user: SPEAKER })
        .await
        .unwrap();
    for _ in 0..60 {
        h.pipeline
            .handle_event(
                GUILD,
                SpeakerEvent::AudioFrame {
                    user: SPEAKER,
                    payload: vec![4],
                },
            )
            .await
            .unwrap();
    }
    h.pipeline
        .handle_event(GUILD, SpeakerEvent::SpeakingEnd { user: SPEAKER })
        .await
        .unwrap();

    assert!(wait_for_event(h.pipeline.events(), GUILD, "CAPTURE_FINISHED").await);
    // No provider is configured, so the gateway degrades to a silent drop
    // and records the failure.
    assert!(wait_for_event(h.pipeline.events(), GUILD, "TRANSCRIPTION_FAILED").await);
}

#[tokio::test]
async fn reentrant_speaking_start_opens_one_capture() {
    let h = harness(10);
    h.pipeline.connect(GUILD, None).await;

    for _ in 0..3 {
        h.pipeline
            .handle_event(GUILD, SpeakerEvent::SpeakingStart { user: SPEAKER })
            .await
            .unwrap();
    }

    assert!(wait_for_event(h.pipeline.events(), GUILD, "CAPTURE_STARTED").await);
    assert_eq!(count_events(h.pipeline.events(), GUILD, "CAPTURE_STARTED").await, 1);
}

#[tokio::test]
async fn unconnected_guild_is_an_explicit_error() {
    let h = harness(10);
    let result = h
        .pipeline
        .handle_event(GuildId(999), SpeakerEvent::SpeakingStart { user: SPEAKER })
        .await;
    assert!(matches!(
        result,
        Err(vesper_pipeline::PipelineError::NotConnected(GuildId(999)))
    ));
}

// ── Routing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn wake_miss_is_a_silent_noop() {
    let h = harness(10);
    let state = h.pipeline.connect(GUILD, None).await;

    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "completely unrelated sentence")
        .await;

    assert!(h.brain.prompts.lock().unwrap().is_empty());
    assert!(h.commands.dispatched.lock().unwrap().is_empty());
    assert_eq!(count_events(h.pipeline.events(), GUILD, "WAKE_DETECTED").await, 0);
}

#[tokio::test]
async fn wake_opens_session_and_falls_through_to_brain() {
    let h = harness(10);
    let state = h.pipeline.connect(GUILD, None).await;

    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "hey vesper how are you")
        .await;

    assert_eq!(count_events(h.pipeline.events(), GUILD, "WAKE_DETECTED").await, 1);
    assert_eq!(count_events(h.pipeline.events(), GUILD, "SESSION_OPENED").await, 1);
    assert_eq!(
        h.brain.prompts.lock().unwrap().clone(),
        vec!["how are you".to_string()],
        "brain receives the remainder, not the alias"
    );

    let key = SpeakerKey::new(GUILD, SPEAKER);
    assert!(h.pipeline.router().sessions().get(key).is_some());
}

#[tokio::test]
async fn fast_path_dispatches_to_command_surface() {
    let h = harness(10);
    let state = h.pipeline.connect(GUILD, None).await;

    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "vesper play some jazz")
        .await;

    let dispatched = h.commands.dispatched.lock().unwrap().clone();
    assert_eq!(dispatched, vec![CommandIntent::Play(Some("some jazz".to_string()))]);
    assert!(h.brain.prompts.lock().unwrap().is_empty(), "fast path skips the brain");
}

#[tokio::test]
async fn weather_slot_prompt_and_fill() {
    let h = harness(10);
    let state = h.pipeline.connect(GUILD, None).await;
    let key = SpeakerKey::new(GUILD, SPEAKER);

    // Missing location: the router asks and remembers what it asked.
    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "hey vesper weather")
        .await;
    assert_eq!(count_events(h.pipeline.events(), GUILD, "SLOT_PROMPTED").await, 1);
    assert!(h.pipeline.router().sessions().awaiting(key).is_some());
    assert!(h.commands.dispatched.lock().unwrap().is_empty());

    // The bare answer, inside the session, fills the slot without an alias.
    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "tokyo")
        .await;

    let dispatched = h.commands.dispatched.lock().unwrap().clone();
    assert_eq!(
        dispatched,
        vec![CommandIntent::Weather(Some("tokyo".to_string()))]
    );
    // Slot filled: the session was cleared.
    assert!(h.pipeline.router().sessions().get(key).is_none());
}

#[tokio::test]
async fn hard_violation_enforces_and_drops_the_reply() {
    let h = harness(10);
    let state = h.pipeline.connect(GUILD, Some(ChannelId(5))).await;

    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "vesper I will hurt you at school tomorrow")
        .await;

    // Default thresholds: weight 3 crosses the timeout threshold.
    assert_eq!(h.rec.timeouts.lock().unwrap().clone(), vec![SPEAKER]);
    assert!(h.brain.prompts.lock().unwrap().is_empty(), "no reply for violations");
    assert!(wait_for_event(h.pipeline.events(), GUILD, "VIOLATION_DETECTED").await);
    assert!(wait_for_event(h.pipeline.events(), GUILD, "ENFORCEMENT_APPLIED").await);

    // The bound channel got both the connected notice and the moderation
    // notice.
    let notices = h.rec.notices.lock().unwrap().clone();
    assert!(notices.iter().any(|n| n == "connected"));
    assert!(notices.iter().any(|n| n.contains("threat")));
}

#[tokio::test]
async fn missing_permission_is_recorded_never_propagated() {
    let h = harness(10);
    h.platform.allow_enforcement.store(false, Ordering::SeqCst);
    let state = h.pipeline.connect(GUILD, Some(ChannelId(5))).await;

    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "vesper I will hurt you at school tomorrow")
        .await;

    assert!(h.rec.timeouts.lock().unwrap().is_empty());
    assert!(wait_for_event(h.pipeline.events(), GUILD, "ENFORCEMENT_DENIED").await);
    let notices = h.rec.notices.lock().unwrap().clone();
    assert!(notices.iter().any(|n| n.contains("could not apply")));
}

#[tokio::test]
async fn session_continuation_respects_engagement_flag() {
    // Default profile requires engagement: a plain follow-up without the
    // alias and without a pending slot is dropped even inside the window.
    let h = harness(10);
    let state = h.pipeline.connect(GUILD, None).await;

    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "hey vesper how are you")
        .await;
    h.pipeline
        .router()
        .handle_transcript(&state, SPEAKER, "and another thing")
        .await;

    assert_eq!(
        h.brain.prompts.lock().unwrap().clone(),
        vec!["how are you".to_string()],
        "follow-up without alias needs engagement_required = false"
    );
}
