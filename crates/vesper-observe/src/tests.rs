use crate::{EventDomain, EventFilter, EventLog, EventPayload};
use vesper_types::GuildId;

fn capture_started(speaker: &str) -> EventPayload {
    EventPayload::CaptureStarted {
        speaker: speaker.to_string(),
    }
}

#[test]
fn emit_assigns_monotonic_per_guild_sequences() {
    let log = EventLog::new();
    let g1 = GuildId(1);
    let g2 = GuildId(2);

    let a = log.emit(g1, "10", &capture_started("10")).unwrap();
    let b = log.emit(g1, "11", &capture_started("11")).unwrap();
    let c = log.emit(g2, "10", &capture_started("10")).unwrap();

    assert_eq!(a.seq, 1);
    assert_eq!(b.seq, 2);
    assert_eq!(c.seq, 1, "sequences are per guild, not global");
}

#[test]
fn payload_metadata_is_derived() {
    let log = EventLog::new();
    let event = log
        .emit(
            GuildId(1),
            "42",
            &EventPayload::ViolationDetected {
                user: "42".to_string(),
                reason: "threat".to_string(),
                weight: 2,
                soft: false,
            },
        )
        .unwrap();

    assert_eq!(event.domain, "MODERATION");
    assert_eq!(event.event_type, "VIOLATION_DETECTED");
    assert_eq!(event.entity_type, "moderation");
    assert!(event.payload_json.contains("\"threat\""));
}

#[test]
fn query_filters_by_domain_and_type() {
    let log = EventLog::new();
    let guild = GuildId(1);

    log.emit(guild, "10", &capture_started("10")).unwrap();
    log.emit(
        guild,
        "10",
        &EventPayload::PlaybackStarted {
            kind: "speech".to_string(),
        },
    )
    .unwrap();
    log.emit(
        guild,
        "10",
        &EventPayload::PlaybackInterrupted {
            by: "11".to_string(),
            dropped: 2,
        },
    )
    .unwrap();

    let playback = log.query(
        guild,
        &EventFilter {
            domain: Some(EventDomain::Playback),
            ..Default::default()
        },
    );
    assert_eq!(playback.len(), 2);

    let interrupted = log.query(
        guild,
        &EventFilter {
            event_type: Some("PLAYBACK_INTERRUPTED".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(interrupted.len(), 1);
    assert_eq!(interrupted[0].seq, 3);
}

#[test]
fn query_after_seq_is_a_cursor() {
    let log = EventLog::new();
    let guild = GuildId(1);
    for i in 0..5 {
        log.emit(guild, &i.to_string(), &capture_started(&i.to_string()))
            .unwrap();
    }

    let tail = log.query(
        guild,
        &EventFilter {
            after_seq: Some(3),
            ..Default::default()
        },
    );
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].seq, 4);
    assert_eq!(tail[1].seq, 5);
}

#[test]
fn query_does_not_cross_guilds() {
    let log = EventLog::new();
    log.emit(GuildId(1), "10", &capture_started("10")).unwrap();
    log.emit(GuildId(2), "10", &capture_started("10")).unwrap();

    let events = log.query(GuildId(1), &EventFilter::default());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].guild, GuildId(1));
}

#[test]
fn ring_evicts_oldest_at_capacity() {
    let log = EventLog::with_capacity(3);
    let guild = GuildId(1);
    for i in 0..5 {
        log.emit(guild, &i.to_string(), &capture_started(&i.to_string()))
            .unwrap();
    }

    assert_eq!(log.len(), 3);
    let events = log.query(guild, &EventFilter::default());
    assert_eq!(events[0].seq, 3, "oldest records are evicted first");
    assert_eq!(events[2].seq, 5);
}

#[test]
fn domain_round_trip() {
    for domain in [
        EventDomain::Capture,
        EventDomain::Transcription,
        EventDomain::Session,
        EventDomain::Moderation,
        EventDomain::Playback,
    ] {
        let parsed: EventDomain = domain.as_str().parse().unwrap();
        assert_eq!(parsed, domain);
    }
    assert!("VIDEO".parse::<EventDomain>().is_err());
}
