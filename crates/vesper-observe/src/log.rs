//! The bounded in-memory event log.
//!
//! All writes go through [`EventLog::emit`], which serialises the payload,
//! assigns a per-guild monotonically increasing sequence number, appends to
//! the ring, and mirrors the event to a `tracing` line. When the ring is
//! full the oldest record is evicted; the external sink is expected to
//! drain faster than the pipeline produces.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::Utc;
use vesper_types::GuildId;

use crate::error::ObserveError;
use crate::event::{EventDomain, EventPayload, VoiceEvent};

/// Default ring capacity. Sized for roughly an hour of busy-guild activity.
const DEFAULT_CAPACITY: usize = 4096;

/// Filter criteria for querying the event log.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by event domain.
    pub domain: Option<EventDomain>,
    /// Filter by event type string.
    pub event_type: Option<String>,
    /// Filter by entity ID.
    pub entity_id: Option<String>,
    /// Return events with a sequence number strictly greater than this.
    pub after_seq: Option<u64>,
    /// Maximum number of events to return (default: 100).
    pub limit: Option<usize>,
}

struct LogInner {
    ring: VecDeque<VoiceEvent>,
    next_seq: HashMap<GuildId, u64>,
}

/// Concurrency-safe, bounded, in-memory event log.
pub struct EventLog {
    capacity: usize,
    inner: Mutex<LogInner>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(LogInner {
                ring: VecDeque::new(),
                next_seq: HashMap::new(),
            }),
        }
    }

    /// Records a single event.
    ///
    /// The caller supplies the guild, the entity ID, and a structured
    /// payload; domain, event type, and entity type are derived from the
    /// payload. A per-guild sequence number is assigned under the same lock
    /// as the append, so sequence order always matches ring order.
    ///
    /// # Errors
    ///
    /// Returns `ObserveError::Serialization` if the payload cannot be
    /// serialised.
    pub fn emit(
        &self,
        guild: GuildId,
        entity_id: &str,
        payload: &EventPayload,
    ) -> Result<VoiceEvent, ObserveError> {
        let payload_json = serde_json::to_string(payload)?;
        let domain = payload.domain();

        let event = {
            let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let seq_slot = inner.next_seq.entry(guild).or_insert(0);
            *seq_slot += 1;
            let seq = *seq_slot;

            let event = VoiceEvent {
                guild,
                domain: domain.as_str().to_string(),
                event_type: payload.event_type().to_string(),
                entity_type: payload.entity_type().to_string(),
                entity_id: entity_id.to_string(),
                seq,
                payload_json,
                occurred_at: Utc::now().to_rfc3339(),
            };

            if inner.ring.len() == self.capacity {
                inner.ring.pop_front();
            }
            inner.ring.push_back(event.clone());
            event
        };

        tracing::info!(
            target: "vesper::events",
            guild = %guild,
            domain = %domain,
            event = event.event_type.as_str(),
            entity = entity_id,
            seq = event.seq,
            "voice event"
        );

        Ok(event)
    }

    /// Queries the log with optional filters.
    ///
    /// Results are returned in sequence order (oldest first), bounded by
    /// `filter.limit` (default 100). Use `filter.after_seq` for cursor-based
    /// draining by an external sink.
    pub fn query(&self, guild: GuildId, filter: &EventFilter) -> Vec<VoiceEvent> {
        let limit = filter.limit.unwrap_or(100);
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .ring
            .iter()
            .filter(|e| e.guild == guild)
            .filter(|e| match filter.domain {
                Some(d) => e.domain == d.as_str(),
                None => true,
            })
            .filter(|e| match &filter.event_type {
                Some(t) => &e.event_type == t,
                None => true,
            })
            .filter(|e| match &filter.entity_id {
                Some(id) => &e.entity_id == id,
                None => true,
            })
            .filter(|e| match filter.after_seq {
                Some(seq) => e.seq > seq,
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Current number of records held, across all guilds.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner).ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
