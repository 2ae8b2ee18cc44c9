//! The moderation engine: scanner + ledgers + event records.
//!
//! `review` is the single entry point the router calls per transcript. It
//! is synchronous and infallible from the caller's point of view: scan
//! failures do not exist, and event-log write failures are logged and
//! swallowed so a moderation hiccup can never drop a speaker's turn for
//! anyone else.

use std::sync::Arc;
use std::time::Duration;

use vesper_observe::{EventLog, EventPayload};
use vesper_types::{ChannelId, GuildPolicy, SpeakerKey};

use crate::ledger::{plan_escalation, EnforcementAction, LockdownRegistry, StrikeLedger};
use crate::scanner::{ScanContext, ScanVerdict, Scanner};

/// What the router should do with a reviewed transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationOutcome {
    pub verdict: ScanVerdict,
    /// Decayed strike count after this review, for hard violations.
    pub strike_count: Option<u32>,
    /// Enforcement actions to execute, in escalation order.
    pub actions: Vec<EnforcementAction>,
    /// Whether the collaborator should delete the violating text, when the
    /// transcript was mirrored to a text surface.
    pub delete_text: bool,
}

impl ModerationOutcome {
    fn clean() -> Self {
        Self {
            verdict: ScanVerdict {
                violated: false,
                reason: None,
                weight: 0,
                soft: false,
            },
            strike_count: None,
            actions: Vec::new(),
            delete_text: false,
        }
    }

    pub fn violated(&self) -> bool {
        self.verdict.violated
    }
}

/// Process-lifetime moderation state shared across all guild activity.
pub struct ModerationEngine {
    scanner: Scanner,
    ledger: StrikeLedger,
    lockdowns: LockdownRegistry,
    log: Arc<EventLog>,
}

impl ModerationEngine {
    pub fn new(scanner: Scanner, log: Arc<EventLog>) -> Self {
        Self {
            scanner,
            ledger: StrikeLedger::new(),
            lockdowns: LockdownRegistry::new(),
            log,
        }
    }

    pub fn lockdowns(&self) -> &LockdownRegistry {
        &self.lockdowns
    }

    pub fn ledger(&self) -> &StrikeLedger {
        &self.ledger
    }

    /// Reviews one transcript under the guild's policy.
    ///
    /// Exempt channels/users and a disabled engine short-circuit to clean.
    /// Hard violations accrue decayed strike weight and may plan
    /// escalation; soft violations only produce a log record.
    pub fn review(
        &self,
        key: SpeakerKey,
        channel: Option<ChannelId>,
        text: &str,
        policy: &GuildPolicy,
    ) -> ModerationOutcome {
        if !policy.moderation_enabled || policy.is_exempt(channel, key.user) {
            return ModerationOutcome::clean();
        }

        let ctx = ScanContext {
            relaxed_channel: channel.is_some_and(|c| policy.is_relaxed_channel(c)),
            lockdown: self.lockdowns.active(key),
        };
        let verdict = self.scanner.scan(text, &ctx);
        if !verdict.violated {
            return ModerationOutcome::clean();
        }

        let reason = verdict
            .reason
            .map(|r| r.as_str().to_string())
            .unwrap_or_default();
        self.emit(
            key,
            &EventPayload::ViolationDetected {
                user: key.user.to_string(),
                reason: reason.clone(),
                weight: verdict.weight,
                soft: verdict.soft,
            },
        );

        if verdict.soft {
            tracing::info!(user = %key.user, reason, "soft violation, no strike");
            return ModerationOutcome {
                verdict,
                strike_count: None,
                actions: Vec::new(),
                delete_text: policy.delete_violations,
            };
        }

        let decay = Duration::from_secs(policy.strike_decay_hours * 3600);
        let previous = self.ledger.current(key, decay);
        let count = self.ledger.record(key, verdict.weight, decay);
        self.emit(
            key,
            &EventPayload::StrikeRecorded {
                user: key.user.to_string(),
                count,
            },
        );

        let actions = plan_escalation(previous, count, &policy.strike_thresholds);
        tracing::warn!(
            user = %key.user,
            reason,
            count,
            actions = actions.len(),
            "hard violation recorded"
        );

        ModerationOutcome {
            verdict,
            strike_count: Some(count),
            actions,
            delete_text: policy.delete_violations,
        }
    }

    fn emit(&self, key: SpeakerKey, payload: &EventPayload) {
        if let Err(e) = self.log.emit(key.guild, &key.user.to_string(), payload) {
            tracing::error!(error = %e, "failed to record moderation event");
        }
    }
}
