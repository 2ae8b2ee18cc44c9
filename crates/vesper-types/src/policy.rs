//! Per-guild moderation and wake policy.
//!
//! All the optional knobs the configuration surface exposes are collected
//! into one validated struct, resolved once when a guild's state is created
//! rather than re-derived from raw environment lookups on every call.

use crate::{ChannelId, UserId};
use serde::{Deserialize, Serialize};

/// Strike counts at which escalating enforcement actions fire.
///
/// Thresholds are compared against the weighted, time-decayed strike count;
/// crossing a threshold from below triggers the corresponding action once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikeThresholds {
    /// Count at which the user is temporarily muted.
    pub timeout: u32,
    /// Count at which the user is removed from the guild.
    pub kick: u32,
    /// Count at which the user is banned.
    pub ban: u32,
}

impl Default for StrikeThresholds {
    fn default() -> Self {
        Self {
            timeout: 3,
            kick: 5,
            ban: 8,
        }
    }
}

/// Defines the operational policy of one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildPolicy {
    /// Whether the moderation engine runs at all.
    pub moderation_enabled: bool,
    /// Channels where the intent scorer applies its relaxed-context offset.
    #[serde(default)]
    pub relaxed_channels: Vec<ChannelId>,
    /// Channels the scanner skips entirely.
    #[serde(default)]
    pub exempt_channels: Vec<ChannelId>,
    /// Users the scanner skips entirely.
    #[serde(default)]
    pub exempt_users: Vec<UserId>,
    /// Escalation thresholds.
    #[serde(default)]
    pub strike_thresholds: StrikeThresholds,
    /// Duration of a timeout enforcement, in seconds.
    pub timeout_secs: u64,
    /// Hours after which one unit of strike weight decays.
    pub strike_decay_hours: u64,
    /// Whether violating text is deleted from the bound channel.
    pub delete_violations: bool,
}

impl Default for GuildPolicy {
    fn default() -> Self {
        Self {
            moderation_enabled: true,
            relaxed_channels: Vec::new(),
            exempt_channels: Vec::new(),
            exempt_users: Vec::new(),
            strike_thresholds: StrikeThresholds::default(),
            timeout_secs: 600,
            strike_decay_hours: 24,
            delete_violations: false,
        }
    }
}

impl GuildPolicy {
    pub fn is_relaxed_channel(&self, channel: ChannelId) -> bool {
        self.relaxed_channels.contains(&channel)
    }

    pub fn is_exempt(&self, channel: Option<ChannelId>, user: UserId) -> bool {
        if self.exempt_users.contains(&user) {
            return true;
        }
        match channel {
            Some(c) => self.exempt_channels.contains(&c),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let policy = GuildPolicy::default();
        assert!(policy.moderation_enabled);
        assert!(policy.relaxed_channels.is_empty());
        assert_eq!(policy.strike_thresholds.timeout, 3);
        assert_eq!(policy.strike_thresholds.kick, 5);
        assert_eq!(policy.strike_thresholds.ban, 8);
        assert_eq!(policy.timeout_secs, 600);
        assert_eq!(policy.strike_decay_hours, 24);
        assert!(!policy.delete_violations);
    }

    #[test]
    fn exemptions() {
        let policy = GuildPolicy {
            exempt_channels: vec![ChannelId(10)],
            exempt_users: vec![UserId(5)],
            ..GuildPolicy::default()
        };
        assert!(policy.is_exempt(Some(ChannelId(10)), UserId(1)));
        assert!(policy.is_exempt(None, UserId(5)));
        assert!(!policy.is_exempt(Some(ChannelId(11)), UserId(1)));
    }

    #[test]
    fn serialization_round_trip() {
        let policy = GuildPolicy::default();
        let json = serde_json::to_string(&policy).expect("should serialize");
        let decoded: GuildPolicy = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(policy, decoded);
    }
}
