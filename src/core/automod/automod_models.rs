// Auto-moderation domain models - data structures for the rule engine.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts these to Discord-specific actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One category of rule violation a message can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Too many messages inside the spam window
    Spam,
    /// More user/role mentions than the guild limit
    MassMention,
    /// @everyone/@here without the mention-everyone permission
    EveryoneMention,
    /// Uppercase ratio above the guild threshold
    Caps,
    /// Link to a host outside the allowed domains
    Link,
    /// Message contains a banned word
    BadWord,
    /// Three identical messages in a row
    Repeat,
    /// More than the fixed emoji limit in one message
    EmojiSpam,
    /// Discord invite link without manage-guild permission
    Invite,
}

impl ViolationKind {
    /// Fixed severity weight used to bucket a violation set.
    pub fn weight(self) -> u32 {
        match self {
            ViolationKind::Spam => 2,
            ViolationKind::MassMention => 3,
            ViolationKind::EveryoneMention => 4,
            ViolationKind::Caps => 1,
            ViolationKind::Link => 3,
            ViolationKind::BadWord => 2,
            ViolationKind::Repeat => 2,
            ViolationKind::EmojiSpam => 1,
            ViolationKind::Invite => 4,
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ViolationKind::Spam => "spam",
            ViolationKind::MassMention => "mass mention",
            ViolationKind::EveryoneMention => "everyone mention",
            ViolationKind::Caps => "caps",
            ViolationKind::Link => "link",
            ViolationKind::BadWord => "bad word",
            ViolationKind::Repeat => "repeat",
            ViolationKind::EmojiSpam => "emoji spam",
            ViolationKind::Invite => "invite",
        };
        write!(f, "{}", name)
    }
}

/// A single triggered violation, produced by one evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Human-readable reason shown in the warning notice
    pub reason: String,
    /// Extra detail (which limit, which domain, ...)
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, reason: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            detail: detail.into(),
        }
    }
}

/// Coarse classification of a violation set. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Sum the fixed per-kind weights and bucket the total.
    pub fn of(violations: &[Violation]) -> Self {
        let total: u32 = violations.iter().map(|v| v.kind.weight()).sum();
        if total >= 5 {
            Severity::High
        } else if total >= 3 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Enforcement step the Discord layer should apply, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum EnforcementAction {
    /// Delete the offending message
    DeleteMessage,
    /// Notify the author (DM first, channel fallback)
    Warn { warning_count: u32 },
    /// Apply a Discord timeout
    Timeout { duration: Duration, reason: String },
    /// Kick the author from the guild
    Kick { reason: String },
}

/// Immutable snapshot of one inbound message at evaluation time.
///
/// Built once by the Discord adapter; the core never touches serenity types.
#[derive(Debug, Clone)]
pub struct MessageSnapshot {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// User mentions + role mentions
    pub mention_count: u32,
    pub is_bot: bool,
    pub is_admin: bool,
    pub can_mention_everyone: bool,
    pub can_manage_guild: bool,
}

/// Result of evaluating one message.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Whether the message should be suppressed from further processing
    pub suppress: bool,
    pub violations: Vec<Violation>,
    pub severity: Severity,
    /// Accumulated warning count after this violation (0 if clean)
    pub warning_count: u32,
    /// Enforcement steps for the Discord layer, in application order
    pub actions: Vec<EnforcementAction>,
}

impl CheckOutcome {
    /// A clean message - nothing triggered, nothing to do.
    pub fn clean() -> Self {
        Self {
            suppress: false,
            violations: Vec::new(),
            severity: Severity::Low,
            warning_count: 0,
            actions: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_spam_limit() -> u32 {
    5
}

fn default_spam_window_secs() -> u64 {
    5
}

fn default_mention_limit() -> u32 {
    5
}

fn default_caps_threshold() -> f64 {
    0.7
}

/// Per-guild auto-moderation configuration.
///
/// Every field carries a serde default so a missing or malformed value in
/// the stored document falls back instead of aborting evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoModConfig {
    /// Master switch for the whole rule engine
    #[serde(default = "default_true")]
    pub enabled: bool,

    // Per-rule toggles
    #[serde(default = "default_true")]
    pub anti_spam: bool,
    #[serde(default = "default_true")]
    pub anti_mentions: bool,
    #[serde(default = "default_true")]
    pub anti_caps: bool,
    /// Link filtering is opt-in, unlike the other rules
    #[serde(default)]
    pub anti_links: bool,
    #[serde(default = "default_true")]
    pub anti_bad_words: bool,
    #[serde(default = "default_true")]
    pub anti_repeat: bool,
    #[serde(default = "default_true")]
    pub anti_emoji_spam: bool,
    #[serde(default = "default_true")]
    pub anti_invites: bool,

    // Thresholds
    #[serde(default = "default_spam_limit")]
    pub spam_limit: u32,
    #[serde(default = "default_spam_window_secs")]
    pub spam_window_secs: u64,
    #[serde(default = "default_mention_limit")]
    pub mention_limit: u32,
    /// Exclusive: a message is flagged only when its ratio is strictly above
    #[serde(default = "default_caps_threshold")]
    pub caps_threshold: f64,
    /// Guild-specific hosts allowed in addition to the built-in safe list
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    // Enforcement toggles
    #[serde(default = "default_true")]
    pub delete_message: bool,
    #[serde(default = "default_true")]
    pub send_warning: bool,
    #[serde(default = "default_true")]
    pub mute_on_repeat: bool,
    /// Kick at 5 warnings is opt-in
    #[serde(default)]
    pub kick_on_repeat: bool,
}

impl Default for AutoModConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            anti_spam: true,
            anti_mentions: true,
            anti_caps: true,
            anti_links: false,
            anti_bad_words: true,
            anti_repeat: true,
            anti_emoji_spam: true,
            anti_invites: true,
            spam_limit: 5,
            spam_window_secs: 5,
            mention_limit: 5,
            caps_threshold: 0.7,
            allowed_domains: Vec::new(),
            delete_message: true,
            send_warning: true,
            mute_on_repeat: true,
            kick_on_repeat: false,
        }
    }
}

/// One tracked message in a user's rolling ledger window.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// One persisted moderation-log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModLogEntry {
    pub user_id: u64,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
    pub violations: Vec<ViolationKind>,
    /// First 200 characters of the offending message
    pub message_excerpt: String,
    pub warning_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(kind: ViolationKind) -> Violation {
        Violation::new(kind, "r", "d")
    }

    #[test]
    fn severity_buckets_by_summed_weights() {
        // caps alone = 1 -> low
        assert_eq!(Severity::of(&[v(ViolationKind::Caps)]), Severity::Low);
        // mass mention = 3 -> medium
        assert_eq!(
            Severity::of(&[v(ViolationKind::MassMention)]),
            Severity::Medium
        );
        // invite = 4, plus caps = 5 -> high
        assert_eq!(
            Severity::of(&[v(ViolationKind::Invite), v(ViolationKind::Caps)]),
            Severity::High
        );
        // everyone mention alone = 4 -> medium
        assert_eq!(
            Severity::of(&[v(ViolationKind::EveryoneMention)]),
            Severity::Medium
        );
    }

    #[test]
    fn config_defaults_survive_partial_documents() {
        // Only one field present; everything else should fall back.
        let cfg: AutoModConfig = serde_json::from_str(r#"{"spam_limit": 9}"#).unwrap();
        assert_eq!(cfg.spam_limit, 9);
        assert!(cfg.enabled);
        assert!(!cfg.anti_links);
        assert!((cfg.caps_threshold - 0.7).abs() < f64::EPSILON);
        assert!(!cfg.kick_on_repeat);
    }
}
