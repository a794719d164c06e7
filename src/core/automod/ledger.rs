// User violation ledger - transient per (guild, user) tracking state.
//
// Holds the rolling recent-message window the spam/repeat rules read, and
// the accumulated warning counters the escalation policy is keyed on.
// Deliberately NOT durable: restart clears it, which is fine because the
// windows are seconds long and warnings expire after an hour anyway.

use super::automod_models::MessageRecord;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Composite key: users exist independently per guild.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct GuildUserKey {
    guild_id: u64,
    user_id: u64,
}

#[derive(Debug, Default)]
struct LedgerEntry {
    recent: VecDeque<MessageRecord>,
    warning_count: u32,
}

/// In-memory ledger of recent messages and warning counts.
///
/// DashMap gives us per-entry locking, so concurrent evaluations of
/// different (guild, user) pairs never contend. A single entry's updates
/// are serialized by the entry guard, so increments cannot be lost.
pub struct UserLedger {
    entries: DashMap<GuildUserKey, LedgerEntry>,
}

impl UserLedger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Append a message to the user's rolling window and prune everything
    /// older than `window` relative to `now`. Returns the pruned window.
    pub fn record_message(
        &self,
        guild_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
        content: &str,
        window: Duration,
    ) -> Vec<MessageRecord> {
        let key = GuildUserKey { guild_id, user_id };
        let mut entry = self.entries.entry(key).or_default();

        entry.recent.push_back(MessageRecord {
            timestamp: now,
            content: content.to_string(),
        });

        let cutoff = now - ChronoDuration::seconds(window.as_secs() as i64);
        while entry
            .recent
            .front()
            .is_some_and(|r| r.timestamp < cutoff)
        {
            entry.recent.pop_front();
        }

        entry.recent.iter().cloned().collect()
    }

    /// Snapshot of the user's window, pruned to `window` as of `now`.
    #[allow(dead_code)]
    pub fn recent_messages(
        &self,
        guild_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Vec<MessageRecord> {
        let key = GuildUserKey { guild_id, user_id };
        let Some(mut entry) = self.entries.get_mut(&key) else {
            return Vec::new();
        };

        let cutoff = now - ChronoDuration::seconds(window.as_secs() as i64);
        while entry
            .recent
            .front()
            .is_some_and(|r| r.timestamp < cutoff)
        {
            entry.recent.pop_front();
        }

        entry.recent.iter().cloned().collect()
    }

    /// Bump the user's warning counter. Returns the new total.
    pub fn increment_warning(&self, guild_id: u64, user_id: u64) -> u32 {
        let key = GuildUserKey { guild_id, user_id };
        let mut entry = self.entries.entry(key).or_default();
        entry.warning_count += 1;
        entry.warning_count
    }

    pub fn warning_count(&self, guild_id: u64, user_id: u64) -> u32 {
        let key = GuildUserKey { guild_id, user_id };
        self.entries
            .get(&key)
            .map(|e| e.warning_count)
            .unwrap_or(0)
    }

    /// Set the counter back to exactly 0 (admin override or timer expiry).
    pub fn reset_warnings(&self, guild_id: u64, user_id: u64) {
        let key = GuildUserKey { guild_id, user_id };
        if let Some(mut entry) = self.entries.get_mut(&key) {
            entry.warning_count = 0;
        }
    }

    /// Schedule a deferred reset of the user's counter.
    ///
    /// Fire-and-forget: each violation schedules its own timer and the last
    /// write wins. An earlier timer may zero a count that a later violation
    /// bumped; that imprecision is accepted, since the later violation
    /// already took effect before its own timer was scheduled.
    pub fn reset_after(self: &Arc<Self>, guild_id: u64, user_id: u64, delay: Duration) {
        let ledger = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            ledger.reset_warnings(guild_id, user_id);
            tracing::debug!(guild_id, user_id, "warning counter expired");
        });
    }
}

impl Default for UserLedger {
    fn default() -> Self {
        Self::new()
    }
}
