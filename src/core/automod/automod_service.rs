// Auto-moderation service - aggregates rule evaluators and owns escalation.
//
// This service handles:
// - Running the enabled evaluators over each inbound message, in fixed order
// - Severity classification of the triggered violations
// - Warning-count escalation (delete/warn -> timeout -> kick)
// - The bounded, write-through moderation log
//
// NO Discord dependencies here - just pure domain logic. Enforcement comes
// back to the caller as a list of actions to apply.

use super::automod_models::{
    AutoModConfig, CheckOutcome, EnforcementAction, MessageSnapshot, ModLogEntry, Severity,
    Violation,
};
use super::evaluators;
use super::ledger::UserLedger;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Warning counters expire this long after the violation that bumped them.
const WARNING_RESET_SECS: u64 = 3600;

/// Warnings needed before a timeout is applied.
const MUTE_THRESHOLD: u32 = 3;

/// Warnings needed before a kick is applied (opt-in).
const KICK_THRESHOLD: u32 = 5;

/// Timeout length applied at the mute threshold.
const MUTE_DURATION: Duration = Duration::from_secs(30 * 60);

/// Moderation log entries retained per guild; oldest evicted first.
const LOG_CAPACITY: usize = 100;

/// Logged message excerpts are capped at this many characters.
const EXCERPT_CHARS: usize = 200;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AutoModError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Persistence port for per-guild moderation state.
///
/// Missing guilds yield defaults (empty lists, default config); the store
/// never fails evaluation over an absent key.
#[async_trait]
pub trait AutoModStore: Send + Sync {
    /// Load the guild config, falling back to defaults when absent.
    async fn get_config(&self, guild_id: u64) -> Result<AutoModConfig, AutoModError>;

    /// Persist the guild config (write-through).
    async fn save_config(&self, guild_id: u64, config: AutoModConfig) -> Result<(), AutoModError>;

    /// Load the guild's banned-word list (lowercase entries).
    async fn get_bad_words(&self, guild_id: u64) -> Result<Vec<String>, AutoModError>;

    /// Persist the guild's banned-word list.
    async fn save_bad_words(&self, guild_id: u64, words: Vec<String>) -> Result<(), AutoModError>;

    /// Load the guild's moderation log, oldest first.
    async fn get_mod_log(&self, guild_id: u64) -> Result<Vec<ModLogEntry>, AutoModError>;

    /// Persist the guild's moderation log.
    async fn save_mod_log(
        &self,
        guild_id: u64,
        entries: Vec<ModLogEntry>,
    ) -> Result<(), AutoModError>;
}

// ============================================================================
// CONFIG MUTATION HELPERS
// ============================================================================

/// The enumerated rule categories an admin can toggle.
///
/// A fixed schema on purpose: unknown parameter names cannot exist, unlike
/// free-form "set key value" configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    Spam,
    Mentions,
    Caps,
    Links,
    BadWords,
    Repeat,
    EmojiSpam,
    Invites,
}

/// The enumerated enforcement steps an admin can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementToggle {
    Delete,
    Warn,
    Mute,
    Kick,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The violation aggregator and escalation policy.
pub struct AutoModService<S: AutoModStore> {
    store: S,
    ledger: Arc<UserLedger>,
}

impl<S: AutoModStore> AutoModService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ledger: Arc::new(UserLedger::new()),
        }
    }

    /// Evaluate one inbound message against the guild's enabled rules.
    ///
    /// The single entry point invoked per message. Returns whether the
    /// message should be suppressed from normal command processing, plus
    /// the enforcement actions the adapter should apply.
    pub async fn evaluate(&self, msg: &MessageSnapshot) -> Result<CheckOutcome, AutoModError> {
        // Admins and bots bypass every rule, once, before anything runs.
        if msg.is_bot || msg.is_admin {
            return Ok(CheckOutcome::clean());
        }

        let config = self.store.get_config(msg.guild_id).await?;
        if !config.enabled {
            return Ok(CheckOutcome::clean());
        }

        // Track the message regardless of which rules are enabled, so the
        // repeat rule still sees history when the spam rule is toggled off.
        let window = Duration::from_secs(config.spam_window_secs);
        let recent = self.ledger.record_message(
            msg.guild_id,
            msg.author_id,
            msg.timestamp,
            &msg.content,
            window,
        );

        let mut violations: Vec<Violation> = Vec::new();

        if config.anti_spam {
            violations.extend(evaluators::check_spam(&recent, &config));
        }
        if config.anti_mentions {
            violations.extend(evaluators::check_mentions(msg, &config));
        }
        if config.anti_caps {
            violations.extend(evaluators::check_caps(msg, &config));
        }
        if config.anti_links {
            violations.extend(evaluators::check_links(msg, &config));
        }
        if config.anti_bad_words {
            let words = self.store.get_bad_words(msg.guild_id).await?;
            violations.extend(evaluators::check_bad_words(msg, &words));
        }
        if config.anti_repeat {
            violations.extend(evaluators::check_repeat(&recent));
        }
        if config.anti_emoji_spam {
            violations.extend(evaluators::check_emoji_spam(msg));
        }
        if config.anti_invites {
            violations.extend(evaluators::check_invites(msg));
        }

        if violations.is_empty() {
            return Ok(CheckOutcome::clean());
        }

        let severity = Severity::of(&violations);
        let warning_count = self.ledger.increment_warning(msg.guild_id, msg.author_id);

        self.append_log(msg, &violations, warning_count).await?;

        tracing::info!(
            guild_id = msg.guild_id,
            user_id = msg.author_id,
            user = %msg.author_name,
            warning_count,
            severity = %severity,
            violations = ?violations.iter().map(|v| v.kind).collect::<Vec<_>>(),
            "auto-moderation violation"
        );

        let actions = Self::plan_actions(&config, warning_count);

        // Each violation schedules its own expiry; last writer wins.
        self.ledger.reset_after(
            msg.guild_id,
            msg.author_id,
            Duration::from_secs(WARNING_RESET_SECS),
        );

        Ok(CheckOutcome {
            suppress: true,
            violations,
            severity,
            warning_count,
            actions,
        })
    }

    /// Map the accumulated warning count to enforcement steps.
    ///
    /// Tiers are cumulative and keyed on the current total, so re-invoking
    /// with the same count re-emits the same actions (no deduplication).
    fn plan_actions(config: &AutoModConfig, warning_count: u32) -> Vec<EnforcementAction> {
        let mut actions = Vec::new();

        if config.delete_message {
            actions.push(EnforcementAction::DeleteMessage);
        }
        if config.send_warning {
            actions.push(EnforcementAction::Warn { warning_count });
        }
        if warning_count >= MUTE_THRESHOLD && config.mute_on_repeat {
            actions.push(EnforcementAction::Timeout {
                duration: MUTE_DURATION,
                reason: format!("{} auto-moderation warnings", MUTE_THRESHOLD),
            });
        }
        if warning_count >= KICK_THRESHOLD && config.kick_on_repeat {
            actions.push(EnforcementAction::Kick {
                reason: format!("{} auto-moderation warnings", KICK_THRESHOLD),
            });
        }

        actions
    }

    /// Append to the guild's bounded log and write it through the store.
    async fn append_log(
        &self,
        msg: &MessageSnapshot,
        violations: &[Violation],
        warning_count: u32,
    ) -> Result<(), AutoModError> {
        let mut entries = self.store.get_mod_log(msg.guild_id).await?;

        entries.push(ModLogEntry {
            user_id: msg.author_id,
            user_name: msg.author_name.clone(),
            timestamp: msg.timestamp,
            violations: violations.iter().map(|v| v.kind).collect(),
            message_excerpt: msg.content.chars().take(EXCERPT_CHARS).collect(),
            warning_count,
        });

        if entries.len() > LOG_CAPACITY {
            let excess = entries.len() - LOG_CAPACITY;
            entries.drain(..excess);
        }

        self.store.save_mod_log(msg.guild_id, entries).await
    }

    /// Last `n` log entries, oldest first.
    pub async fn recent_log(&self, guild_id: u64, n: usize) -> Result<Vec<ModLogEntry>, AutoModError> {
        let entries = self.store.get_mod_log(guild_id).await?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.into_iter().skip(skip).collect())
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub async fn get_config(&self, guild_id: u64) -> Result<AutoModConfig, AutoModError> {
        self.store.get_config(guild_id).await
    }

    pub async fn set_config(&self, guild_id: u64, config: AutoModConfig) -> Result<(), AutoModError> {
        self.store.save_config(guild_id, config).await
    }

    /// Flip the master switch for a guild.
    pub async fn set_enabled(&self, guild_id: u64, enabled: bool) -> Result<(), AutoModError> {
        let mut config = self.store.get_config(guild_id).await?;
        config.enabled = enabled;
        self.store.save_config(guild_id, config).await
    }

    /// Toggle one rule category.
    pub async fn set_rule_enabled(
        &self,
        guild_id: u64,
        rule: RuleCategory,
        enabled: bool,
    ) -> Result<(), AutoModError> {
        let mut config = self.store.get_config(guild_id).await?;
        match rule {
            RuleCategory::Spam => config.anti_spam = enabled,
            RuleCategory::Mentions => config.anti_mentions = enabled,
            RuleCategory::Caps => config.anti_caps = enabled,
            RuleCategory::Links => config.anti_links = enabled,
            RuleCategory::BadWords => config.anti_bad_words = enabled,
            RuleCategory::Repeat => config.anti_repeat = enabled,
            RuleCategory::EmojiSpam => config.anti_emoji_spam = enabled,
            RuleCategory::Invites => config.anti_invites = enabled,
        }
        self.store.save_config(guild_id, config).await
    }

    /// Toggle one enforcement step.
    pub async fn set_action_enabled(
        &self,
        guild_id: u64,
        action: EnforcementToggle,
        enabled: bool,
    ) -> Result<(), AutoModError> {
        let mut config = self.store.get_config(guild_id).await?;
        match action {
            EnforcementToggle::Delete => config.delete_message = enabled,
            EnforcementToggle::Warn => config.send_warning = enabled,
            EnforcementToggle::Mute => config.mute_on_repeat = enabled,
            EnforcementToggle::Kick => config.kick_on_repeat = enabled,
        }
        self.store.save_config(guild_id, config).await
    }

    pub async fn set_spam_limit(&self, guild_id: u64, limit: u32) -> Result<(), AutoModError> {
        if limit == 0 {
            return Err(AutoModError::Config("spam limit must be at least 1".into()));
        }
        let mut config = self.store.get_config(guild_id).await?;
        config.spam_limit = limit;
        self.store.save_config(guild_id, config).await
    }

    pub async fn set_spam_window(&self, guild_id: u64, secs: u64) -> Result<(), AutoModError> {
        if secs == 0 {
            return Err(AutoModError::Config("spam window must be at least 1 second".into()));
        }
        let mut config = self.store.get_config(guild_id).await?;
        config.spam_window_secs = secs;
        self.store.save_config(guild_id, config).await
    }

    pub async fn set_mention_limit(&self, guild_id: u64, limit: u32) -> Result<(), AutoModError> {
        if limit == 0 {
            return Err(AutoModError::Config("mention limit must be at least 1".into()));
        }
        let mut config = self.store.get_config(guild_id).await?;
        config.mention_limit = limit;
        self.store.save_config(guild_id, config).await
    }

    pub async fn set_caps_threshold(&self, guild_id: u64, threshold: f64) -> Result<(), AutoModError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AutoModError::Config(
                "caps threshold must be between 0.0 and 1.0".into(),
            ));
        }
        let mut config = self.store.get_config(guild_id).await?;
        config.caps_threshold = threshold;
        self.store.save_config(guild_id, config).await
    }

    /// Allow a host for the link rule. Returns false if already present.
    pub async fn add_allowed_domain(
        &self,
        guild_id: u64,
        domain: &str,
    ) -> Result<bool, AutoModError> {
        let domain = domain.trim().to_lowercase();
        let mut config = self.store.get_config(guild_id).await?;
        if config.allowed_domains.contains(&domain) {
            return Ok(false);
        }
        config.allowed_domains.push(domain);
        self.store.save_config(guild_id, config).await?;
        Ok(true)
    }

    /// Remove an allowed host. Returns false if it was not present.
    pub async fn remove_allowed_domain(
        &self,
        guild_id: u64,
        domain: &str,
    ) -> Result<bool, AutoModError> {
        let domain = domain.trim().to_lowercase();
        let mut config = self.store.get_config(guild_id).await?;
        let before = config.allowed_domains.len();
        config.allowed_domains.retain(|d| d != &domain);
        if config.allowed_domains.len() == before {
            return Ok(false);
        }
        self.store.save_config(guild_id, config).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Banned words
    // ------------------------------------------------------------------

    /// Add a word to the guild blacklist. Returns false if already listed.
    pub async fn add_bad_word(&self, guild_id: u64, word: &str) -> Result<bool, AutoModError> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Err(AutoModError::Config("banned word cannot be empty".into()));
        }
        let mut words = self.store.get_bad_words(guild_id).await?;
        if words.contains(&word) {
            return Ok(false);
        }
        words.push(word);
        self.store.save_bad_words(guild_id, words).await?;
        Ok(true)
    }

    /// Remove a word from the blacklist. Existing log entries are untouched.
    pub async fn remove_bad_word(&self, guild_id: u64, word: &str) -> Result<bool, AutoModError> {
        let word = word.trim().to_lowercase();
        let mut words = self.store.get_bad_words(guild_id).await?;
        let before = words.len();
        words.retain(|w| w != &word);
        if words.len() == before {
            return Ok(false);
        }
        self.store.save_bad_words(guild_id, words).await?;
        Ok(true)
    }

    pub async fn bad_words(&self, guild_id: u64) -> Result<Vec<String>, AutoModError> {
        self.store.get_bad_words(guild_id).await
    }

    // ------------------------------------------------------------------
    // Warnings
    // ------------------------------------------------------------------

    pub fn warning_count(&self, guild_id: u64, user_id: u64) -> u32 {
        self.ledger.warning_count(guild_id, user_id)
    }

    /// Admin override: set a user's counter back to 0.
    pub fn reset_warnings(&self, guild_id: u64, user_id: u64) {
        self.ledger.reset_warnings(guild_id, user_id);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::automod::automod_models::ViolationKind;
    use chrono::{Duration as ChronoDuration, Utc};
    use dashmap::DashMap;

    /// In-memory store for testing
    struct MockStore {
        configs: DashMap<u64, AutoModConfig>,
        bad_words: DashMap<u64, Vec<String>>,
        logs: DashMap<u64, Vec<ModLogEntry>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                configs: DashMap::new(),
                bad_words: DashMap::new(),
                logs: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl AutoModStore for MockStore {
        async fn get_config(&self, guild_id: u64) -> Result<AutoModConfig, AutoModError> {
            Ok(self
                .configs
                .get(&guild_id)
                .map(|c| c.clone())
                .unwrap_or_default())
        }

        async fn save_config(
            &self,
            guild_id: u64,
            config: AutoModConfig,
        ) -> Result<(), AutoModError> {
            self.configs.insert(guild_id, config);
            Ok(())
        }

        async fn get_bad_words(&self, guild_id: u64) -> Result<Vec<String>, AutoModError> {
            Ok(self
                .bad_words
                .get(&guild_id)
                .map(|w| w.clone())
                .unwrap_or_default())
        }

        async fn save_bad_words(
            &self,
            guild_id: u64,
            words: Vec<String>,
        ) -> Result<(), AutoModError> {
            self.bad_words.insert(guild_id, words);
            Ok(())
        }

        async fn get_mod_log(&self, guild_id: u64) -> Result<Vec<ModLogEntry>, AutoModError> {
            Ok(self
                .logs
                .get(&guild_id)
                .map(|l| l.clone())
                .unwrap_or_default())
        }

        async fn save_mod_log(
            &self,
            guild_id: u64,
            entries: Vec<ModLogEntry>,
        ) -> Result<(), AutoModError> {
            self.logs.insert(guild_id, entries);
            Ok(())
        }
    }

    const GUILD: u64 = 10;
    const USER: u64 = 20;

    fn message(content: &str) -> MessageSnapshot {
        MessageSnapshot {
            guild_id: GUILD,
            channel_id: 1,
            message_id: 2,
            author_id: USER,
            author_name: "offender".to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            mention_count: 0,
            is_bot: false,
            is_admin: false,
            can_mention_everyone: false,
            can_manage_guild: false,
        }
    }

    #[tokio::test]
    async fn admins_and_bots_bypass_all_rules() {
        let service = AutoModService::new(MockStore::new());
        service.add_bad_word(GUILD, "test").await.unwrap();

        let mut admin = message("this is a TEST @everyone SPAM SPAM SPAM");
        admin.is_admin = true;
        admin.mention_count = 50;
        let outcome = service.evaluate(&admin).await.unwrap();
        assert!(!outcome.suppress);
        assert!(outcome.violations.is_empty());

        let mut bot = admin.clone();
        bot.is_admin = false;
        bot.is_bot = true;
        let outcome = service.evaluate(&bot).await.unwrap();
        assert!(!outcome.suppress);
    }

    #[tokio::test]
    async fn disabled_guild_never_flags() {
        let service = AutoModService::new(MockStore::new());
        service.set_enabled(GUILD, false).await.unwrap();
        service.add_bad_word(GUILD, "test").await.unwrap();

        let outcome = service.evaluate(&message("a TEST message")).await.unwrap();
        assert!(!outcome.suppress);
        assert!(outcome.violations.is_empty());
    }

    #[tokio::test]
    async fn spam_triggers_on_the_message_over_the_limit() {
        let service = AutoModService::new(MockStore::new());
        let base = Utc::now();

        for i in 0..5 {
            let mut msg = message(&format!("msg {}", i));
            msg.timestamp = base;
            let outcome = service.evaluate(&msg).await.unwrap();
            assert!(!outcome.suppress, "message {} should be clean", i);
        }

        let mut sixth = message("msg 5");
        sixth.timestamp = base;
        let outcome = service.evaluate(&sixth).await.unwrap();
        assert!(outcome.suppress);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind, ViolationKind::Spam);
    }

    #[tokio::test]
    async fn spread_messages_stay_outside_the_window() {
        let service = AutoModService::new(MockStore::new());
        let base = Utc::now();

        // Six messages, ten seconds apart: window is five seconds.
        for i in 0..6 {
            let mut msg = message(&format!("spread {}", i));
            msg.timestamp = base + ChronoDuration::seconds(i * 10);
            let outcome = service.evaluate(&msg).await.unwrap();
            assert!(!outcome.suppress, "message {} should be clean", i);
        }
    }

    #[tokio::test]
    async fn bad_word_flags_and_removal_keeps_the_log() {
        let service = AutoModService::new(MockStore::new());
        assert!(service.add_bad_word(GUILD, "Test").await.unwrap());
        // Stored lowercase, duplicate rejected
        assert!(!service.add_bad_word(GUILD, "test").await.unwrap());

        let outcome = service
            .evaluate(&message("this is a TEST message"))
            .await
            .unwrap();
        assert!(outcome.suppress);
        assert_eq!(outcome.violations[0].kind, ViolationKind::BadWord);

        assert!(service.remove_bad_word(GUILD, "test").await.unwrap());
        let outcome = service
            .evaluate(&message("another TEST message"))
            .await
            .unwrap();
        assert!(!outcome.suppress);

        // The earlier violation is still on record.
        let log = service.recent_log(GUILD, 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].violations, vec![ViolationKind::BadWord]);
    }

    #[tokio::test]
    async fn repeat_flags_on_third_identical_message() {
        let service = AutoModService::new(MockStore::new());
        // Keep the spam rule out of the way so only repeats can fire.
        let mut config = AutoModConfig::default();
        config.anti_spam = false;
        service.set_config(GUILD, config).await.unwrap();

        let base = Utc::now();
        for i in 0..2 {
            let mut msg = message("  hello  ");
            msg.timestamp = base + ChronoDuration::seconds(i);
            let outcome = service.evaluate(&msg).await.unwrap();
            assert!(!outcome.suppress, "repeat {} should be clean", i);
        }

        let mut third = message("hello");
        third.timestamp = base + ChronoDuration::seconds(2);
        let outcome = service.evaluate(&third).await.unwrap();
        assert!(outcome.suppress);
        assert_eq!(outcome.violations[0].kind, ViolationKind::Repeat);
    }

    #[tokio::test]
    async fn escalation_tiers_are_cumulative() {
        let service = AutoModService::new(MockStore::new());
        let mut config = AutoModConfig::default();
        config.kick_on_repeat = true;
        service.set_config(GUILD, config).await.unwrap();
        service.add_bad_word(GUILD, "bleep").await.unwrap();

        let mut last = CheckOutcome::clean();
        for i in 0..5 {
            let mut msg = message("bleep");
            // Spread out so the spam/repeat rules stay quiet.
            msg.timestamp = Utc::now() + ChronoDuration::seconds(i * 60);
            msg.content = format!("bleep number {}", i);
            last = service.evaluate(&msg).await.unwrap();
        }

        assert_eq!(last.warning_count, 5);
        assert!(last.actions.contains(&EnforcementAction::DeleteMessage));
        assert!(last
            .actions
            .iter()
            .any(|a| matches!(a, EnforcementAction::Warn { warning_count: 5 })));
        assert!(last
            .actions
            .iter()
            .any(|a| matches!(a, EnforcementAction::Timeout { .. })));
        assert!(last
            .actions
            .iter()
            .any(|a| matches!(a, EnforcementAction::Kick { .. })));
    }

    #[tokio::test]
    async fn third_warning_applies_timeout_but_not_kick_by_default() {
        let service = AutoModService::new(MockStore::new());
        service.add_bad_word(GUILD, "bleep").await.unwrap();

        let mut last = CheckOutcome::clean();
        for i in 0..3 {
            let mut msg = message(&format!("bleep variant {}", i));
            msg.timestamp = Utc::now() + ChronoDuration::seconds(i * 60);
            last = service.evaluate(&msg).await.unwrap();
        }

        assert_eq!(last.warning_count, 3);
        assert!(last
            .actions
            .iter()
            .any(|a| matches!(a, EnforcementAction::Timeout { .. })));
        // Kick stays off unless opted in.
        assert!(!last
            .actions
            .iter()
            .any(|a| matches!(a, EnforcementAction::Kick { .. })));
    }

    #[tokio::test]
    async fn mention_rule_can_contribute_two_violations() {
        let service = AutoModService::new(MockStore::new());

        let mut msg = message("ping @everyone wake up");
        msg.mention_count = 10;
        let outcome = service.evaluate(&msg).await.unwrap();

        assert!(outcome.suppress);
        let kinds: Vec<ViolationKind> = outcome.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::MassMention, ViolationKind::EveryoneMention]
        );
        // 3 + 4 = 7 -> high
        assert_eq!(outcome.severity, Severity::High);
    }

    #[tokio::test]
    async fn moderation_log_is_bounded_to_capacity() {
        let service = AutoModService::new(MockStore::new());
        service.add_bad_word(GUILD, "bleep").await.unwrap();

        for i in 0..150 {
            let mut msg = message(&format!("bleep {}", i));
            msg.timestamp = Utc::now() + ChronoDuration::seconds(i * 60);
            let outcome = service.evaluate(&msg).await.unwrap();
            assert!(outcome.suppress);
        }

        let log = service.recent_log(GUILD, 200).await.unwrap();
        assert_eq!(log.len(), 100);
        // The retained entries are the most recent 100, in order.
        assert!(log[0].message_excerpt.ends_with("50"));
        assert!(log[99].message_excerpt.ends_with("149"));
    }

    #[tokio::test]
    async fn log_excerpt_is_capped_at_200_chars() {
        let service = AutoModService::new(MockStore::new());
        service.add_bad_word(GUILD, "bleep").await.unwrap();

        let long = format!("bleep {}", "x".repeat(500));
        let outcome = service.evaluate(&message(&long)).await.unwrap();
        assert!(outcome.suppress);

        let log = service.recent_log(GUILD, 1).await.unwrap();
        assert_eq!(log[0].message_excerpt.chars().count(), 200);
    }

    #[tokio::test]
    async fn config_mutators_round_trip() {
        let service = AutoModService::new(MockStore::new());

        service.set_spam_limit(GUILD, 8).await.unwrap();
        service.set_spam_window(GUILD, 12).await.unwrap();
        service.set_mention_limit(GUILD, 3).await.unwrap();
        service.set_caps_threshold(GUILD, 0.5).await.unwrap();
        service
            .set_rule_enabled(GUILD, RuleCategory::Links, true)
            .await
            .unwrap();
        service
            .set_action_enabled(GUILD, EnforcementToggle::Kick, true)
            .await
            .unwrap();
        assert!(service.add_allowed_domain(GUILD, "Example.Com").await.unwrap());

        let config = service.get_config(GUILD).await.unwrap();
        assert_eq!(config.spam_limit, 8);
        assert_eq!(config.spam_window_secs, 12);
        assert_eq!(config.mention_limit, 3);
        assert!((config.caps_threshold - 0.5).abs() < f64::EPSILON);
        assert!(config.anti_links);
        assert!(config.kick_on_repeat);
        assert_eq!(config.allowed_domains, vec!["example.com".to_string()]);

        assert!(service.remove_allowed_domain(GUILD, "example.com").await.unwrap());
        assert!(!service.remove_allowed_domain(GUILD, "example.com").await.unwrap());
    }

    #[tokio::test]
    async fn invalid_thresholds_are_rejected() {
        let service = AutoModService::new(MockStore::new());
        assert!(service.set_caps_threshold(GUILD, 1.5).await.is_err());
        assert!(service.set_spam_limit(GUILD, 0).await.is_err());
        assert!(service.add_bad_word(GUILD, "   ").await.is_err());
    }

    #[tokio::test]
    async fn admin_reset_clears_the_counter() {
        let service = AutoModService::new(MockStore::new());
        service.add_bad_word(GUILD, "bleep").await.unwrap();

        let outcome = service.evaluate(&message("bleep here")).await.unwrap();
        assert_eq!(outcome.warning_count, 1);
        assert_eq!(service.warning_count(GUILD, USER), 1);

        service.reset_warnings(GUILD, USER);
        assert_eq!(service.warning_count(GUILD, USER), 0);
    }
}
