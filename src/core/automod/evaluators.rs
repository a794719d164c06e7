// Rule evaluators - one pure check per moderation category.
//
// Each evaluator inspects a single message against the guild config (and,
// for spam/repeat, a snapshot of the user's recent-message window) and
// returns zero or one violation. The admin/bot bypass happens once in the
// service before any of these run.

use super::automod_models::{AutoModConfig, MessageRecord, MessageSnapshot, Violation, ViolationKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Messages shorter than this never trigger the caps rule.
const CAPS_MIN_LENGTH: usize = 10;

/// Fixed per-message emoji limit (custom + Unicode combined).
const EMOJI_LIMIT: usize = 5;

/// How many trailing messages the repeat rule inspects.
const REPEAT_LOOKBACK: usize = 5;

/// Hosts that always pass the link rule, regardless of guild settings.
const SAFE_DOMAINS: &[&str] = &[
    "discord.com",
    "discord.gg",
    "youtube.com",
    "youtu.be",
    "twitch.tv",
    "github.com",
    "imgur.com",
    "gyazo.com",
];

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s<>]+").expect("valid URL regex"));

static URL_HOST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://([^/\s]+)").expect("valid host regex"));

static INVITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"discord\.(gg|io|me|li|com/invite)/[a-zA-Z0-9]+").expect("valid invite regex"));

// Custom emoji tokens (<:name:id> / <a:name:id>) or astral-plane code points,
// which is where the pictographic blocks live.
static EMOJI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a?:\w+:\d+>|[\x{10000}-\x{10FFFF}]").expect("valid emoji regex"));

/// Flag when the pruned window holds more messages than the guild limit.
/// `recent` already includes the message under evaluation.
pub fn check_spam(recent: &[MessageRecord], config: &AutoModConfig) -> Option<Violation> {
    if recent.len() > config.spam_limit as usize {
        return Some(Violation::new(
            ViolationKind::Spam,
            format!(
                "Spam ({} messages in {} seconds)",
                recent.len(),
                config.spam_window_secs
            ),
            format!(
                "Limit: {} messages per {} seconds",
                config.spam_limit, config.spam_window_secs
            ),
        ));
    }
    None
}

/// Mass-mention and @everyone checks. These are independent violations and
/// both may fire on the same message.
pub fn check_mentions(msg: &MessageSnapshot, config: &AutoModConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    if msg.mention_count > config.mention_limit {
        violations.push(Violation::new(
            ViolationKind::MassMention,
            format!("Mass mentions ({} mentions)", msg.mention_count),
            format!("Limit: {} mentions", config.mention_limit),
        ));
    }

    let mentions_everyone =
        msg.content.contains("@everyone") || msg.content.contains("@here");
    if mentions_everyone && !msg.can_mention_everyone {
        violations.push(Violation::new(
            ViolationKind::EveryoneMention,
            "@everyone/@here mention without permission",
            "Requires the mention-everyone permission",
        ));
    }

    violations
}

/// Flag when the uppercase ratio is strictly above the guild threshold.
pub fn check_caps(msg: &MessageSnapshot, config: &AutoModConfig) -> Option<Violation> {
    let total = msg.content.chars().count();
    if total < CAPS_MIN_LENGTH {
        return None;
    }

    let upper = msg.content.chars().filter(|c| c.is_uppercase()).count();
    let ratio = upper as f64 / total as f64;

    if ratio > config.caps_threshold {
        return Some(Violation::new(
            ViolationKind::Caps,
            format!("Excessive caps ({:.0}%)", ratio * 100.0),
            format!("Threshold: {:.0}%", config.caps_threshold * 100.0),
        ));
    }
    None
}

/// Flag the first URL whose host is neither guild-allowed nor built-in safe.
pub fn check_links(msg: &MessageSnapshot, config: &AutoModConfig) -> Option<Violation> {
    for url in URL_RE.find_iter(&msg.content) {
        let Some(host) = URL_HOST_RE
            .captures(url.as_str())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };

        let allowed = SAFE_DOMAINS
            .iter()
            .copied()
            .chain(config.allowed_domains.iter().map(String::as_str))
            .any(|d| host.contains(d));

        if !allowed {
            return Some(Violation::new(
                ViolationKind::Link,
                "Link to a disallowed site",
                format!("Host: {}", host),
            ));
        }
    }
    None
}

/// Case-insensitive substring match against the guild banned-word list.
pub fn check_bad_words(msg: &MessageSnapshot, words: &[String]) -> Option<Violation> {
    if words.is_empty() {
        return None;
    }

    let lower = msg.content.to_lowercase();
    for word in words {
        if lower.contains(word.as_str()) {
            return Some(Violation::new(
                ViolationKind::BadWord,
                format!("Banned word: {}", word),
                "Word is on the guild blacklist",
            ));
        }
    }
    None
}

/// Flag when the three most recent tracked messages are identical after
/// trimming whitespace. `recent` includes the message under evaluation.
pub fn check_repeat(recent: &[MessageRecord]) -> Option<Violation> {
    let window = if recent.len() > REPEAT_LOOKBACK {
        &recent[recent.len() - REPEAT_LOOKBACK..]
    } else {
        recent
    };

    if window.len() < 3 {
        return None;
    }

    let last_three: Vec<&str> = window[window.len() - 3..]
        .iter()
        .map(|r| r.content.trim())
        .collect();

    if last_three[0] == last_three[1] && last_three[1] == last_three[2] {
        return Some(Violation::new(
            ViolationKind::Repeat,
            "Repeated messages",
            "3 identical messages in a row",
        ));
    }
    None
}

/// Flag when the message holds more than the fixed emoji limit.
pub fn check_emoji_spam(msg: &MessageSnapshot) -> Option<Violation> {
    let count = EMOJI_RE.find_iter(&msg.content).count();
    if count > EMOJI_LIMIT {
        return Some(Violation::new(
            ViolationKind::EmojiSpam,
            format!("Emoji spam ({} emoji)", count),
            format!("Limit: {} emoji per message", EMOJI_LIMIT),
        ));
    }
    None
}

/// Flag Discord invite links from authors without manage-guild permission.
pub fn check_invites(msg: &MessageSnapshot) -> Option<Violation> {
    if INVITE_RE.is_match(&msg.content) && !msg.can_manage_guild {
        return Some(Violation::new(
            ViolationKind::Invite,
            "Posting Discord invites",
            "Requires the manage-guild permission",
        ));
    }
    None
}
