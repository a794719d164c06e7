// Auto-moderation slash commands for configuration and reporting.

use crate::core::automod::{EnforcementToggle, RuleCategory};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use poise::ChoiceParameter;

/// The rule categories exposed to admins, as a fixed choice list.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum RuleChoice {
    #[name = "Spam"]
    Spam,
    #[name = "Mentions"]
    Mentions,
    #[name = "Caps"]
    Caps,
    #[name = "Links"]
    Links,
    #[name = "Bad words"]
    BadWords,
    #[name = "Repeats"]
    Repeats,
    #[name = "Emoji spam"]
    EmojiSpam,
    #[name = "Invites"]
    Invites,
}

impl From<RuleChoice> for RuleCategory {
    fn from(choice: RuleChoice) -> Self {
        match choice {
            RuleChoice::Spam => RuleCategory::Spam,
            RuleChoice::Mentions => RuleCategory::Mentions,
            RuleChoice::Caps => RuleCategory::Caps,
            RuleChoice::Links => RuleCategory::Links,
            RuleChoice::BadWords => RuleCategory::BadWords,
            RuleChoice::Repeats => RuleCategory::Repeat,
            RuleChoice::EmojiSpam => RuleCategory::EmojiSpam,
            RuleChoice::Invites => RuleCategory::Invites,
        }
    }
}

/// The enforcement steps exposed to admins.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ActionChoice {
    #[name = "Delete message"]
    Delete,
    #[name = "Send warning"]
    Warn,
    #[name = "Mute at 3 warnings"]
    Mute,
    #[name = "Kick at 5 warnings"]
    Kick,
}

impl From<ActionChoice> for EnforcementToggle {
    fn from(choice: ActionChoice) -> Self {
        match choice {
            ActionChoice::Delete => EnforcementToggle::Delete,
            ActionChoice::Warn => EnforcementToggle::Warn,
            ActionChoice::Mute => EnforcementToggle::Mute,
            ActionChoice::Kick => EnforcementToggle::Kick,
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "✅ on"
    } else {
        "❌ off"
    }
}

/// Auto-moderation configuration commands.
///
/// Configure the rule engine for your server.
#[poise::command(
    slash_command,
    subcommands(
        "status",
        "enable",
        "disable",
        "rule",
        "limits",
        "actions",
        "allow_domain",
        "remove_domain",
        "logs",
        "warnings",
        "reset_warnings"
    ),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn automod(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - subcommands do the work
    Ok(())
}

/// Show current auto-moderation status and settings.
#[poise::command(slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let config = ctx
        .data()
        .automod
        .get_config(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let allowed_domains = if config.allowed_domains.is_empty() {
        "(built-in safe list only)".to_string()
    } else {
        config.allowed_domains.join(", ")
    };

    let embed = serenity::CreateEmbed::new()
        .title("🛡️ Auto-Moderation Status")
        .color(if config.enabled { 0x00FF00 } else { 0xFF0000 })
        .field(
            "Status",
            if config.enabled {
                "✅ Enabled"
            } else {
                "❌ Disabled"
            },
            false,
        )
        .field(
            "Rules",
            format!(
                "Spam: {}\nMentions: {}\nCaps: {}\nLinks: {}\nBad words: {}\nRepeats: {}\nEmoji spam: {}\nInvites: {}",
                on_off(config.anti_spam),
                on_off(config.anti_mentions),
                on_off(config.anti_caps),
                on_off(config.anti_links),
                on_off(config.anti_bad_words),
                on_off(config.anti_repeat),
                on_off(config.anti_emoji_spam),
                on_off(config.anti_invites),
            ),
            true,
        )
        .field(
            "Limits",
            format!(
                "Spam: {} msgs / {} sec\nMentions: {}\nCaps: {:.0}%",
                config.spam_limit,
                config.spam_window_secs,
                config.mention_limit,
                config.caps_threshold * 100.0,
            ),
            true,
        )
        .field(
            "Enforcement",
            format!(
                "Delete: {}\nWarn: {}\nMute (3 warnings): {}\nKick (5 warnings): {}",
                on_off(config.delete_message),
                on_off(config.send_warning),
                on_off(config.mute_on_repeat),
                on_off(config.kick_on_repeat),
            ),
            true,
        )
        .field("Allowed domains", allowed_domains, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Enable auto-moderation.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .automod
        .set_enabled(guild_id.get(), true)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say("✅ Auto-moderation has been **enabled**.").await?;
    Ok(())
}

/// Disable auto-moderation.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .automod
        .set_enabled(guild_id.get(), false)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say("❌ Auto-moderation has been **disabled**.").await?;
    Ok(())
}

/// Turn a single rule on or off.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn rule(
    ctx: Context<'_>,
    #[description = "Which rule to toggle"] rule: RuleChoice,
    #[description = "Whether the rule should be active"] enabled: bool,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .automod
        .set_rule_enabled(guild_id.get(), rule.into(), enabled)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!(
        "{} rule is now {}.",
        rule.name(),
        if enabled { "**on**" } else { "**off**" }
    ))
    .await?;
    Ok(())
}

/// Adjust rule thresholds.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn limits(
    ctx: Context<'_>,
    #[description = "Max messages in the spam window (default: 5)"] spam_limit: Option<u32>,
    #[description = "Spam window in seconds (default: 5)"] spam_window: Option<u64>,
    #[description = "Max mentions per message (default: 5)"] mention_limit: Option<u32>,
    #[description = "Caps ratio threshold 0.0-1.0 (default: 0.7)"] caps_threshold: Option<f64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();
    let automod = &ctx.data().automod;

    if let Some(v) = spam_limit {
        if let Err(e) = automod.set_spam_limit(guild_id, v).await {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
    }
    if let Some(v) = spam_window {
        if let Err(e) = automod.set_spam_window(guild_id, v).await {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
    }
    if let Some(v) = mention_limit {
        if let Err(e) = automod.set_mention_limit(guild_id, v).await {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
    }
    if let Some(v) = caps_threshold {
        if let Err(e) = automod.set_caps_threshold(guild_id, v).await {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
    }

    let config = automod
        .get_config(guild_id)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!(
        "✅ Limits updated: {} msgs / {} sec, {} mentions, caps {:.0}%.",
        config.spam_limit,
        config.spam_window_secs,
        config.mention_limit,
        config.caps_threshold * 100.0
    ))
    .await?;
    Ok(())
}

/// Turn an enforcement step on or off.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn actions(
    ctx: Context<'_>,
    #[description = "Which enforcement step to toggle"] action: ActionChoice,
    #[description = "Whether the step should be applied"] enabled: bool,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .automod
        .set_action_enabled(guild_id.get(), action.into(), enabled)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!(
        "{} is now {}.",
        action.name(),
        if enabled { "**on**" } else { "**off**" }
    ))
    .await?;
    Ok(())
}

/// Allow links to a domain.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn allow_domain(
    ctx: Context<'_>,
    #[description = "Host to allow, e.g. example.com"] domain: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let added = ctx
        .data()
        .automod
        .add_allowed_domain(guild_id.get(), &domain)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if added {
        ctx.say(format!("✅ Links to `{}` are now allowed.", domain.to_lowercase()))
            .await?;
    } else {
        ctx.say(format!("`{}` is already allowed.", domain.to_lowercase()))
            .await?;
    }
    Ok(())
}

/// Stop allowing links to a domain.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn remove_domain(
    ctx: Context<'_>,
    #[description = "Host to remove"] domain: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let removed = ctx
        .data()
        .automod
        .remove_allowed_domain(guild_id.get(), &domain)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if removed {
        ctx.say(format!("✅ Removed `{}` from the allowed domains.", domain.to_lowercase()))
            .await?;
    } else {
        ctx.say(format!("`{}` was not on the allowed list.", domain.to_lowercase()))
            .await?;
    }
    Ok(())
}

/// Show recent moderation log entries.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn logs(
    ctx: Context<'_>,
    #[description = "How many entries to show (default: 10)"] count: Option<u32>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let count = count.unwrap_or(10).min(25) as usize;

    let entries = ctx
        .data()
        .automod
        .recent_log(guild_id.get(), count)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if entries.is_empty() {
        ctx.say("No moderation log entries yet.").await?;
        return Ok(());
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("📋 Moderation Log")
        .color(0x5865F2);

    for entry in &entries {
        let kinds = entry
            .violations
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let mut excerpt = entry.message_excerpt.clone();
        if excerpt.chars().count() > 80 {
            excerpt = excerpt.chars().take(80).collect::<String>() + "...";
        }

        embed = embed.field(
            format!(
                "{} — {} (warning #{})",
                entry.timestamp.format("%Y-%m-%d %H:%M UTC"),
                entry.user_name,
                entry.warning_count
            ),
            format!("{}\n> {}", kinds, excerpt),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show a user's current warning count.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn warnings(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let count = ctx.data().automod.warning_count(guild_id.get(), user.id.get());

    ctx.say(format!("<@{}> has **{}** active warning(s).", user.id, count))
        .await?;
    Ok(())
}

/// Reset a user's warning count.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn reset_warnings(
    ctx: Context<'_>,
    #[description = "User to reset"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .automod
        .reset_warnings(guild_id.get(), user.id.get());

    ctx.say(format!("✅ Cleared all warnings for <@{}>.", user.id))
        .await?;
    Ok(())
}

/// Banned word management.
#[poise::command(
    slash_command,
    subcommands("add", "remove", "list"),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn badwords(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a word to the banned list.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Word to ban (matched case-insensitively)"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let added = ctx
        .data()
        .automod
        .add_bad_word(guild_id.get(), &word)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if added {
        ctx.say(format!("✅ `{}` added to the banned words.", word.to_lowercase()))
            .await?;
    } else {
        ctx.say(format!("`{}` is already banned.", word.to_lowercase()))
            .await?;
    }
    Ok(())
}

/// Remove a word from the banned list.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Word to unban"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let removed = ctx
        .data()
        .automod
        .remove_bad_word(guild_id.get(), &word)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if removed {
        ctx.say(format!("✅ `{}` removed from the banned words.", word.to_lowercase()))
            .await?;
    } else {
        ctx.say(format!("`{}` was not on the list.", word.to_lowercase()))
            .await?;
    }
    Ok(())
}

/// List the banned words.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let words = ctx
        .data()
        .automod
        .bad_words(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if words.is_empty() {
        ctx.say("No banned words configured.").await?;
        return Ok(());
    }

    let listing = words
        .iter()
        .map(|w| format!("`{}`", w))
        .collect::<Vec<_>>()
        .join(", ");

    ctx.send(
        poise::CreateReply::default()
            .content(format!("🚫 Banned words ({}): {}", words.len(), listing))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
