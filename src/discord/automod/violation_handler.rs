// Discord-specific violation handling - translates core rule results to
// Discord actions (delete, warn, timeout, kick).

use crate::core::automod::{
    AutoModService, AutoModStore, CheckOutcome, EnforcementAction, MessageSnapshot,
};
use crate::discord::Error;
use poise::serenity_prelude as serenity;
use std::time::Duration;

/// How long a channel-posted warning notice stays up before auto-deletion.
const WARNING_NOTICE_SECS: u64 = 10;

/// Check a message against the guild's moderation rules and apply the
/// resulting enforcement actions.
///
/// Returns `true` if the message was suppressed.
pub async fn handle_message<S: AutoModStore>(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    automod: &AutoModService<S>,
) -> Result<bool, Error> {
    // Only check guild messages
    let Some(guild_id) = msg.guild_id else {
        return Ok(false);
    };

    let snapshot = build_snapshot(ctx, msg, guild_id);

    let outcome = automod
        .evaluate(&snapshot)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if !outcome.suppress {
        return Ok(false);
    }

    tracing::debug!(
        guild_id = snapshot.guild_id,
        user_id = snapshot.author_id,
        warning_count = outcome.warning_count,
        "applying enforcement actions"
    );

    apply_actions(ctx, msg, &outcome).await;

    Ok(true)
}

/// Build the platform-agnostic snapshot the core evaluates.
fn build_snapshot(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    guild_id: serenity::GuildId,
) -> MessageSnapshot {
    // Resolve the author's guild permissions from the cache. A cache miss
    // yields no permissions, which only means the permission-gated rules
    // (everyone-mention, invites) apply to them.
    let perms = ctx
        .cache
        .guild(guild_id)
        .and_then(|guild| {
            guild
                .members
                .get(&msg.author.id)
                .map(|member| guild.member_permissions(member))
        })
        .unwrap_or_else(serenity::Permissions::empty);

    MessageSnapshot {
        guild_id: guild_id.get(),
        channel_id: msg.channel_id.get(),
        message_id: msg.id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        content: msg.content.clone(),
        timestamp: msg.timestamp.with_timezone(&chrono::Utc),
        mention_count: (msg.mentions.len() + msg.mention_roles.len()) as u32,
        is_bot: msg.author.bot,
        is_admin: perms.administrator(),
        can_mention_everyone: perms.mention_everyone(),
        can_manage_guild: perms.manage_guild(),
    }
}

/// Apply each enforcement step in order. A failed step is logged and never
/// blocks the remaining steps.
async fn apply_actions(ctx: &serenity::Context, msg: &serenity::Message, outcome: &CheckOutcome) {
    for action in &outcome.actions {
        match action {
            EnforcementAction::DeleteMessage => {
                if let Err(e) = msg.delete(&ctx.http).await {
                    tracing::warn!("Failed to delete flagged message: {}", e);
                }
            }

            EnforcementAction::Warn { warning_count } => {
                send_warning(ctx, msg, outcome, *warning_count).await;
            }

            EnforcementAction::Timeout { duration, reason } => {
                apply_timeout(ctx, msg, *duration, reason).await;
            }

            EnforcementAction::Kick { reason } => {
                if let Some(guild_id) = msg.guild_id {
                    if let Err(e) = guild_id
                        .kick_with_reason(&ctx.http, msg.author.id, reason)
                        .await
                    {
                        tracing::warn!("Failed to kick user {}: {}", msg.author.id, e);
                    }
                }
            }
        }
    }
}

/// Send the warning notice: DM first; if the recipient blocks DMs, post in
/// the origin channel and auto-delete after a short delay.
async fn send_warning(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    outcome: &CheckOutcome,
    warning_count: u32,
) {
    let mut embed = serenity::CreateEmbed::new()
        .title("⚠️ Auto-Moderation Warning")
        .color(0xFFA500)
        .field(
            "Violations",
            outcome
                .violations
                .iter()
                .map(|v| v.kind.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            false,
        );

    // Show up to 3 violations in detail
    for violation in outcome.violations.iter().take(3) {
        embed = embed.field(&violation.reason, &violation.detail, false);
    }

    embed = embed
        .field("Warning", format!("#{}/5", warning_count), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Severity: {}",
            outcome.severity
        )));

    let dm = msg
        .author
        .dm(&ctx.http, serenity::CreateMessage::new().embed(embed.clone()))
        .await;

    if dm.is_ok() {
        return;
    }

    // DMs closed - fall back to the channel and clean up after ourselves.
    match msg
        .channel_id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .content(format!("<@{}>", msg.author.id))
                .embed(embed),
        )
        .await
    {
        Ok(notice) => {
            let http = ctx.http.clone();
            let channel_id = notice.channel_id;
            let notice_id = notice.id;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(WARNING_NOTICE_SECS)).await;
                if let Err(e) = http.delete_message(channel_id, notice_id, None).await {
                    tracing::debug!("Failed to remove warning notice: {}", e);
                }
            });
        }
        Err(e) => {
            tracing::warn!("Failed to send warning notice: {}", e);
        }
    }
}

/// Apply a Discord timeout for the configured mute duration.
async fn apply_timeout(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    duration: Duration,
    reason: &str,
) {
    let Some(guild_id) = msg.guild_id else {
        return;
    };

    let timeout_until = match serenity::Timestamp::from_unix_timestamp(
        chrono::Utc::now().timestamp() + duration.as_secs() as i64,
    ) {
        Ok(ts) => ts,
        Err(e) => {
            tracing::error!("Failed to create timeout timestamp: {}", e);
            return;
        }
    };

    if let Err(e) = guild_id
        .edit_member(
            &ctx.http,
            msg.author.id,
            serenity::EditMember::new()
                .disable_communication_until_datetime(timeout_until)
                .audit_log_reason(reason),
        )
        .await
    {
        tracing::warn!("Failed to timeout user {}: {}", msg.author.id, e);
    } else {
        tracing::info!(
            user_id = msg.author.id.get(),
            guild_id = guild_id.get(),
            "User timed out for {} minutes: {}",
            duration.as_secs() / 60,
            reason
        );
    }
}
