//! Command handler implementations (/start, /help, /stats, text fallback)

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::handlers::{HandlerDeps, HandlerError};
use super::launch::{game_keyboard, launch_keyboard, launch_url};
use super::notifications::notify_admin_new_user;
use crate::core::accounts;
use crate::core::config;
use crate::core::error::AppError;
use crate::core::utils::{format_date, format_drx, now_millis};
use crate::storage::db::{get_connection, Account, NewAccount};
use crate::storage::ledger;

const TRANSIENT_FAILURE_TEXT: &str = "❌ Something went wrong. Please try again later.";

/// Handle /start command
///
/// Parses the optional referral payload (`ref_<id>` or `refauth_<key>`),
/// branches new vs returning user and replies with the launch keyboard.
/// Referral crediting happens inside registration and never blocks the
/// reply.
pub(super) async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let user = match &msg.from {
        Some(user) => user,
        None => return Ok(()),
    };
    let user_id = user.id.0.to_string();
    let (ref_id, ref_auth) = parse_start_payload(msg.text().unwrap_or(""));

    let mut conn = match get_connection(&deps.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get database connection for /start: {}", e);
            bot.send_message(msg.chat.id, TRANSIENT_FAILURE_TEXT).await?;
            return Ok(());
        }
    };

    let (account, is_new) = match accounts::lookup_account(&conn, &user_id) {
        Ok(Some(account)) => {
            if let Err(e) = crate::storage::db::touch_last_active(&conn, &user_id, now_millis()) {
                log::warn!("Failed to touch last_active for {}: {}", user_id, e);
            }
            (account, false)
        }
        Ok(None) => {
            let profile = NewAccount {
                id: user_id.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone().unwrap_or_default(),
                avatar_url: String::new(),
                referred_by: ref_id.clone(),
            };
            match accounts::register_account(&mut conn, &profile) {
                Ok(account) => {
                    let bot_notify = bot.clone();
                    let notify_id = user_id.clone();
                    let notify_name = user.first_name.clone();
                    let notify_ref = profile.referred_by.clone();
                    tokio::spawn(async move {
                        notify_admin_new_user(&bot_notify, &notify_id, &notify_name, notify_ref.as_deref())
                            .await;
                    });
                    (account, true)
                }
                // Lost a race against a concurrent /start for the same
                // identity; the account exists now.
                Err(AppError::DuplicateAccount(_)) => match accounts::lookup_account(&conn, &user_id) {
                    Ok(Some(account)) => (account, false),
                    other => {
                        log::error!("Account vanished after duplicate create for {}: {:?}", user_id, other);
                        bot.send_message(msg.chat.id, TRANSIENT_FAILURE_TEXT).await?;
                        return Ok(());
                    }
                },
                Err(e) => {
                    log::error!("Registration failed for {}: {}", user_id, e);
                    bot.send_message(msg.chat.id, TRANSIENT_FAILURE_TEXT).await?;
                    return Ok(());
                }
            }
        }
        Err(e) => {
            log::error!("Account lookup failed for {}: {}", user_id, e);
            bot.send_message(msg.chat.id, TRANSIENT_FAILURE_TEXT).await?;
            return Ok(());
        }
    };

    let welcome_text = if is_new {
        format!(
            "🎮 Welcome to DRX Mining, {}!\n\n\
             ⛏️ Start mining DRX coins\n\
             💎 Get 100 DRX welcome bonus\n\
             🎁 Complete missions for rewards\n\
             👥 Invite friends to earn more!",
            user.first_name
        )
    } else {
        format!(
            "🎮 Welcome back, {}!\n\n⛏️ Continue your DRX mining journey!",
            user.first_name
        )
    };

    let game_url = match launch_url(
        &config::WEBAPP_URL,
        &user_id,
        &account.auth_key,
        ref_id.as_deref(),
        ref_auth.as_deref(),
    ) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Failed to build launch URL: {}", e);
            bot.send_message(msg.chat.id, TRANSIENT_FAILURE_TEXT).await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, welcome_text)
        .parse_mode(ParseMode::Html)
        .reply_markup(launch_keyboard(game_url, &user_id, deps.bot_username.as_deref()))
        .await?;

    Ok(())
}

/// Handle /help command
pub(super) async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    let help_text = "\
🎮 <b>DRX Mining Bot Help</b>

⛏️ <b>Mining:</b>
• Start mining to earn DRX coins
• Minimum mining time: 30 minutes
• Maximum mining time: 24 hours
• Claim rewards every 5+ minutes

🚀 <b>Boosts:</b>
• Mining Speed: Increase efficiency
• Claim Time: Reduce minimum wait time
• Mining Rate: Earn more DRX per second

🎯 <b>Missions:</b>
• Join channels for rewards
• Complete timer tasks
• Enter promo codes
• Earn bonus DRX

👥 <b>Referrals:</b>
• Invite friends with your link
• Earn 200 DRX per referral
• Build your mining network

🔧 <b>Commands:</b>
/start - Start the bot
/help - Show this help
/stats - View your statistics";

    bot.send_message(msg.chat.id, help_text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /stats command
///
/// Storage failure is reported as a transient error, never as
/// "user not found".
pub(super) async fn handle_stats_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let user = match &msg.from {
        Some(user) => user,
        None => return Ok(()),
    };
    let user_id = user.id.0.to_string();

    let conn = match get_connection(&deps.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get database connection for /stats: {}", e);
            bot.send_message(msg.chat.id, "❌ Failed to get statistics. Please try again later.")
                .await?;
            return Ok(());
        }
    };

    let account = match accounts::require_account(&conn, &user_id) {
        Ok(account) => account,
        Err(AppError::NotFound(_)) => {
            bot.send_message(msg.chat.id, "❌ User not found. Please use /start first.")
                .await?;
            return Ok(());
        }
        // Storage trouble is transient, never "user not found".
        Err(e) => {
            log::error!("Stats lookup failed for {}: {}", user_id, e);
            bot.send_message(msg.chat.id, "❌ Failed to get statistics. Please try again later.")
                .await?;
            return Ok(());
        }
    };

    let referrals = match ledger::referral_summary(&conn, &user_id) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Referral summary failed for {}: {}", user_id, e);
            bot.send_message(msg.chat.id, "❌ Failed to get statistics. Please try again later.")
                .await?;
            return Ok(());
        }
    };

    let stats_text = render_stats(&account, referrals.count, referrals.total_earned_milli);

    let game_url = match launch_url(&config::WEBAPP_URL, &user_id, &account.auth_key, None, None) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Failed to build launch URL for /stats: {}", e);
            bot.send_message(msg.chat.id, stats_text)
                .parse_mode(ParseMode::Html)
                .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, stats_text)
        .parse_mode(ParseMode::Html)
        .reply_markup(game_keyboard(game_url))
        .await?;

    Ok(())
}

/// Handle plain text messages: nudge unregistered users to /start,
/// hand registered users the game button.
pub(super) async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let user = match &msg.from {
        Some(user) => user,
        None => return Ok(()),
    };
    let user_id = user.id.0.to_string();

    let conn = match get_connection(&deps.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get database connection for message: {}", e);
            return Ok(());
        }
    };

    let account = match accounts::lookup_account(&conn, &user_id) {
        Ok(Some(account)) => account,
        Ok(None) => {
            bot.send_message(
                msg.chat.id,
                "👋 Welcome! Please use /start to begin your DRX mining journey!",
            )
            .await?;
            return Ok(());
        }
        Err(e) => {
            log::error!("Account lookup failed for message from {}: {}", user_id, e);
            bot.send_message(msg.chat.id, TRANSIENT_FAILURE_TEXT).await?;
            return Ok(());
        }
    };

    let game_url = match launch_url(&config::WEBAPP_URL, &user_id, &account.auth_key, None, None) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Failed to build launch URL: {}", e);
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, "🎮 Click the button below to open DRX Mining!")
        .reply_markup(game_keyboard(game_url))
        .await?;

    Ok(())
}

/// Split the /start payload into referral parts.
///
/// `ref_<id>` carries a referrer identity for the ledger; `refauth_<key>`
/// carries a referrer credential that is only threaded through to the
/// launch URL. Empty suffixes are treated as absent.
fn parse_start_payload(text: &str) -> (Option<String>, Option<String>) {
    let payload = match text.split_whitespace().nth(1) {
        Some(p) => p,
        None => return (None, None),
    };

    if let Some(referrer) = payload.strip_prefix("ref_") {
        let referrer = referrer.trim();
        if referrer.is_empty() {
            return (None, None);
        }
        return (Some(referrer.to_string()), None);
    }
    if let Some(referrer_auth) = payload.strip_prefix("refauth_") {
        let referrer_auth = referrer_auth.trim();
        if referrer_auth.is_empty() {
            return (None, None);
        }
        return (None, Some(referrer_auth.to_string()));
    }
    (None, None)
}

fn render_stats(account: &Account, referral_count: i64, referral_earned_milli: i64) -> String {
    let mining_status = if account.is_mining {
        "🟢 Active"
    } else {
        "🔴 Inactive"
    };

    format!(
        "📊 <b>Your Statistics</b>\n\n\
         💰 <b>Balance:</b> {} DRX\n\
         🏆 <b>Total Earned:</b> {} DRX\n\
         ⭐ <b>Level:</b> {} (XP: {})\n\
         👥 <b>Referrals:</b> {} friends (+{} DRX)\n\n\
         ⛏️ <b>Mining Status:</b> {}\n\
         📈 <b>Mining Rate:</b> {:.6} DRX/sec\n\
         ⏱️ <b>Min Claim Time:</b> {} minutes\n\n\
         🚀 <b>Boosts:</b>\n\
         • Speed Level: {}\n\
         • Time Level: {}\n\
         • Rate Level: {}\n\n\
         📅 <b>Joined:</b> {}",
        format_drx(account.balance_milli),
        format_drx(account.total_earned_milli),
        account.level,
        account.xp,
        referral_count,
        format_drx(referral_earned_milli),
        mining_status,
        account.mining_rate,
        account.min_claim_time / 60,
        account.mining_speed_level,
        account.claim_time_level,
        account.mining_rate_level,
        format_date(account.joined_at),
    )
}
