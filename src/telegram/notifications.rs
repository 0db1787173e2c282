//! Best-effort admin notifications

use teloxide::prelude::*;
use teloxide::types::ChatId;

use crate::core::config;

/// Sends a notification to the administrator about a newly registered
/// player. Silent unless ADMIN_CHAT_ID is configured; failures are logged
/// and never propagate.
pub async fn notify_admin_new_user(bot: &Bot, user_id: &str, first_name: &str, referred_by: Option<&str>) {
    let admin_chat = match *config::ADMIN_CHAT_ID {
        Some(id) => ChatId(id),
        None => return,
    };

    let referral_line = match referred_by {
        Some(referrer) => format!("\nReferred by: {}", referrer),
        None => String::new(),
    };
    let message = format!(
        "🆕 New player registered\nID: {}\nName: {}{}",
        user_id, first_name, referral_line
    );

    if let Err(e) = bot.send_message(admin_chat, message).await {
        log::error!("Failed to send admin notification: {}", e);
    } else {
        log::info!("Admin notified about new player {}", user_id);
    }
}
