//! Bot initialization and message routing utilities
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Message addressing logic (private chats, mentions, replies)

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, UserId};
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "DRX Mining commands:")]
pub enum Command {
    #[command(description = "open the game and register")]
    Start,
    #[command(description = "how mining, boosts and referrals work")]
    Help,
    #[command(description = "view your statistics")]
    Stats,
}

/// Creates a Bot instance with a request timeout on the HTTP client
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - BOT_TOKEN missing or client construction failed
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN environment variable not set");
    }

    let client = ClientBuilder::new()
        .timeout(config::network::timeout())
        .build()?;
    Ok(Bot::with_client(token, client))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "open the game and register"),
        BotCommand::new("help", "how mining, boosts and referrals work"),
        BotCommand::new("stats", "view your statistics"),
    ])
    .await?;

    Ok(())
}

/// Checks if a message is addressed to the bot
///
/// # Returns
/// * `true` for private chats, replies to the bot, or an @mention of the bot
pub fn is_message_addressed_to_bot(msg: &Message, bot_username: Option<&str>, bot_id: UserId) -> bool {
    // In private chats, all messages are addressed to the bot
    if matches!(msg.chat.kind, ChatKind::Private(_)) {
        return true;
    }

    // Check if the message is a reply to a bot message
    if let Some(reply_to) = msg.reply_to_message() {
        if let Some(from) = &reply_to.from {
            if from.id == bot_id {
                return true;
            }
        }
    }

    // Check message text for a bot mention
    if let (Some(text), Some(username)) = (msg.text(), bot_username) {
        let mention = format!("@{}", username);
        if text.contains(&mention) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions() {
        let commands = Command::descriptions();
        let command_list = format!("{}", commands);

        assert!(command_list.contains("DRX Mining commands"));
        assert!(command_list.contains("start"));
        assert!(command_list.contains("help"));
        assert!(command_list.contains("stats"));
    }
}
