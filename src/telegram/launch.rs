//! Web-app launch URL and inline keyboards.
//!
//! The launch URL is the bot's contract with the game front-end:
//! `<base>?id=<id>&authKey=<auth_key>[&ref=<referrer_id>][&refauth=<referrer_auth_key>]`.
//! The `refauth` value is a pass-through from the /start payload; the bot
//! never validates or stores it.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use url::Url;

use crate::core::config;
use crate::core::error::AppResult;

/// Build the authenticated launch URL for a player.
pub fn launch_url(
    base: &str,
    user_id: &str,
    auth_key: &str,
    ref_id: Option<&str>,
    ref_auth: Option<&str>,
) -> AppResult<Url> {
    let mut url = Url::parse(base)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("id", user_id)
            .append_pair("authKey", auth_key);
        if let Some(referrer) = ref_id {
            query.append_pair("ref", referrer);
        }
        if let Some(referrer_auth) = ref_auth {
            query.append_pair("refauth", referrer_auth);
        }
    }
    Ok(url)
}

/// Full /start keyboard: game button, optional channel link, invite button.
pub fn launch_keyboard(game_url: Url, user_id: &str, bot_username: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![InlineKeyboardButton::web_app(
        "🎮 Open DRX Mining",
        WebAppInfo { url: game_url },
    )]];

    if let Some(channel) = config::CHANNEL_URL.as_deref() {
        match Url::parse(channel) {
            Ok(channel_url) => {
                rows.push(vec![InlineKeyboardButton::url("📢 Join Channel", channel_url)]);
            }
            Err(e) => log::warn!("Invalid CHANNEL_URL {:?}: {}", channel, e),
        }
    }

    if let Some(username) = bot_username {
        rows.push(vec![InlineKeyboardButton::switch_inline_query(
            "👥 Invite Friends",
            invite_text(username, user_id),
        )]);
    }

    InlineKeyboardMarkup::new(rows)
}

/// Single-button keyboard used by /stats and the plain-text fallback.
pub fn game_keyboard(game_url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
        "🎮 Open DRX Mining",
        WebAppInfo { url: game_url },
    )]])
}

fn invite_text(bot_username: &str, user_id: &str) -> String {
    format!(
        "🎮 Join DRX Mining and start earning!\n\n\
         💎 Get 100 DRX welcome bonus\n\
         ⛏️ Mine to earn more DRX\n\
         🎁 Complete missions for rewards\n\n\
         Join: https://t.me/{}?start=ref_{}",
        bot_username, user_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_url_without_referral() {
        let url = launch_url("https://game.example", "42", "deadbeef", None, None).unwrap();
        assert_eq!(url.as_str(), "https://game.example/?id=42&authKey=deadbeef");
    }

    #[test]
    fn test_launch_url_with_referral_params() {
        let url = launch_url("https://game.example", "42", "deadbeef", Some("7"), Some("cafe")).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("id".to_string(), "42".to_string()),
                ("authKey".to_string(), "deadbeef".to_string()),
                ("ref".to_string(), "7".to_string()),
                ("refauth".to_string(), "cafe".to_string()),
            ]
        );
    }

    #[test]
    fn test_launch_url_escapes_values() {
        let url = launch_url("https://game.example", "a b", "k&y", None, None).unwrap();
        assert!(!url.as_str().contains("a b"));
        assert!(!url.as_str().contains("k&y"));
    }

    #[test]
    fn test_launch_url_rejects_bad_base() {
        assert!(launch_url("not a url", "42", "deadbeef", None, None).is_err());
    }

    #[test]
    fn test_invite_text_embeds_deep_link() {
        let text = invite_text("drx_mining_bot", "42");
        assert!(text.contains("https://t.me/drx_mining_bot?start=ref_42"));
    }
}
