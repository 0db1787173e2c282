use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Base URL of the DRX Mining web app
/// Read from WEBAPP_URL environment variable
/// The launch URL handed to players is built on top of this base
pub static WEBAPP_URL: Lazy<String> =
    Lazy::new(|| env::var("WEBAPP_URL").unwrap_or_else(|_| "https://drx-mining.app".to_string()));

/// Announcement channel linked from the /start keyboard
/// Read from CHANNEL_URL environment variable; unset hides the button
pub static CHANNEL_URL: Lazy<Option<String>> = Lazy::new(|| env::var("CHANNEL_URL").ok());

/// Chat ID that receives new-user notifications
/// Read from ADMIN_CHAT_ID environment variable; unset disables notifications
pub static ADMIN_CHAT_ID: Lazy<Option<i64>> =
    Lazy::new(|| env::var("ADMIN_CHAT_ID").ok().and_then(|v| v.parse().ok()));

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: drxbot.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "drxbot.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: drxbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "drxbot.log".to_string()));

/// Referral ledger configuration
pub mod referral {
    /// Bonus credited to the referrer per distinct referred user,
    /// in thousandths of a DRX (200 DRX)
    pub const BONUS_MILLI: i64 = 200_000;

    /// XP awarded to the referrer alongside the bonus
    pub const XP_REWARD: i64 = 60;
}

/// Defaults for freshly created accounts; gameplay mutates these from the web app
pub mod mining {
    /// Starting mining rate in DRX per second
    pub const DEFAULT_RATE: f64 = 0.001;

    /// Starting minimum claim interval in seconds
    pub const DEFAULT_MIN_CLAIM_SECS: i64 = 1800;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
