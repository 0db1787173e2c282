//! Telegram bot integration and handlers

pub mod bot;
pub mod commands;
pub mod handlers;
pub mod launch;
pub mod notifications;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
