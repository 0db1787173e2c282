//! SQLite-backed persistence: account store, referral ledger, migrations

pub mod db;
pub mod ledger;
pub mod migrations;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
