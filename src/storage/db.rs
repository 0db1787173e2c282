use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::Duration;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::now_millis;

/// A player account as stored in the `users` table.
///
/// `balance_milli` and `total_earned_milli` are kept in thousandths of a DRX
/// so the ledger never accumulates float error. The mining fields are owned
/// by the web app; the bot only reads them for /stats.
#[derive(Debug, Clone)]
pub struct Account {
    /// Opaque external identity (stringified Telegram ID), immutable
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: String,
    /// 256-bit hex credential for the web app launch URL; generated once
    /// at creation and never regenerated
    pub auth_key: String,
    pub balance_milli: i64,
    pub total_earned_milli: i64,
    pub xp: i64,
    pub level: i64,
    pub referral_count: i64,
    /// Back-reference to the referring account, set once at creation
    pub referred_by: Option<String>,
    pub is_mining: bool,
    pub mining_rate: f64,
    pub min_claim_time: i64,
    pub mining_speed_level: i64,
    pub claim_time_level: i64,
    pub mining_rate_level: i64,
    /// Millisecond UTC timestamps
    pub joined_at: i64,
    pub last_active: i64,
}

/// Profile fields supplied by the caller when registering a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: String,
    pub referred_by: Option<String>,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a pool of up to 10 connections and applies schema migrations
/// before handing the pool out. Every connection gets a generous busy
/// timeout so short write transactions from concurrent handlers queue
/// instead of failing.
///
/// # Arguments
///
/// * `database_path` - Path to the SQLite database file
pub fn create_pool(database_path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(Duration::from_secs(30)));
    let pool = Pool::builder().max_size(10).build(manager)?;

    let mut conn = pool.get()?;
    super::migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped, on every exit path.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Generates the per-account web-app credential: 32 bytes from the OS
/// CSPRNG, hex-encoded. Never log the result.
fn generate_auth_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, avatar_url, auth_key, \
     balance_milli, total_earned_milli, xp, level, referral_count, referred_by, \
     is_mining, mining_rate, min_claim_time, \
     mining_speed_level, claim_time_level, mining_rate_level, \
     joined_at, last_active";

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        avatar_url: row.get(3)?,
        auth_key: row.get(4)?,
        balance_milli: row.get(5)?,
        total_earned_milli: row.get(6)?,
        xp: row.get(7)?,
        level: row.get(8)?,
        referral_count: row.get(9)?,
        referred_by: row.get(10)?,
        is_mining: row.get::<_, i64>(11)? != 0,
        mining_rate: row.get(12)?,
        min_claim_time: row.get(13)?,
        mining_speed_level: row.get(14)?,
        claim_time_level: row.get(15)?,
        mining_rate_level: row.get(16)?,
        joined_at: row.get(17)?,
        last_active: row.get(18)?,
    })
}

/// Point lookup of an account by its primary key.
///
/// # Returns
///
/// `Ok(Some(Account))` if found, `Ok(None)` if not, or a database error.
pub fn get_account(conn: &DbConnection, id: &str) -> AppResult<Option<Account>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users WHERE id = ?1", ACCOUNT_COLUMNS))?;
    let mut rows = stmt.query(&[&id as &dyn rusqlite::ToSql])?;

    match rows.next()? {
        Some(row) => Ok(Some(account_from_row(row)?)),
        None => Ok(None),
    }
}

/// Inserts a new account row with a freshly generated `auth_key`, zeroed
/// ledger counters and gameplay defaults.
///
/// Uniqueness of the identity is enforced by the primary key, not by a
/// prior read: a constraint violation on insert is mapped to
/// [`AppError::DuplicateAccount`], so concurrent creation attempts for the
/// same identity cannot both succeed.
pub fn create_account(conn: &DbConnection, profile: &NewAccount) -> AppResult<Account> {
    let auth_key = generate_auth_key();
    let now = now_millis();

    let result = conn.execute(
        "INSERT INTO users (
            id, first_name, last_name, avatar_url, auth_key,
            balance_milli, total_earned_milli, xp, level, referral_count,
            referred_by, is_mining, mining_rate, min_claim_time,
            mining_speed_level, claim_time_level, mining_rate_level,
            joined_at, last_active
        ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0, 1, 0, ?6, 0, ?7, ?8, 1, 1, 1, ?9, ?9)",
        &[
            &profile.id as &dyn rusqlite::ToSql,
            &profile.first_name as &dyn rusqlite::ToSql,
            &profile.last_name as &dyn rusqlite::ToSql,
            &profile.avatar_url as &dyn rusqlite::ToSql,
            &auth_key as &dyn rusqlite::ToSql,
            &profile.referred_by as &dyn rusqlite::ToSql,
            &config::mining::DEFAULT_RATE as &dyn rusqlite::ToSql,
            &config::mining::DEFAULT_MIN_CLAIM_SECS as &dyn rusqlite::ToSql,
            &now as &dyn rusqlite::ToSql,
        ],
    );

    match result {
        Ok(_) => Ok(Account {
            id: profile.id.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            auth_key,
            balance_milli: 0,
            total_earned_milli: 0,
            xp: 0,
            level: 1,
            referral_count: 0,
            referred_by: profile.referred_by.clone(),
            is_mining: false,
            mining_rate: config::mining::DEFAULT_RATE,
            min_claim_time: config::mining::DEFAULT_MIN_CLAIM_SECS,
            mining_speed_level: 1,
            claim_time_level: 1,
            mining_rate_level: 1,
            joined_at: now,
            last_active: now,
        }),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(AppError::DuplicateAccount(profile.id.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Updates the liveness timestamp. A no-op if the account is absent.
pub fn touch_last_active(conn: &DbConnection, id: &str, timestamp: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET last_active = ?1 WHERE id = ?2",
        &[&timestamp as &dyn rusqlite::ToSql, &id as &dyn rusqlite::ToSql],
    )?;
    Ok(())
}
