//! Referral ledger: the one business rule of the bot.
//!
//! Awards a fixed bonus to a referrer the first time a specific referred
//! user is credited. Uniqueness of the (referrer, referred) pair is enforced
//! by the `referrals` UNIQUE constraint, never by a prior read: two
//! near-simultaneous /start invocations for the same pair would both pass a
//! read-then-write check. A constraint violation on insert is the
//! authoritative "already credited" signal.

use rusqlite::TransactionBehavior;

use crate::core::config;
use crate::core::error::AppResult;
use crate::core::utils::now_millis;
use crate::storage::db::DbConnection;

/// Outcome of a referral application attempt.
///
/// Skips are expected results, not errors: a missing or duplicate referral
/// never blocks the enclosing registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    /// Record inserted and referrer credited.
    Applied,
    /// Referrer and referred are the same account.
    SkippedSelfReferral,
    /// No account exists for the referrer id.
    SkippedReferrerMissing,
    /// The pair was already credited earlier; idempotent no-op.
    SkippedAlreadyCredited,
}

impl ReferralOutcome {
    pub fn is_applied(self) -> bool {
        self == ReferralOutcome::Applied
    }
}

/// Count and total earnings of a referrer, for statistics display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralSummary {
    pub count: i64,
    pub total_earned_milli: i64,
}

/// Credit `referrer_id` for bringing in `referred_id`, at most once per pair.
///
/// The record insert and the balance credit happen in one immediate
/// transaction: either both are visible afterwards or neither is. A crash
/// mid-way can never leave the referral recorded without the bonus paid, or
/// vice versa.
///
/// Preconditions, evaluated in order:
/// 1. no self-referral;
/// 2. the referrer account exists;
/// 3. no record for the pair yet (checked by the UNIQUE constraint at
///    insert time).
pub fn apply_referral(
    conn: &mut DbConnection,
    referrer_id: &str,
    referred_id: &str,
) -> AppResult<ReferralOutcome> {
    if referrer_id == referred_id {
        return Ok(ReferralOutcome::SkippedSelfReferral);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let referrer_exists: bool = tx.query_row(
        "SELECT COUNT(*) FROM users WHERE id = ?1",
        &[&referrer_id as &dyn rusqlite::ToSql],
        |row| Ok(row.get::<_, i64>(0)? > 0),
    )?;
    if !referrer_exists {
        // Dropping the transaction rolls it back.
        return Ok(ReferralOutcome::SkippedReferrerMissing);
    }

    let inserted = tx.execute(
        "INSERT INTO referrals (referrer_id, referred_id, earned_milli, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        &[
            &referrer_id as &dyn rusqlite::ToSql,
            &referred_id as &dyn rusqlite::ToSql,
            &config::referral::BONUS_MILLI as &dyn rusqlite::ToSql,
            &now_millis() as &dyn rusqlite::ToSql,
        ],
    );
    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Ok(ReferralOutcome::SkippedAlreadyCredited);
        }
        Err(e) => return Err(e.into()),
    }

    tx.execute(
        "UPDATE users SET
            balance_milli = balance_milli + ?1,
            total_earned_milli = total_earned_milli + ?1,
            referral_count = referral_count + 1,
            xp = xp + ?2
         WHERE id = ?3",
        &[
            &config::referral::BONUS_MILLI as &dyn rusqlite::ToSql,
            &config::referral::XP_REWARD as &dyn rusqlite::ToSql,
            &referrer_id as &dyn rusqlite::ToSql,
        ],
    )?;

    tx.commit()?;
    Ok(ReferralOutcome::Applied)
}

/// Referrer-scoped aggregate over the ledger, used by /stats only.
pub fn referral_summary(conn: &DbConnection, referrer_id: &str) -> AppResult<ReferralSummary> {
    let summary = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(earned_milli), 0)
         FROM referrals WHERE referrer_id = ?1",
        &[&referrer_id as &dyn rusqlite::ToSql],
        |row| {
            Ok(ReferralSummary {
                count: row.get(0)?,
                total_earned_milli: row.get(1)?,
            })
        },
    )?;
    Ok(summary)
}
