//! Registration service consumed by the command handlers.
//!
//! The referral bonus is strictly best-effort relative to account creation:
//! a missing or invalid referrer never blocks onboarding the new user.

use crate::core::error::{AppError, AppResult};
use crate::storage::db::{self, Account, DbConnection, NewAccount};
use crate::storage::ledger::{self, ReferralOutcome};

/// Point lookup used to branch "new vs returning user" and render /stats.
pub fn lookup_account(conn: &DbConnection, id: &str) -> AppResult<Option<Account>> {
    db::get_account(conn, id)
}

/// Like [`lookup_account`] but treats absence as [`AppError::NotFound`],
/// for call sites that require an existing account. Storage failures stay
/// distinct so callers never render them as "user not registered".
pub fn require_account(conn: &DbConnection, id: &str) -> AppResult<Account> {
    lookup_account(conn, id)?.ok_or_else(|| AppError::NotFound(id.to_string()))
}

/// Create an account and, when a referrer is named, apply the referral.
///
/// Account creation is authoritative: its errors (including
/// `DuplicateAccount`) propagate to the caller. The referral step only
/// logs; every skip reason is distinguished so "already credited" (expected
/// under duplicate webhook delivery) doesn't read like a data problem.
pub fn register_account(conn: &mut DbConnection, profile: &NewAccount) -> AppResult<Account> {
    let account = db::create_account(conn, profile)?;

    if let Some(referrer_id) = profile.referred_by.as_deref() {
        match ledger::apply_referral(conn, referrer_id, &profile.id) {
            Ok(ReferralOutcome::Applied) => {
                log::info!("Referral applied: {} -> {}", referrer_id, profile.id);
            }
            Ok(ReferralOutcome::SkippedAlreadyCredited) => {
                log::info!(
                    "Referral already credited: {} -> {}, skipping",
                    referrer_id,
                    profile.id
                );
            }
            Ok(ReferralOutcome::SkippedReferrerMissing) => {
                log::warn!(
                    "Referral skipped: referrer {} does not exist (referred {})",
                    referrer_id,
                    profile.id
                );
            }
            Ok(ReferralOutcome::SkippedSelfReferral) => {
                log::warn!("Referral skipped: self-referral by {}", profile.id);
            }
            Err(e) => {
                log::error!(
                    "Referral processing failed for {} -> {}: {}",
                    referrer_id,
                    profile.id,
                    e
                );
            }
        }
    }

    Ok(account)
}
