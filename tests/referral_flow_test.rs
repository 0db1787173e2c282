//! Integration tests for the account store and referral ledger
//!
//! Run with: cargo test --test referral_flow_test

use std::collections::HashSet;
use std::thread;

use drxbot::core::accounts::{lookup_account, register_account};
use drxbot::core::config;
use drxbot::core::AppError;
use drxbot::storage::db::NewAccount;
use drxbot::storage::ledger::{apply_referral, referral_summary, ReferralOutcome};
use drxbot::storage::{create_pool, get_connection, DbPool};
use tempfile::TempDir;

fn test_pool() -> (DbPool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    (pool, dir)
}

fn profile(id: &str) -> NewAccount {
    NewAccount {
        id: id.to_string(),
        first_name: "Player".to_string(),
        last_name: String::new(),
        avatar_url: String::new(),
        referred_by: None,
    }
}

fn referred(id: &str, referrer: &str) -> NewAccount {
    NewAccount {
        referred_by: Some(referrer.to_string()),
        ..profile(id)
    }
}

#[test]
fn auth_keys_are_nonempty_unique_and_stable() {
    let (pool, _dir) = test_pool();
    let mut conn = get_connection(&pool).unwrap();

    let mut keys = HashSet::new();
    for i in 0..20 {
        let id = format!("user{}", i);
        let account = register_account(&mut conn, &profile(&id)).unwrap();
        assert_eq!(account.auth_key.len(), 64);
        assert!(keys.insert(account.auth_key.clone()), "auth_key collision");

        // Lookups never change the credential.
        let fetched = lookup_account(&conn, &id).unwrap().unwrap();
        assert_eq!(fetched.auth_key, account.auth_key);
        let fetched_again = lookup_account(&conn, &id).unwrap().unwrap();
        assert_eq!(fetched_again.auth_key, account.auth_key);
    }
}

#[test]
fn referral_registration_credits_referrer_exactly_once() {
    let (pool, _dir) = test_pool();
    let mut conn = get_connection(&pool).unwrap();

    register_account(&mut conn, &profile("A")).unwrap();
    register_account(&mut conn, &referred("B", "A")).unwrap();

    let a = lookup_account(&conn, "A").unwrap().unwrap();
    assert_eq!(a.balance_milli, config::referral::BONUS_MILLI);
    assert_eq!(a.total_earned_milli, config::referral::BONUS_MILLI);
    assert_eq!(a.referral_count, 1);
    assert_eq!(a.xp, config::referral::XP_REWARD);

    let summary = referral_summary(&conn, "A").unwrap();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.total_earned_milli, config::referral::BONUS_MILLI);

    // A duplicate webhook delivery replays the referral; nothing moves.
    let outcome = apply_referral(&mut conn, "A", "B").unwrap();
    assert_eq!(outcome, ReferralOutcome::SkippedAlreadyCredited);

    let a = lookup_account(&conn, "A").unwrap().unwrap();
    assert_eq!(a.balance_milli, config::referral::BONUS_MILLI);
    assert_eq!(a.referral_count, 1);
    assert_eq!(referral_summary(&conn, "A").unwrap().count, 1);
}

#[test]
fn duplicate_registration_fails_without_side_effects() {
    let (pool, _dir) = test_pool();
    let mut conn = get_connection(&pool).unwrap();

    register_account(&mut conn, &profile("A")).unwrap();
    register_account(&mut conn, &referred("B", "A")).unwrap();

    let err = register_account(&mut conn, &referred("B", "A")).unwrap_err();
    assert!(matches!(err, AppError::DuplicateAccount(id) if id == "B"));

    let a = lookup_account(&conn, "A").unwrap().unwrap();
    assert_eq!(a.balance_milli, config::referral::BONUS_MILLI);
    assert_eq!(a.referral_count, 1);
}

#[test]
fn summary_scales_with_distinct_referrals() {
    let (pool, _dir) = test_pool();
    let mut conn = get_connection(&pool).unwrap();

    register_account(&mut conn, &profile("A")).unwrap();
    for i in 0..5 {
        register_account(&mut conn, &referred(&format!("friend{}", i), "A")).unwrap();
    }

    let summary = referral_summary(&conn, "A").unwrap();
    assert_eq!(summary.count, 5);
    assert_eq!(summary.total_earned_milli, 5 * config::referral::BONUS_MILLI);
}

#[test]
fn concurrent_referral_attempts_credit_exactly_once() {
    let (pool, _dir) = test_pool();

    {
        let conn = get_connection(&pool).unwrap();
        drxbot::storage::db::create_account(&conn, &profile("A")).unwrap();
        drxbot::storage::db::create_account(&conn, &profile("B")).unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
                let mut conn = get_connection(&pool).unwrap();
                apply_referral(&mut conn, "A", "B").unwrap()
            })
        })
        .collect();

    let outcomes: Vec<ReferralOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let applied = outcomes.iter().filter(|o| o.is_applied()).count();
    let skipped = outcomes
        .iter()
        .filter(|&&o| o == ReferralOutcome::SkippedAlreadyCredited)
        .count();
    assert_eq!(applied, 1, "exactly one concurrent attempt may win");
    assert_eq!(skipped, outcomes.len() - 1);

    let conn = get_connection(&pool).unwrap();
    let a = lookup_account(&conn, "A").unwrap().unwrap();
    assert_eq!(a.balance_milli, config::referral::BONUS_MILLI);
    assert_eq!(a.referral_count, 1);
    assert_eq!(a.xp, config::referral::XP_REWARD);
    assert_eq!(referral_summary(&conn, "A").unwrap().count, 1);
}

#[test]
fn concurrent_account_creation_admits_one_winner() {
    let (pool, _dir) = test_pool();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
                let conn = get_connection(&pool).unwrap();
                drxbot::storage::db::create_account(&conn, &profile("C"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1, "the primary key admits a single create");
    for result in &results {
        if let Err(e) = result {
            assert!(matches!(e, AppError::DuplicateAccount(id) if id == "C"));
        }
    }
}
