//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use cadence_core::db::Database;
use cadence_core::models::{BillingCycle, Category, Subscription, SubscriptionState};
use cadence_core::{EngineConfig, RangeKind};
use chrono::{Duration, Utc};

use crate::commands::{self, truncate, NewSubscriptionArgs};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn add_args(name: &str, price: f64) -> NewSubscriptionArgs {
    NewSubscriptionArgs {
        name: name.to_string(),
        price,
        cycle: "monthly".to_string(),
        category: "streaming".to_string(),
        next: None,
        trial_days: None,
        price_after_trial: None,
        convert: false,
    }
}

fn insert_overdue(db: &Database, name: &str, days_ago: i64) -> i64 {
    let sub = Subscription::new(
        name,
        9.99,
        BillingCycle::Weekly,
        Utc::now() - Duration::days(days_ago),
    )
    .with_category(Category::Software);
    db.insert_subscription(&sub).unwrap()
}

// ========== Shared Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Netflix", 20), "Netflix");
    assert_eq!(truncate("A very long subscription name", 10), "A very ...");
    assert_eq!(truncate("Ünïcödé ñämé here", 8), "Ünïcö...");
}

#[test]
fn test_open_db_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cadence.db");

    let db = commands::open_db(&path).unwrap();
    assert!(path.exists());
    assert!(db.all_subscriptions().unwrap().is_empty());
}

#[test]
fn test_load_config_explicit_path() {
    let dir = tempfile::tempdir().unwrap();

    // Missing file falls back to defaults
    let missing = dir.path().join("missing.toml");
    let config = commands::load_config(Some(&missing)).unwrap();
    assert_eq!(config.due_soon_days, EngineConfig::default().due_soon_days);

    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[billing]\ndue_soon_days = 14\n\n[forecast]\nmonths = 3\n").unwrap();
    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.due_soon_days, 14);
    assert_eq!(config.forecast_months, 3);
}

#[test]
fn test_load_config_rejects_bad_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[billing\n").unwrap();
    assert!(commands::load_config(Some(&path)).is_err());
}

#[test]
fn test_resolve_range() {
    assert_eq!(commands::resolve_range("quarter").unwrap().kind, RangeKind::Quarter);
    assert_eq!(commands::resolve_range("WEEK").unwrap().kind, RangeKind::Week);
    assert!(commands::resolve_range("custom").is_err());
    assert!(commands::resolve_range("fortnight").is_err());
}

// ========== Subscription Command Tests ==========

#[test]
fn test_build_subscription_defaults_to_one_cycle_out() {
    let sub = commands::build_subscription(&add_args("Netflix", 15.49)).unwrap();

    assert_eq!(sub.billing_cycle, BillingCycle::Monthly);
    assert_eq!(sub.category, Category::Streaming);
    assert!(sub.next_billing_date > Utc::now() + Duration::days(27));
    assert!(sub.next_billing_date < Utc::now() + Duration::days(32));
    assert!(!sub.is_free_trial);
}

#[test]
fn test_build_subscription_explicit_next_date() {
    let mut args = add_args("Netflix", 15.49);
    args.next = Some("2026-12-01".to_string());
    let sub = commands::build_subscription(&args).unwrap();
    assert_eq!(sub.next_billing_date.format("%Y-%m-%d").to_string(), "2026-12-01");

    args.next = Some("12/01/2026".to_string());
    assert!(commands::build_subscription(&args).is_err());
}

#[test]
fn test_build_subscription_trial() {
    let mut args = add_args("Disney+", 13.99);
    args.trial_days = Some(7);
    args.price_after_trial = Some(15.99);
    args.convert = true;

    let sub = commands::build_subscription(&args).unwrap();
    assert!(sub.is_free_trial);
    assert!(sub.will_convert_to_paid);
    assert_eq!(sub.price_after_trial, Some(15.99));
    assert_eq!(sub.state(), SubscriptionState::Trialing);
    assert_eq!(sub.trial_end_date.map(|d| d.date_naive()), Some(sub.next_billing_date.date_naive()));

    args.trial_days = Some(0);
    assert!(commands::build_subscription(&args).is_err());

    args.trial_days = Some(100_000_000);
    assert!(commands::build_subscription(&args).is_err());

    args.trial_days = Some(i64::MAX);
    args.next = Some("2026-12-01".to_string());
    assert!(commands::build_subscription(&args).is_err());
}

#[test]
fn test_build_subscription_rejects_bad_input() {
    assert!(commands::build_subscription(&add_args("Netflix", 0.0)).is_err());
    assert!(commands::build_subscription(&add_args("   ", 5.0)).is_err());

    let mut args = add_args("Netflix", 15.49);
    args.cycle = "hourly".to_string();
    assert!(commands::build_subscription(&args).is_err());

    let mut args = add_args("Netflix", 15.49);
    args.category = "snacks".to_string();
    assert!(commands::build_subscription(&args).is_err());
}

#[test]
fn test_cmd_add_and_list() {
    let db = setup_test_db();
    commands::cmd_add(&db, &add_args("Netflix", 15.49)).unwrap();
    commands::cmd_add(&db, &add_args("Spotify", 11.99)).unwrap();

    let subs = db.all_subscriptions().unwrap();
    assert_eq!(subs.len(), 2);
    assert!(subs.iter().any(|s| s.name == "Spotify"));

    assert!(commands::cmd_list(&db, false).is_ok());
    assert!(commands::cmd_list(&db, true).is_ok());
}

#[test]
fn test_cmd_add_invalid_writes_nothing() {
    let db = setup_test_db();
    assert!(commands::cmd_add(&db, &add_args("Netflix", -1.0)).is_err());
    assert!(db.all_subscriptions().unwrap().is_empty());
}

#[test]
fn test_cmd_record() {
    let db = setup_test_db();
    commands::cmd_record(
        &db,
        42.5,
        "Gym membership",
        Some("2026-10-01"),
        "fitness",
        true,
        vec!["health".to_string()],
    )
    .unwrap();

    let txs = db.all_transactions().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].category, Category::Fitness);
    assert!(txs[0].is_recurring);
    assert_eq!(txs[0].tags, vec!["health".to_string()]);
    assert_eq!(txs[0].date.to_string(), "2026-10-01");
}

#[test]
fn test_cmd_record_rejects_bad_date() {
    let db = setup_test_db();
    let result = commands::cmd_record(&db, 5.0, "Coffee", Some("yesterday"), "food", false, vec![]);
    assert!(result.is_err());
    assert!(db.all_transactions().unwrap().is_empty());
}

#[test]
fn test_cmd_use() {
    let db = setup_test_db();
    let id = db
        .insert_subscription(&Subscription::new(
            "Netflix",
            15.49,
            BillingCycle::Monthly,
            Utc::now() + Duration::days(5),
        ))
        .unwrap();

    commands::cmd_use(&db, id).unwrap();
    commands::cmd_use(&db, id).unwrap();

    let sub = db.get_subscription(id).unwrap().unwrap();
    assert_eq!(sub.usage_count, 2);
    assert!(sub.last_used_date.is_some());

    assert!(commands::cmd_use(&db, 999).is_err());
}

// ========== Billing Command Tests ==========

#[tokio::test]
async fn test_cmd_pause_resume_cancel() {
    let db = setup_test_db();
    let config = EngineConfig::default();
    let id = insert_overdue(&db, "Notion", -3);

    commands::cmd_pause(&db, &config, id).await.unwrap();
    let sub = db.get_subscription(id).unwrap().unwrap();
    assert_eq!(sub.state(), SubscriptionState::Paused);

    commands::cmd_resume(&db, &config, id).await.unwrap();
    let sub = db.get_subscription(id).unwrap().unwrap();
    assert_eq!(sub.state(), SubscriptionState::Active);

    commands::cmd_cancel(&db, &config, id).await.unwrap();
    let sub = db.get_subscription(id).unwrap().unwrap();
    assert_eq!(sub.state(), SubscriptionState::Cancelled);
    assert!(sub.cancellation_date.is_some());

    // Cancelled subscriptions cannot be paused
    assert!(commands::cmd_pause(&db, &config, id).await.is_err());
}

#[tokio::test]
async fn test_cmd_transition_unknown_id() {
    let db = setup_test_db();
    let config = EngineConfig::default();
    assert!(commands::cmd_pause(&db, &config, 42).await.is_err());
    assert!(commands::cmd_resume(&db, &config, 42).await.is_err());
    assert!(commands::cmd_cancel(&db, &config, 42).await.is_err());
}

#[tokio::test]
async fn test_cmd_set_price_records_history() {
    let db = setup_test_db();
    let config = EngineConfig::default();
    let id = insert_overdue(&db, "Notion", -3);

    commands::cmd_set_price(&db, &config, id, 12.99).await.unwrap();

    let sub = db.get_subscription(id).unwrap().unwrap();
    assert_eq!(sub.price, 12.99);

    let changes = db.price_changes(Some(id), None).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].old_price, 9.99);
    assert_eq!(changes[0].new_price, 12.99);
    assert!(!changes[0].detected_automatically);
}

#[tokio::test]
async fn test_cmd_set_price_rejects_invalid() {
    let db = setup_test_db();
    let config = EngineConfig::default();
    let id = insert_overdue(&db, "Notion", -3);

    assert!(commands::cmd_set_price(&db, &config, id, 0.0).await.is_err());
    assert!(commands::cmd_set_price(&db, &config, 999, 5.0).await.is_err());

    let sub = db.get_subscription(id).unwrap().unwrap();
    assert_eq!(sub.price, 9.99);
    assert!(db.price_changes(Some(id), None).unwrap().is_empty());
}

#[tokio::test]
async fn test_cmd_process_renews_overdue() {
    let db = setup_test_db();
    let config = EngineConfig::default();
    let id = insert_overdue(&db, "Notion", 20);

    commands::cmd_process(&db, &config, false).await.unwrap();

    let sub = db.get_subscription(id).unwrap().unwrap();
    assert!(sub.next_billing_date > Utc::now());
    assert!(sub.next_billing_date <= Utc::now() + Duration::days(7));

    // Second run has nothing to do
    commands::cmd_process(&db, &config, true).await.unwrap();
}

#[tokio::test]
async fn test_cmd_process_expires_trials() {
    let db = setup_test_db();
    let config = EngineConfig::default();
    let now = Utc::now();

    let converting = Subscription::new("Paramount+", 5.99, BillingCycle::Monthly, now)
        .with_trial(now - Duration::days(8), now - Duration::days(1), Some(7.99), true);
    let lapsing = Subscription::new("Peacock", 5.99, BillingCycle::Monthly, now)
        .with_trial(now - Duration::days(8), now - Duration::days(1), None, false);
    let converting_id = db.insert_subscription(&converting).unwrap();
    let lapsing_id = db.insert_subscription(&lapsing).unwrap();

    commands::cmd_process(&db, &config, false).await.unwrap();

    let converted = db.get_subscription(converting_id).unwrap().unwrap();
    assert!(!converted.is_free_trial);
    assert_eq!(converted.price, 7.99);

    let lapsed = db.get_subscription(lapsing_id).unwrap().unwrap();
    assert_eq!(lapsed.state(), SubscriptionState::Cancelled);
}

#[tokio::test]
async fn test_cmd_process_does_not_renew_lapsed_trial() {
    let db = setup_test_db();
    let config = EngineConfig::default();
    let ended = Utc::now() - Duration::days(2);

    // Billing date matches the trial end, as `add --trial-days` sets it
    let lapsing = Subscription::new("Peacock", 5.99, BillingCycle::Monthly, ended)
        .with_trial(ended - Duration::days(7), ended, None, false);
    let id = db.insert_subscription(&lapsing).unwrap();

    commands::cmd_process(&db, &config, false).await.unwrap();

    let lapsed = db.get_subscription(id).unwrap().unwrap();
    assert_eq!(lapsed.state(), SubscriptionState::Cancelled);
    assert_eq!(
        lapsed.next_billing_date.date_naive(),
        ended.date_naive()
    );
}

#[tokio::test]
async fn test_cmd_status() {
    let db = setup_test_db();
    insert_overdue(&db, "Notion", 2);
    assert!(commands::cmd_status(&db, &EngineConfig::default()).await.is_ok());
}

// ========== Report Command Tests ==========

#[tokio::test]
async fn test_report_commands_on_empty_db() {
    let db = setup_test_db();
    let config = EngineConfig::default();

    assert!(commands::cmd_trend(&db, config.clone(), "month", false).await.is_ok());
    assert!(commands::cmd_breakdown(&db, config.clone(), false).await.is_ok());
    assert!(commands::cmd_yoy(&db, config.clone(), false).await.is_ok());
    assert!(commands::cmd_forecast(&db, config.clone(), None, false).await.is_ok());
    assert!(commands::cmd_suggestions(&db, config.clone(), false).await.is_ok());
    assert!(commands::cmd_unused(&db, config.clone(), "savings", false).await.is_ok());
    assert!(commands::cmd_cancellations(&db, config, false).await.is_ok());
}

#[tokio::test]
async fn test_report_commands_with_data() {
    let db = setup_test_db();
    let config = EngineConfig::default();

    let stale = Subscription::new(
        "Old Gym",
        40.0,
        BillingCycle::Monthly,
        Utc::now() + Duration::days(10),
    )
    .with_category(Category::Fitness)
    .with_created_date(Utc::now() - Duration::days(200));
    db.insert_subscription(&stale).unwrap();
    commands::cmd_record(&db, 40.0, "Old Gym", None, "fitness", true, vec![]).unwrap();

    for json in [false, true] {
        assert!(commands::cmd_trend(&db, config.clone(), "year", json).await.is_ok());
        assert!(commands::cmd_breakdown(&db, config.clone(), json).await.is_ok());
        assert!(commands::cmd_yoy(&db, config.clone(), json).await.is_ok());
        assert!(commands::cmd_forecast(&db, config.clone(), Some(3), json).await.is_ok());
        assert!(commands::cmd_suggestions(&db, config.clone(), json).await.is_ok());
        assert!(commands::cmd_unused(&db, config.clone(), "90", json).await.is_ok());
        assert!(commands::cmd_cancellations(&db, config.clone(), json).await.is_ok());
    }
}

#[tokio::test]
async fn test_report_commands_reject_bad_arguments() {
    let db = setup_test_db();
    let config = EngineConfig::default();

    assert!(commands::cmd_trend(&db, config.clone(), "decade", false).await.is_err());
    assert!(commands::cmd_unused(&db, config.clone(), "someday", false).await.is_err());
    assert!(commands::cmd_unused(&db, config, "100000000", false).await.is_err());
}
