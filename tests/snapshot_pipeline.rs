// tests/snapshot_pipeline.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use nova_networth::models::BalanceSnapshot;
use nova_networth::services::ath::AthTracker;
use nova_networth::services::db::DbStore;
use nova_networth::services::plaid::{AccountBalance, BalanceSource, FetchError};
use nova_networth::services::snapshot::SnapshotService;

/// Balance source keyed by access token. Unknown tokens fail the way a
/// revoked credential would.
struct FixtureSource {
    accounts: HashMap<String, Vec<AccountBalance>>,
}

impl FixtureSource {
    fn new(entries: &[(&str, Vec<AccountBalance>)]) -> Arc<Self> {
        let mut accounts = HashMap::new();
        for (token, accts) in entries {
            accounts.insert(token.to_string(), accts.clone());
        }
        Arc::new(FixtureSource { accounts })
    }
}

#[async_trait]
impl BalanceSource for FixtureSource {
    async fn get_balances(&self, access_token: &str) -> Result<Vec<AccountBalance>, FetchError> {
        match self.accounts.get(access_token) {
            Some(accounts) => Ok(accounts.clone()),
            None => Err(FetchError::Auth("ITEM_LOGIN_REQUIRED".to_string())),
        }
    }
}

fn checking(amount: f64) -> Vec<AccountBalance> {
    vec![AccountBalance {
        subtype: Some("checking".to_string()),
        current: Some(amount),
    }]
}

fn ira(amount: f64) -> Vec<AccountBalance> {
    vec![AccountBalance {
        subtype: Some("ira".to_string()),
        current: Some(amount),
    }]
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn open_store(dir: &TempDir) -> Arc<DbStore> {
    let path = dir.path().join("nova.db");
    let url = format!("sqlite://{}", path.display());
    Arc::new(DbStore::new(&url).await.expect("failed to open test store"))
}

#[tokio::test]
async fn ath_starts_at_zero_with_no_date() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;

    let tracker = AthTracker::new(db);
    let state = tracker.current().await.unwrap();

    assert_eq!(state.value, 0.0);
    assert_eq!(state.date, None);
}

#[tokio::test]
async fn first_run_marks_all_time_high() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;
    db.upsert_credential("wells_fargo", "wf-500").await.unwrap();

    let source = FixtureSource::new(&[("wf-500", checking(500.0))]);
    let snapshots = SnapshotService::new(db.clone(), source);

    let balances = snapshots.run_daily_snapshot(day(2025, 6, 1)).await.unwrap();
    assert_eq!(balances.net_worth, 500.0);

    let ath = db.get_ath().await.unwrap();
    assert_eq!(ath.value, 500.0);
    assert_eq!(ath.date, Some(day(2025, 6, 1)));

    let records = db.history_range(day(2025, 1, 1), day(2025, 12, 31)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_ath);
    assert_eq!(records[0].net_worth, 500.0);
}

#[tokio::test]
async fn tie_appends_second_row_without_advancing() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;
    db.upsert_credential("wells_fargo", "wf-500").await.unwrap();

    let source = FixtureSource::new(&[("wf-500", checking(500.0))]);
    let snapshots = SnapshotService::new(db.clone(), source);

    snapshots.run_daily_snapshot(day(2025, 6, 1)).await.unwrap();
    snapshots.run_daily_snapshot(day(2025, 6, 1)).await.unwrap();

    // Same day twice: two rows, no daily dedup
    let records = db.history_range(day(2025, 1, 1), day(2025, 12, 31)).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].is_ath);
    assert!(!records[1].is_ath);

    let ath = db.get_ath().await.unwrap();
    assert_eq!(ath.value, 500.0);
    assert_eq!(ath.date, Some(day(2025, 6, 1)));
}

#[tokio::test]
async fn strict_increase_advances_again() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;
    db.upsert_credential("wells_fargo", "wf-500").await.unwrap();

    let source = FixtureSource::new(&[
        ("wf-500", checking(500.0)),
        ("wf-800", checking(800.0)),
    ]);
    let snapshots = SnapshotService::new(db.clone(), source);

    snapshots.run_daily_snapshot(day(2025, 6, 1)).await.unwrap();

    // Re-linking swaps the token, and with it the reported balance
    db.upsert_credential("wells_fargo", "wf-800").await.unwrap();
    snapshots.run_daily_snapshot(day(2025, 6, 2)).await.unwrap();

    let ath = db.get_ath().await.unwrap();
    assert_eq!(ath.value, 800.0);
    assert_eq!(ath.date, Some(day(2025, 6, 2)));

    let records = db.history_range(day(2025, 1, 1), day(2025, 12, 31)).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].is_ath);
    assert!(records[1].is_ath);
}

#[tokio::test]
async fn drop_then_recover_flags_only_genuine_highs() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;
    db.upsert_credential("wells_fargo", "wf-500").await.unwrap();

    let source = FixtureSource::new(&[
        ("wf-500", checking(500.0)),
        ("wf-300", checking(300.0)),
        ("wf-800", checking(800.0)),
    ]);
    let snapshots = SnapshotService::new(db.clone(), source);

    snapshots.run_daily_snapshot(day(2025, 6, 1)).await.unwrap();
    db.upsert_credential("wells_fargo", "wf-300").await.unwrap();
    snapshots.run_daily_snapshot(day(2025, 6, 2)).await.unwrap();
    db.upsert_credential("wells_fargo", "wf-800").await.unwrap();
    snapshots.run_daily_snapshot(day(2025, 6, 3)).await.unwrap();
    snapshots.run_daily_snapshot(day(2025, 6, 4)).await.unwrap();

    let records = db.history_range(day(2025, 1, 1), day(2025, 12, 31)).await.unwrap();
    assert_eq!(records.len(), 4);

    let flags: Vec<bool> = records.iter().map(|r| r.is_ath).collect();
    assert_eq!(flags, vec![true, false, true, false]);

    // The maximal net worth is flagged at its first occurrence only
    let ath = db.get_ath().await.unwrap();
    assert_eq!(ath.value, 800.0);
    assert_eq!(ath.date, Some(day(2025, 6, 3)));
}

#[tokio::test]
async fn failed_institution_is_isolated() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;
    db.upsert_credential("wells_fargo", "wf-revoked").await.unwrap();
    db.upsert_credential("vanguard", "vg-2000").await.unwrap();

    // wf-revoked is unknown to the source, so that fetch fails
    let source = FixtureSource::new(&[("vg-2000", ira(2000.0))]);
    let snapshots = SnapshotService::new(db.clone(), source);

    let balances = snapshots.run_daily_snapshot(day(2025, 6, 1)).await.unwrap();

    assert_eq!(balances.wells_fargo_checking, 0.0);
    assert_eq!(balances.wells_fargo_credit, 0.0);
    assert_eq!(balances.vanguard, 2000.0);
    assert_eq!(balances.net_worth, 2000.0);

    let records = db.history_range(day(2025, 1, 1), day(2025, 12, 31)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_ath);
}

#[tokio::test]
async fn history_window_filters_and_orders_ascending() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;

    let mut snapshot = BalanceSnapshot::default();
    snapshot.wells_fargo_checking = 100.0;
    snapshot.compute_net_worth();

    // Inserted out of date order on purpose
    db.append_snapshot(day(2025, 3, 20), &snapshot, false).await.unwrap();
    db.append_snapshot(day(2025, 1, 1), &snapshot, false).await.unwrap();
    db.append_snapshot(day(2025, 3, 1), &snapshot, false).await.unwrap();

    let records = db.history_range(day(2025, 3, 1), day(2025, 12, 31)).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date, day(2025, 3, 1));
    assert_eq!(records[1].date, day(2025, 3, 20));
}

#[tokio::test]
async fn ledger_grows_append_only_across_runs() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;
    db.upsert_credential("wells_fargo", "wf-500").await.unwrap();

    let source = FixtureSource::new(&[("wf-500", checking(500.0))]);
    let snapshots = SnapshotService::new(db.clone(), source);

    for d in 1..=5 {
        snapshots.run_daily_snapshot(day(2025, 6, d)).await.unwrap();
    }

    let records = db.history_range(day(2025, 1, 1), day(2025, 12, 31)).await.unwrap();
    assert_eq!(records.len(), 5);
    for pair in records.windows(2) {
        assert!(pair[0].id < pair[1].id);
        assert!(pair[0].date <= pair[1].date);
    }
}

#[tokio::test]
async fn upsert_credential_overwrites_by_institution() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;

    db.upsert_credential("wells_fargo", "first-token").await.unwrap();
    db.upsert_credential("wells_fargo", "second-token").await.unwrap();
    db.upsert_credential("vanguard", "vg-token").await.unwrap();

    let credentials = db.list_credentials().await.unwrap();
    assert_eq!(credentials.len(), 2);

    let wf = credentials
        .iter()
        .find(|c| c.institution == "wells_fargo")
        .unwrap();
    assert_eq!(wf.access_token, "second-token");
}

#[tokio::test]
async fn tracker_tie_returns_false_and_keeps_date() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir).await;
    let tracker = AthTracker::new(db.clone());

    assert!(tracker.maybe_advance(500.0, day(2025, 6, 1)).await.unwrap());
    assert!(!tracker.maybe_advance(500.0, day(2025, 6, 2)).await.unwrap());
    assert!(!tracker.maybe_advance(499.99, day(2025, 6, 3)).await.unwrap());

    let state = tracker.current().await.unwrap();
    assert_eq!(state.value, 500.0);
    assert_eq!(state.date, Some(day(2025, 6, 1)));
}
