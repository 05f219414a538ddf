// src/services/snapshot.rs
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::BalanceSnapshot;
use crate::BoxError;

use super::aggregator::aggregate;
use super::ath::AthTracker;
use super::db::DbStore;
use super::plaid::BalanceSource;

/// Composes aggregation, ATH tracking, and the ledger append into one
/// linear pipeline. Both the manual refresh and the scheduled job run
/// through here; `run_lock` serializes concurrent triggers so the ATH
/// check-then-set never interleaves.
pub struct SnapshotService {
    db: Arc<DbStore>,
    source: Arc<dyn BalanceSource>,
    ath: AthTracker,
    run_lock: Mutex<()>,
}

impl SnapshotService {
    pub fn new(db: Arc<DbStore>, source: Arc<dyn BalanceSource>) -> Self {
        let ath = AthTracker::new(db.clone());
        SnapshotService {
            db,
            source,
            ath,
            run_lock: Mutex::new(()),
        }
    }

    /// Runs one snapshot for the given calendar date. The date is an
    /// explicit input so callers derive it from the configured
    /// timezone and tests pin it. Per-institution fetch failures are
    /// absorbed by the aggregator; storage failures propagate.
    pub async fn run_daily_snapshot(&self, date: NaiveDate) -> Result<BalanceSnapshot, BoxError> {
        let _running = self.run_lock.lock().await;

        let credentials = self.db.list_credentials().await?;
        let (balances, fetches) = aggregate(self.source.as_ref(), &credentials).await;

        let failed = fetches.iter().filter(|f| f.outcome.is_err()).count();
        if failed > 0 {
            warn!(
                "{} of {} institutions failed this cycle; their slots stay at zero",
                failed,
                fetches.len()
            );
        }

        let is_ath = self.ath.maybe_advance(balances.net_worth, date).await?;
        let record = self.db.append_snapshot(date, &balances, is_ath).await?;

        info!(
            "{}: ${:.2}{}",
            record.date,
            record.net_worth,
            if record.is_ath { " (new all-time high)" } else { "" }
        );

        Ok(balances)
    }
}
