// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::NaiveDate;

/// One linked institution: the opaque access token the aggregation
/// provider handed back at link time. Unique by institution name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub institution: String,
    pub access_token: String,
}

/// The four balance slots for one aggregation cycle plus the derived
/// net worth. Credit is a liability and is subtracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub wells_fargo_checking: f64,
    pub wells_fargo_credit: f64,
    pub robinhood: f64,
    pub vanguard: f64,
    pub net_worth: f64,
}

impl BalanceSnapshot {
    pub fn compute_net_worth(&mut self) {
        self.net_worth = self.wells_fargo_checking + self.robinhood + self.vanguard
            - self.wells_fargo_credit;
    }
}

/// One appended ledger row. Immutable once written; the ledger allows
/// multiple rows per calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub wells_fargo_checking: f64,
    pub wells_fargo_credit: f64,
    pub robinhood: f64,
    pub vanguard: f64,
    pub net_worth: f64,
    pub is_ath: bool,
}

/// Singleton all-time-high state. `date` is None until the first
/// snapshot has ever advanced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthState {
    pub value: f64,
    pub date: Option<NaiveDate>,
}

impl Default for AthState {
    fn default() -> Self {
        AthState { value: 0.0, date: None }
    }
}
