// src/services/ath.rs
use chrono::NaiveDate;
use std::sync::Arc;

use crate::models::AthState;
use crate::BoxError;

use super::db::DbStore;

/// Tracks the single highest net worth ever observed. The value lives
/// in the store's singleton ath row; this wrapper owns the comparison
/// semantics: strict greater-than, ties never advance.
pub struct AthTracker {
    db: Arc<DbStore>,
}

impl AthTracker {
    pub fn new(db: Arc<DbStore>) -> Self {
        AthTracker { db }
    }

    /// {0, None} until the first snapshot ever advances it.
    pub async fn current(&self) -> Result<AthState, BoxError> {
        self.db.get_ath().await
    }

    /// Advances the all-time high iff `value` strictly exceeds the
    /// stored one. The returned bool doubles as the is_ath flag for
    /// the record being written, so flag and state cannot diverge.
    pub async fn maybe_advance(&self, value: f64, date: NaiveDate) -> Result<bool, BoxError> {
        let prior = self.db.get_ath().await?;
        if value > prior.value {
            self.db.set_ath(value, date).await?;
            return Ok(true);
        }
        Ok(false)
    }
}
