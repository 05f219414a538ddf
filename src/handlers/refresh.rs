// src/handlers/refresh.rs
use chrono::Utc;
use chrono_tz::Tz;
use log::{error, info};
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::snapshot::SnapshotService;

use super::error::ApiError;

/// Operator-facing "refresh now": runs the snapshot pipeline for
/// today's date in the configured timezone and returns the snapshot.
pub async fn refresh_now(snapshots: Arc<SnapshotService>, tz: Tz) -> Result<Json, Rejection> {
    info!("Handling manual refresh request");

    let date = Utc::now().with_timezone(&tz).date_naive();
    match snapshots.run_daily_snapshot(date).await {
        Ok(balances) => Ok(warp::reply::json(&balances)),
        Err(e) => {
            error!("Manual snapshot run failed: {}", e);
            Err(warp::reject::custom(ApiError::database_error(e.to_string())))
        }
    }
}
