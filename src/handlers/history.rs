// src/handlers/history.rs
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use log::{error, info};
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::db::DbStore;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}

/// Returns ledger rows with date >= today - days (default 90),
/// ascending by date.
pub async fn get_history(
    query: HistoryQuery,
    db: Arc<DbStore>,
    tz: Tz,
) -> Result<Json, Rejection> {
    let days = query.days.unwrap_or(90);
    if days < 0 {
        return Err(warp::reject::custom(ApiError::validation_error(
            "days must not be negative",
        )));
    }

    info!("Handling history request for the last {} days", days);

    let today = Utc::now().with_timezone(&tz).date_naive();
    let cutoff = today - Duration::days(days);

    let records = db.history_range(cutoff, today).await.map_err(|e| {
        error!("Failed to query history: {}", e);
        warp::reject::custom(ApiError::database_error(e.to_string()))
    })?;

    Ok(warp::reply::json(&records))
}
