// src/handlers/ath.rs
use log::{error, info};
use serde_json::json;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::db::DbStore;

use super::error::ApiError;

pub async fn get_ath(db: Arc<DbStore>) -> Result<Json, Rejection> {
    info!("Handling request to get the all-time high");

    let state = db.get_ath().await.map_err(|e| {
        error!("Failed to read the all-time high: {}", e);
        warp::reject::custom(ApiError::database_error(e.to_string()))
    })?;

    Ok(warp::reply::json(&json!({ "value": state.value })))
}
