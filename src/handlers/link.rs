// src/handlers/link.rs
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::db::DbStore;
use crate::services::plaid::PlaidClient;

use super::error::ApiError;

pub async fn create_link_token(plaid: Arc<PlaidClient>) -> Result<Json, Rejection> {
    info!("Handling request to create a link token");

    match plaid.create_link_token().await {
        Ok(token) => Ok(warp::reply::json(&token)),
        Err(e) => {
            error!("Failed to create link token: {}", e);
            Err(warp::reject::custom(ApiError::external_error(e.to_string())))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub public_token: Option<String>,
    pub institution: Option<String>,
}

/// Exchanges a public token from the link flow for an access token and
/// stores it. Both fields are validated before any provider call, so a
/// rejected request has no side effects.
pub async fn exchange_public_token(
    body: ExchangeRequest,
    plaid: Arc<PlaidClient>,
    db: Arc<DbStore>,
) -> Result<Json, Rejection> {
    let public_token = body
        .public_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| warp::reject::custom(ApiError::validation_error("public_token is required")))?;
    let institution = body
        .institution
        .filter(|i| !i.is_empty())
        .ok_or_else(|| warp::reject::custom(ApiError::validation_error("institution is required")))?;

    info!("Exchanging public token for {}", institution);

    let access_token = plaid.exchange_public_token(&public_token).await.map_err(|e| {
        error!("Token exchange failed for {}: {}", institution, e);
        warp::reject::custom(ApiError::external_error(e.to_string()))
    })?;

    db.upsert_credential(&institution, &access_token)
        .await
        .map_err(|e| {
            error!("Failed to store credential for {}: {}", institution, e);
            warp::reject::custom(ApiError::database_error(e.to_string()))
        })?;

    Ok(warp::reply::json(&json!({ "success": true })))
}
