// src/routes.rs
use std::sync::Arc;
use warp::reject::Rejection;
use chrono_tz::Tz;
use crate::handlers::{ath::get_ath, history::get_history, history::HistoryQuery,
                     link::create_link_token, link::exchange_public_token,
                     refresh::refresh_now};
use crate::services::db::DbStore;
use crate::services::plaid::PlaidClient;
use crate::services::snapshot::SnapshotService;
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

// Add recovery handling for our custom errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status();
        message = api_error.message.clone();
    } else if let Some(body_error) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = body_error.to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    db: Arc<DbStore>,
    plaid: Arc<PlaidClient>,
    snapshots: Arc<SnapshotService>,
    tz: Tz,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let db_filter = warp::any().map(move || db.clone());
    let plaid_filter = warp::any().map(move || plaid.clone());
    let snapshot_filter = warp::any().map(move || snapshots.clone());
    let tz_filter = warp::any().map(move || tz);

    let link_token_route = warp::path!("api" / "link" / "token")
        .and(warp::post())
        .and(plaid_filter.clone())
        .and_then(create_link_token);

    let link_exchange_route = warp::path!("api" / "link" / "exchange")
        .and(warp::post())
        .and(warp::body::json())
        .and(plaid_filter.clone())
        .and(db_filter.clone())
        .and_then(exchange_public_token);

    let refresh_route = warp::path!("api" / "refresh")
        .and(warp::post())
        .and(snapshot_filter.clone())
        .and(tz_filter.clone())
        .and_then(refresh_now);

    let history_route = warp::path!("api" / "history")
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(db_filter.clone())
        .and(tz_filter.clone())
        .and_then(get_history);

    let ath_route = warp::path!("api" / "ath")
        .and(warp::get())
        .and(db_filter.clone())
        .and_then(get_ath);

    info!("All routes configured successfully.");

    link_token_route
        .or(link_exchange_route)
        .or(refresh_route)
        .or(history_route)
        .or(ath_route)
        .recover(handle_rejection)
}
