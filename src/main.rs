use chrono::Utc;
use chrono_tz::Tz;
use dotenv::dotenv;
use env_logger;
use log::{error, info, warn};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use warp::Filter;

use nova_networth::routes;
use nova_networth::services::db::DbStore;
use nova_networth::services::plaid::{BalanceSource, PlaidClient};
use nova_networth::services::snapshot::SnapshotService;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let port_str = env::var("PORT").unwrap_or_else(|_| {
        warn!("$PORT not set, defaulting to 3000");
        "3000".to_string()
    });

    let port: u16 = port_str.parse().expect("PORT must be a number");
    info!("Using PORT: {}", port);

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
        warn!("$DATABASE_URL not set, defaulting to sqlite://data.db");
        "sqlite://data.db".to_string()
    });

    // "Today" for snapshot dates; manual and scheduled runs must agree.
    let timezone: Tz = match env::var("SNAPSHOT_TIMEZONE") {
        Ok(name) => name
            .parse()
            .expect("SNAPSHOT_TIMEZONE must be a valid timezone name"),
        Err(_) => chrono_tz::UTC,
    };
    info!("Snapshot dates use timezone: {}", timezone);

    let db = Arc::new(
        DbStore::new(&database_url)
            .await
            .expect("Failed to initialize database"),
    );
    let plaid = Arc::new(
        PlaidClient::from_env().expect("PLAID_CLIENT_ID and PLAID_SECRET must be set"),
    );
    let snapshots = Arc::new(SnapshotService::new(
        db.clone(),
        plaid.clone() as Arc<dyn BalanceSource>,
    ));

    // Daily snapshot job; a failed run is logged and waits for the
    // next tick, never retried early.
    let schedule = env::var("SNAPSHOT_SCHEDULE").unwrap_or_else(|_| "0 0 6 * * *".to_string());
    let scheduler = JobScheduler::new()
        .await
        .expect("Failed to create the job scheduler");
    let job_snapshots = snapshots.clone();
    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let snapshots = job_snapshots.clone();
        Box::pin(async move {
            let date = Utc::now().with_timezone(&timezone).date_naive();
            match snapshots.run_daily_snapshot(date).await {
                Ok(balances) => {
                    info!("Scheduled snapshot stored, net worth ${:.2}", balances.net_worth)
                }
                Err(e) => error!("Scheduled snapshot run failed: {}", e),
            }
        })
    })
    .expect("SNAPSHOT_SCHEDULE must be a valid cron expression");
    scheduler
        .add(job)
        .await
        .expect("Failed to schedule the daily snapshot job");
    scheduler
        .start()
        .await
        .expect("Failed to start the job scheduler");
    info!("Daily snapshot scheduled: {}", schedule);

    // Bind to 0.0.0.0 so the service is reachable on the LAN
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    // Set up routes
    let api = routes::routes(db, plaid, snapshots, timezone).with(cors);
    info!("Routes configured successfully with CORS.");

    // Start the server
    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
}
