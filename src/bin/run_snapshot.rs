// src/bin/run_snapshot.rs
use chrono::Utc;
use chrono_tz::Tz;
use dotenv::dotenv;
use env_logger;
use log::info;
use std::{env, error::Error, sync::Arc};

use nova_networth::services::db::DbStore;
use nova_networth::services::plaid::{BalanceSource, PlaidClient};
use nova_networth::services::snapshot::SnapshotService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    info!("Running a one-off snapshot...");

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data.db".to_string());
    let timezone: Tz = match env::var("SNAPSHOT_TIMEZONE") {
        Ok(name) => name
            .parse()
            .expect("SNAPSHOT_TIMEZONE must be a valid timezone name"),
        Err(_) => chrono_tz::UTC,
    };

    let db = Arc::new(
        DbStore::new(&database_url)
            .await
            .expect("Failed to initialize database connection"),
    );
    let plaid = Arc::new(
        PlaidClient::from_env().expect("PLAID_CLIENT_ID and PLAID_SECRET must be set"),
    );
    let snapshots = SnapshotService::new(db, plaid as Arc<dyn BalanceSource>);

    let date = Utc::now().with_timezone(&timezone).date_naive();
    let balances = snapshots.run_daily_snapshot(date).await?;

    info!("Snapshot stored for {}:", date);
    info!("  Wells Fargo checking: {:.2}", balances.wells_fargo_checking);
    info!("  Wells Fargo credit:   {:.2}", balances.wells_fargo_credit);
    info!("  Robinhood:            {:.2}", balances.robinhood);
    info!("  Vanguard:             {:.2}", balances.vanguard);
    info!("  Net worth:            {:.2}", balances.net_worth);

    Ok(())
}
