// src/bin/list_balances.rs
use dotenv::dotenv;
use env_logger;
use log::{error, info};
use std::{env, error::Error};

use nova_networth::services::db::DbStore;
use nova_networth::services::plaid::{BalanceSource, PlaidClient};

/// Fetches and prints live balances for every stored credential
/// without recording anything. Debugging aid for linked institutions.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    info!("Fetching live balances for every stored credential...");

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data.db".to_string());
    let db = DbStore::new(&database_url)
        .await
        .expect("Failed to initialize database connection");
    let plaid = PlaidClient::from_env().expect("PLAID_CLIENT_ID and PLAID_SECRET must be set");

    let credentials = db.list_credentials().await?;
    if credentials.is_empty() {
        info!("No credentials stored yet. Link an institution first.");
        return Ok(());
    }

    for credential in credentials {
        match plaid.get_balances(&credential.access_token).await {
            Ok(accounts) => {
                info!("{}: {} accounts", credential.institution, accounts.len());
                for account in accounts {
                    info!(
                        "  subtype={} current={}",
                        account.subtype.as_deref().unwrap_or("unknown"),
                        account.current.unwrap_or(0.0)
                    );
                }
            }
            Err(e) => error!("{} fetch failed: {}", credential.institution, e),
        }
    }

    Ok(())
}
