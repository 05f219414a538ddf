// src/bin/init_db.rs
use dotenv::dotenv;
use std::env;
use std::error::Error;

use nova_networth::services::db::DbStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data.db".to_string());

    // Connecting creates the file and the schema if missing
    DbStore::new(&database_url).await?;

    println!("Database setup complete!");
    Ok(())
}
