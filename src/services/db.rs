// src/services/db.rs
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

use crate::models::{AthState, BalanceSnapshot, Credential, HistoricalRecord};
use crate::BoxError;

pub struct DbStore {
    pub(crate) pool: SqlitePool,
}

impl DbStore {
    pub async fn new(database_url: &str) -> Result<Self, BoxError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS balances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                wells_fargo_checking REAL DEFAULT 0,
                wells_fargo_credit REAL DEFAULT 0,
                robinhood REAL DEFAULT 0,
                vanguard REAL DEFAULT 0,
                net_worth REAL DEFAULT 0,
                is_ath BOOLEAN DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tokens (
                id INTEGER PRIMARY KEY,
                institution TEXT UNIQUE NOT NULL,
                access_token TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ath (
                id INTEGER PRIMARY KEY,
                value REAL NOT NULL,
                date TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_credentials(&self) -> Result<Vec<Credential>, BoxError> {
        let rows = sqlx::query("SELECT institution, access_token FROM tokens ORDER BY institution")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Credential {
                institution: r.get("institution"),
                access_token: r.get("access_token"),
            })
            .collect())
    }

    pub async fn upsert_credential(
        &self,
        institution: &str,
        access_token: &str,
    ) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (institution, access_token)
            VALUES (?1, ?2)
            ON CONFLICT (institution)
            DO UPDATE SET access_token = excluded.access_token
            "#,
        )
        .bind(institution)
        .bind(access_token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_ath(&self) -> Result<AthState, BoxError> {
        let row = sqlx::query("SELECT value, date FROM ath WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(r) => AthState {
                value: r.get("value"),
                date: Some(r.get("date")),
            },
            None => AthState::default(),
        })
    }

    /// Single-row upsert: exactly one ath row ever exists.
    pub async fn set_ath(&self, value: f64, date: NaiveDate) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            INSERT INTO ath (id, value, date)
            VALUES (1, ?1, ?2)
            ON CONFLICT (id)
            DO UPDATE SET value = excluded.value, date = excluded.date
            "#,
        )
        .bind(value)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append-only insert into the ledger. Existing rows are never
    /// updated or deleted.
    pub async fn append_snapshot(
        &self,
        date: NaiveDate,
        balances: &BalanceSnapshot,
        is_ath: bool,
    ) -> Result<HistoricalRecord, BoxError> {
        let result = sqlx::query(
            r#"
            INSERT INTO balances (date, wells_fargo_checking, wells_fargo_credit,
                                  robinhood, vanguard, net_worth, is_ath)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(date)
        .bind(balances.wells_fargo_checking)
        .bind(balances.wells_fargo_credit)
        .bind(balances.robinhood)
        .bind(balances.vanguard)
        .bind(balances.net_worth)
        .bind(is_ath)
        .execute(&self.pool)
        .await?;

        Ok(HistoricalRecord {
            id: result.last_insert_rowid(),
            date,
            wells_fargo_checking: balances.wells_fargo_checking,
            wells_fargo_credit: balances.wells_fargo_credit,
            robinhood: balances.robinhood,
            vanguard: balances.vanguard,
            net_worth: balances.net_worth,
            is_ath,
        })
    }

    /// Ledger rows with start <= date <= end, ascending by date.
    pub async fn history_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalRecord>, BoxError> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, wells_fargo_checking, wells_fargo_credit,
                   robinhood, vanguard, net_worth, is_ath
            FROM balances
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| HistoricalRecord {
                id: r.get("id"),
                date: r.get("date"),
                wells_fargo_checking: r.get("wells_fargo_checking"),
                wells_fargo_credit: r.get("wells_fargo_credit"),
                robinhood: r.get("robinhood"),
                vanguard: r.get("vanguard"),
                net_worth: r.get("net_worth"),
                is_ath: r.get("is_ath"),
            })
            .collect())
    }
}
