// src/services/plaid.rs
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

use crate::BoxError;

/// How a single institution's balance fetch can fail. Auth and rate
/// limiting are kept distinct so the logs can tell a revoked link from
/// provider throttling.
#[derive(Debug)]
pub enum FetchError {
    Network(String),
    Auth(String),
    RateLimit(String),
    Api(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {}", msg),
            FetchError::Auth(msg) => write!(f, "auth error: {}", msg),
            FetchError::RateLimit(msg) => write!(f, "rate limited: {}", msg),
            FetchError::Api(msg) => write!(f, "api error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// One account as reported by the aggregation provider. `current` is
/// the raw reported balance; for credit cards that is the owed amount.
#[derive(Debug, Clone)]
pub struct AccountBalance {
    pub subtype: Option<String>,
    pub current: Option<f64>,
}

/// The balance-fetch capability the aggregator consumes. Implemented
/// by `PlaidClient`; tests substitute a stub.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn get_balances(&self, access_token: &str) -> Result<Vec<AccountBalance>, FetchError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkTokenResponse {
    pub link_token: String,
    pub expiration: Option<String>,
    pub request_id: Option<String>,
}

pub struct PlaidClient {
    client: Client,
    base_url: String,
    client_id: String,
    secret: String,
}

impl PlaidClient {
    pub fn new(client_id: String, secret: String, environment: &str) -> Result<Self, BoxError> {
        let base_url = match environment {
            "sandbox" => "https://sandbox.plaid.com",
            "development" => "https://development.plaid.com",
            _ => "https://production.plaid.com",
        }
        .to_string();

        // Bound every provider call so one hung institution cannot
        // stall the rest of an aggregation cycle.
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(PlaidClient {
            client,
            base_url,
            client_id,
            secret,
        })
    }

    pub fn from_env() -> Result<Self, BoxError> {
        let client_id = env::var("PLAID_CLIENT_ID")?;
        let secret = env::var("PLAID_SECRET")?;
        let environment = env::var("PLAID_ENV").unwrap_or_else(|_| "production".to_string());
        Self::new(client_id, secret, &environment)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("PLAID-CLIENT-ID", &self.client_id)
            .header("PLAID-SECRET", &self.secret)
    }

    pub async fn create_link_token(&self) -> Result<LinkTokenResponse, BoxError> {
        #[derive(Debug, Serialize)]
        struct LinkTokenUser<'a> {
            client_user_id: &'a str,
        }

        #[derive(Debug, Serialize)]
        struct LinkTokenRequest<'a> {
            user: LinkTokenUser<'a>,
            client_name: &'a str,
            products: Vec<&'a str>,
            country_codes: Vec<&'a str>,
            language: &'a str,
        }

        let req_body = LinkTokenRequest {
            user: LinkTokenUser {
                client_user_id: "nova-user",
            },
            client_name: "Nova",
            products: vec!["accounts", "balances"],
            country_codes: vec!["US"],
            language: "en",
        };

        let resp = self
            .post("/link/token/create")
            .json(&req_body)
            .send()
            .await?
            .error_for_status()?
            .json::<LinkTokenResponse>()
            .await?;

        info!("Created link token (expires {:?})", resp.expiration);
        Ok(resp)
    }

    pub async fn exchange_public_token(&self, public_token: &str) -> Result<String, BoxError> {
        #[derive(Debug, Serialize)]
        struct ExchangeTokenRequest<'a> {
            public_token: &'a str,
        }

        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct ExchangeTokenResponse {
            access_token: String,
            item_id: Option<String>,
            request_id: Option<String>,
        }

        let resp = self
            .post("/item/public_token/exchange")
            .json(&ExchangeTokenRequest { public_token })
            .send()
            .await?
            .error_for_status()?
            .json::<ExchangeTokenResponse>()
            .await?;

        Ok(resp.access_token)
    }
}

#[async_trait]
impl BalanceSource for PlaidClient {
    async fn get_balances(&self, access_token: &str) -> Result<Vec<AccountBalance>, FetchError> {
        #[derive(Debug, Serialize)]
        struct BalancesGetRequest<'a> {
            access_token: &'a str,
        }

        #[derive(Debug, Deserialize)]
        struct PlaidBalances {
            current: Option<f64>,
        }

        #[derive(Debug, Deserialize)]
        struct PlaidAccount {
            subtype: Option<String>,
            balances: PlaidBalances,
        }

        #[derive(Debug, Deserialize)]
        struct BalancesGetResponse {
            accounts: Vec<PlaidAccount>,
        }

        let resp = self
            .post("/accounts/balance/get")
            .json(&BalancesGetRequest { access_token })
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => FetchError::Auth(body),
                429 => FetchError::RateLimit(body),
                _ => FetchError::Api(format!("{}: {}", status, body)),
            });
        }

        let parsed = resp
            .json::<BalancesGetResponse>()
            .await
            .map_err(|e| FetchError::Api(e.to_string()))?;

        Ok(parsed
            .accounts
            .into_iter()
            .map(|a| AccountBalance {
                subtype: a.subtype,
                current: a.balances.current,
            })
            .collect())
    }
}
