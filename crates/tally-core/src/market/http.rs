//! JSON-over-HTTP market data provider
//!
//! Endpoints, relative to the configured base URL:
//! - `GET /v1/company/{symbol}` -> `CompanyInfo`
//! - `GET /v1/fundamentals/{symbol}` -> `Fundamentals`
//! - `GET /v1/history/{symbol}?days=N` -> `[PriceBar]`
//!
//! The API key, when set, is sent as `x-api-key`. A 404 means the provider
//! has nothing for that symbol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

use super::{CompanyInfo, Fundamentals, MarketDataProvider, PriceBar};

#[derive(Clone)]
pub struct HttpMarketData {
    http: Client,
    base_url: String,
}

impl HttpMarketData {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            let value = HeaderValue::from_str(key.trim())
                .map_err(|_| Error::InvalidData("API key is not a valid header value".into()))?;
            headers.insert("x-api-key", value);
        }

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        symbol: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Market data request");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::data_unavailable(symbol, "provider has no data"));
        }
        if !status.is_success() {
            return Err(Error::data_unavailable(
                symbol,
                format!("provider returned HTTP {}", status),
            ));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketData {
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo> {
        self.get_json(symbol, &format!("/v1/company/{}", symbol), &[])
            .await
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        self.get_json(symbol, &format!("/v1/fundamentals/{}", symbol), &[])
            .await
    }

    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>> {
        self.get_json(
            symbol,
            &format!("/v1/history/{}", symbol),
            &[("days", days.to_string())],
        )
        .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
