//! CoinGecko API client implementation

use super::traits::MarketDataClient;
use crate::application::errors::{ApplicationError, MarketApiError};
use crate::config::CoinGeckoConfig;
use crate::domain::{CoinMarketData, OhlcData};
use crate::metrics;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

const COINS_MARKETS_ENDPOINT: &str = "coins_markets";
const OHLC_ENDPOINT: &str = "ohlc";

/// Client for the CoinGecko public REST API
pub struct CoinGeckoClient {
    client: Client,
    base_url: Url,
}

impl CoinGeckoClient {
    /// Create a new client from configuration
    pub fn new(config: &CoinGeckoConfig) -> Result<Self, ApplicationError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ApplicationError::Configuration {
            message: format!("invalid CoinGecko base URL {}: {}", config.base_url, e),
        })?;

        // The read timeout bounds the whole exchange once connected
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(
                config.connect_timeout_ms + config.read_timeout_ms,
            ))
            .user_agent(concat!("crypto-market-insight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApplicationError::Configuration {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        info!(
            base_url = %base_url,
            connect_timeout_ms = config.connect_timeout_ms,
            read_timeout_ms = config.read_timeout_ms,
            "CoinGecko client initialized"
        );

        Ok(Self { client, base_url })
    }

    /// Create a client pointing at `base_url` with default timeouts
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApplicationError> {
        Self::new(&CoinGeckoConfig {
            base_url: base_url.into(),
            connect_timeout_ms: 5_000,
            read_timeout_ms: 10_000,
        })
    }

    /// Append path segments to the configured base URL, percent-encoding each
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, MarketApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MarketApiError::Http {
                status: 0,
                message: format!("base URL {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue a GET and decode the body; a JSON `null` body yields `None`
    async fn get_json<T>(
        &self,
        endpoint: &'static str,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Option<T>, MarketApiError>
    where
        T: DeserializeOwned,
    {
        let request = self.client.get(url).query(query).build()?;
        let path = request.url().path().to_string();
        info!(method = %request.method(), url = %request.url(), "CoinGecko request");

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, path = %path, "CoinGecko timeout");
                metrics::record_coingecko_request(endpoint, "timeout");
                return Err(MarketApiError::from(e));
            }
        };

        let status = response.status();
        info!(status = status.as_u16(), path = %path, "CoinGecko response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(path = %path, "CoinGecko rate limit exceeded");
            metrics::record_coingecko_request(endpoint, "rate_limited");
            return Err(MarketApiError::RateLimited);
        }

        if status.is_server_error() {
            error!(status = status.as_u16(), path = %path, "CoinGecko server error");
            metrics::record_coingecko_request(endpoint, "server_error");
            return Err(MarketApiError::Server {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            metrics::record_coingecko_request(endpoint, "http_error");
            return Err(MarketApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<Option<T>>().await.map_err(|e| {
            metrics::record_coingecko_request(endpoint, "decode_error");
            MarketApiError::from(e)
        })?;

        metrics::record_coingecko_request(endpoint, "success");
        Ok(body)
    }
}

#[async_trait]
impl MarketDataClient for CoinGeckoClient {
    async fn get_coins_markets(
        &self,
        vs_currency: &str,
        ids: Option<&str>,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CoinMarketData>, MarketApiError> {
        let url = self.endpoint_url(&["coins", "markets"])?;

        let mut query = vec![("vs_currency", vs_currency.to_string())];
        if let Some(ids) = ids {
            query.push(("ids", ids.to_string()));
        }
        query.push(("per_page", per_page.to_string()));
        query.push(("page", page.to_string()));

        let coins = self
            .get_json::<Vec<CoinMarketData>>(COINS_MARKETS_ENDPOINT, url, &query)
            .await?;

        Ok(coins.unwrap_or_default())
    }

    async fn get_ohlc(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: &str,
    ) -> Result<Vec<OhlcData>, MarketApiError> {
        let url = self.endpoint_url(&["coins", coin_id, "ohlc"])?;
        let query = [
            ("vs_currency", vs_currency.to_string()),
            ("days", days.to_string()),
        ];

        let rows = self
            .get_json::<Vec<Value>>(OHLC_ENDPOINT, url, &query)
            .await?
            .unwrap_or_default();

        Ok(rows.iter().filter_map(OhlcData::from_json).collect())
    }
}
