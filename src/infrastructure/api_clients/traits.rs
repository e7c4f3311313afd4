//! Traits for market data API clients

use crate::application::errors::MarketApiError;
use crate::domain::{CoinMarketData, OhlcData};
use async_trait::async_trait;

/// Page size used when looking coins up by id
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Source of coin listings and OHLC candles
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// `GET /coins/markets`; `ids` is a comma separated list of coin ids
    async fn get_coins_markets(
        &self,
        vs_currency: &str,
        ids: Option<&str>,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CoinMarketData>, MarketApiError>;

    /// `GET /coins/{id}/ohlc`
    async fn get_ohlc(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: &str,
    ) -> Result<Vec<OhlcData>, MarketApiError>;

    /// Look coins up by id using the first page of 100 results
    async fn get_coins_markets_by_ids(
        &self,
        vs_currency: &str,
        ids: &str,
    ) -> Result<Vec<CoinMarketData>, MarketApiError> {
        self.get_coins_markets(vs_currency, Some(ids), DEFAULT_PER_PAGE, 1)
            .await
    }
}
