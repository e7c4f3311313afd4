//! Caching decorator for market data clients

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::memory_cache::{CacheStats, MemoryCache};
use crate::application::errors::MarketApiError;
use crate::config::CacheConfig;
use crate::domain::{CoinMarketData, OhlcData};
use crate::infrastructure::api_clients::MarketDataClient;
use crate::metrics;

/// Cache name for `coins/markets` listings
pub const COIN_MARKETS: &str = "coinMarkets";
/// Cache name for OHLC candles
pub const OHLC: &str = "ohlc";

/// The named caches backing market data lookups
pub struct MarketCaches {
    pub coin_markets: MemoryCache<Vec<CoinMarketData>>,
    pub ohlc: MemoryCache<Vec<OhlcData>>,
}

impl MarketCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            coin_markets: MemoryCache::new(
                COIN_MARKETS,
                Duration::from_secs(config.coin_markets_ttl_seconds),
                config.max_entries,
            ),
            ohlc: MemoryCache::new(
                OHLC,
                Duration::from_secs(config.ohlc_ttl_seconds),
                config.max_entries,
            ),
        }
    }

    /// Clear one cache by name; returns false for an unknown name
    pub async fn clear(&self, name: &str) -> bool {
        match name {
            COIN_MARKETS => self.coin_markets.clear().await,
            OHLC => self.ohlc.clear().await,
            _ => return false,
        }
        true
    }

    pub async fn clear_all(&self) {
        self.coin_markets.clear().await;
        self.ohlc.clear().await;
    }

    /// Drop expired entries from every cache, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        self.coin_markets.cleanup_expired().await + self.ohlc.cleanup_expired().await
    }

    /// Statistics per cache, also refreshing the entry gauges
    pub async fn stats(&self) -> Vec<(&'static str, CacheStats)> {
        let stats = vec![
            (COIN_MARKETS, self.coin_markets.stats().await),
            (OHLC, self.ohlc.stats().await),
        ];
        for (name, s) in &stats {
            metrics::set_cache_entries(name, s.total_entries as usize);
        }
        stats
    }
}

impl Default for MarketCaches {
    fn default() -> Self {
        Self::new(&crate::Config::default().cache)
    }
}

/// Marker standing in for absent `ids` in `coinMarkets` keys
const ABSENT_IDS: &str = "null";

/// Key for the `coinMarkets` cache: `{vs}:{ids}:{per_page}:{page}`
///
/// `None` when `ids` is literally the absent marker, since such a key would
/// collide with the unfiltered listing.
pub fn coin_markets_key(
    vs_currency: &str,
    ids: Option<&str>,
    per_page: u32,
    page: u32,
) -> Option<String> {
    if ids == Some(ABSENT_IDS) {
        return None;
    }
    Some(format!(
        "{}:{}:{}:{}",
        vs_currency,
        ids.unwrap_or(ABSENT_IDS),
        per_page,
        page
    ))
}

/// Key for the `ohlc` cache: `{coin}:{vs}:{days}`
pub fn ohlc_key(coin_id: &str, vs_currency: &str, days: &str) -> String {
    format!("{}:{}:{}", coin_id, vs_currency, days)
}

/// Wraps a [`MarketDataClient`] and serves repeated lookups from [`MarketCaches`]
pub struct CachingMarketDataClient {
    inner: Arc<dyn MarketDataClient>,
    caches: Arc<MarketCaches>,
}

impl CachingMarketDataClient {
    pub fn new(inner: Arc<dyn MarketDataClient>, caches: Arc<MarketCaches>) -> Self {
        Self { inner, caches }
    }

    pub fn caches(&self) -> &Arc<MarketCaches> {
        &self.caches
    }
}

#[async_trait]
impl MarketDataClient for CachingMarketDataClient {
    async fn get_coins_markets(
        &self,
        vs_currency: &str,
        ids: Option<&str>,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CoinMarketData>, MarketApiError> {
        let Some(key) = coin_markets_key(vs_currency, ids, per_page, page) else {
            return self
                .inner
                .get_coins_markets(vs_currency, ids, per_page, page)
                .await;
        };
        if let Some(coins) = self.caches.coin_markets.get(&key).await {
            metrics::record_cache_get(COIN_MARKETS, true);
            return Ok(coins);
        }
        metrics::record_cache_get(COIN_MARKETS, false);

        info!(
            vs_currency = %vs_currency,
            ids = ?ids,
            per_page,
            page,
            "Cache MISS - fetching coinMarkets"
        );
        let coins = self
            .inner
            .get_coins_markets(vs_currency, ids, per_page, page)
            .await?;
        self.caches.coin_markets.insert(key, coins.clone()).await;
        Ok(coins)
    }

    async fn get_ohlc(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: &str,
    ) -> Result<Vec<OhlcData>, MarketApiError> {
        let key = ohlc_key(coin_id, vs_currency, days);
        if let Some(candles) = self.caches.ohlc.get(&key).await {
            metrics::record_cache_get(OHLC, true);
            return Ok(candles);
        }
        metrics::record_cache_get(OHLC, false);

        info!(
            coin_id = %coin_id,
            vs_currency = %vs_currency,
            days = %days,
            "Cache MISS - fetching OHLC"
        );
        let candles = self.inner.get_ohlc(coin_id, vs_currency, days).await?;
        self.caches.ohlc.insert(key, candles.clone()).await;
        Ok(candles)
    }
}
