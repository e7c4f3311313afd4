//! Caching implementations

pub mod caching_client;
pub mod memory_cache;

pub use caching_client::{CachingMarketDataClient, MarketCaches};
pub use memory_cache::{CacheStats, MemoryCache};
