//! Infrastructure Layer - External concerns and implementations
//!
//! This module handles external systems: the CoinGecko API, GitHub OAuth,
//! PostgreSQL and in-process caches.

pub mod api_clients;
pub mod cache;
pub mod database;
pub mod oauth;
pub mod security;

pub use api_clients::{CoinGeckoClient, MarketDataClient};
pub use cache::{CachingMarketDataClient, MarketCaches, MemoryCache};
pub use database::{Database, DbError, PgUserRepository, UserRepository};
pub use oauth::{GitHubOAuthClient, OAuthProviderClient};
pub use security::JwtTokenProvider;
