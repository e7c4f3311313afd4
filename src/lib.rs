//! Crypto Market Insight - market data and GitHub login backend
//!
//! Serves CoinGecko market listings, coin details and OHLC candles behind a
//! short-lived in-memory cache, authenticates users through GitHub OAuth2 and
//! issues JWT bearer tokens. Users are persisted in PostgreSQL.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod metrics;
pub mod presentation;

pub use config::Config;
pub use logging::init_tracing;
