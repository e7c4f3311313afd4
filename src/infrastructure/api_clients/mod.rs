//! API clients for external market data providers

pub mod coingecko;
pub mod traits;

pub use coingecko::*;
pub use traits::*;
