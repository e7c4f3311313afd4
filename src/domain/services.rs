//! Domain services containing business logic

use super::CoinMarketData;

/// Keyword search over market listings
pub struct CoinMatcher;

impl CoinMatcher {
    /// Case-insensitive substring match on symbol or name
    pub fn matches(coin: &CoinMarketData, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        coin.symbol.to_lowercase().contains(&needle) || coin.name.to_lowercase().contains(&needle)
    }

    /// Keep coins matching `keyword`; a blank or absent keyword keeps everything
    ///
    /// A non-blank keyword is matched as given, surrounding whitespace included.
    pub fn filter(coins: Vec<CoinMarketData>, keyword: Option<&str>) -> Vec<CoinMarketData> {
        match keyword {
            Some(keyword) if !keyword.trim().is_empty() => coins
                .into_iter()
                .filter(|coin| Self::matches(coin, keyword))
                .collect(),
            _ => coins,
        }
    }
}
