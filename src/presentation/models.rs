//! API request and response models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{CoinMarketData, OhlcData, User};

/// Query parameters for the coin listing
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CoinListQuery {
    /// Page number, starting at 1
    #[param(example = 1, minimum = 1)]
    pub page: Option<i64>,

    /// Coins per page
    #[param(example = 10, minimum = 1, maximum = 250)]
    pub size: Option<i64>,

    /// Case-insensitive match against symbol or name
    #[param(example = "btc")]
    pub keyword: Option<String>,
}

/// Query parameters for OHLCV lookups
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OhlcvQuery {
    /// One of `1h`, `4h`, `1d`, `1w`
    #[param(example = "1d")]
    pub timeframe: Option<String>,
}

/// Query parameters of the OAuth callback
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by GitHub when the user denied access
    pub error: Option<String>,
}

/// Coin listing page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CoinListResponse {
    pub coins: Vec<CoinSummaryDto>,

    #[schema(example = 1)]
    pub page: u32,

    #[schema(example = 10)]
    pub size: u32,
}

/// Condensed market row used in listings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoinSummaryDto {
    #[schema(example = "bitcoin")]
    pub id: String,

    #[schema(example = "btc")]
    pub symbol: String,

    #[schema(example = "Bitcoin")]
    pub name: String,

    pub image: Option<String>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(example = 97500.25)]
    pub current_price: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(example = 1930000000000.0)]
    pub market_cap: Option<Decimal>,

    #[schema(example = 1)]
    pub market_cap_rank: Option<u32>,

    /// 24 hour price change in percent
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(example = 2.5)]
    pub price_change_percentage_24h: Option<Decimal>,
}

impl From<CoinMarketData> for CoinSummaryDto {
    fn from(coin: CoinMarketData) -> Self {
        Self {
            id: coin.id,
            symbol: coin.symbol,
            name: coin.name,
            image: coin.image,
            current_price: coin.current_price,
            market_cap: coin.market_cap,
            market_cap_rank: coin.market_cap_rank,
            price_change_percentage_24h: coin.price_change_percentage_24h,
        }
    }
}

/// Full market data for one coin, in CoinGecko's field naming
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CoinDetailResponse {
    #[schema(example = "bitcoin")]
    pub id: String,
    #[schema(example = "btc")]
    pub symbol: String,
    #[schema(example = "Bitcoin")]
    pub name: String,
    pub image: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub current_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_volume: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub high_24h: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub low_24h: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_change_24h: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_change_percentage_24h: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub circulating_supply: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_supply: Option<Decimal>,
    #[schema(example = "2024-03-02T16:00:00.000Z")]
    pub last_updated: Option<String>,
}

impl From<CoinMarketData> for CoinDetailResponse {
    fn from(coin: CoinMarketData) -> Self {
        Self {
            id: coin.id,
            symbol: coin.symbol,
            name: coin.name,
            image: coin.image,
            current_price: coin.current_price,
            market_cap: coin.market_cap,
            market_cap_rank: coin.market_cap_rank,
            total_volume: coin.total_volume,
            high_24h: coin.high_24h,
            low_24h: coin.low_24h,
            price_change_24h: coin.price_change_24h,
            price_change_percentage_24h: coin.price_change_percentage_24h,
            circulating_supply: coin.circulating_supply,
            total_supply: coin.total_supply,
            last_updated: coin.last_updated,
        }
    }
}

/// Candle series for a coin
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OhlcvResponse {
    #[schema(example = "bitcoin")]
    pub coin_id: String,

    #[schema(example = "1d")]
    pub timeframe: String,

    pub data: Vec<OhlcvDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OhlcvDto {
    /// Candle open time, Unix milliseconds
    #[schema(example = 1709395200000_i64)]
    pub timestamp: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 61942.0)]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 62211.0)]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 61721.0)]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 61845.0)]
    pub close: Decimal,
}

impl From<OhlcData> for OhlcvDto {
    fn from(candle: OhlcData) -> Self {
        Self {
            timestamp: candle.timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
        }
    }
}

/// The authenticated user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    #[schema(example = 1)]
    pub user_id: i64,

    #[schema(example = "octocat@github.com")]
    pub email: String,

    #[schema(example = "octocat")]
    pub nickname: String,

    pub profile_image: Option<String>,
}

impl From<User> for UserInfoResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            nickname: user.nickname,
            profile_image: user.profile_image,
        }
    }
}

/// Error response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "DATA_NOT_FOUND")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Requested data was not found")]
    pub message: String,

    /// Error occurrence timestamp
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `UP` or `DOWN`
    #[schema(example = "UP")]
    pub status: String,

    #[schema(example = "0.1.0")]
    pub version: String,

    pub timestamp: DateTime<Utc>,

    /// Per-component status, present on the detailed endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
