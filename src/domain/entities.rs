//! Domain entities representing core business concepts

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::value_objects::AuthProvider;

/// One row of the CoinGecko `coins/markets` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarketData {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub current_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub market_cap: Option<Decimal>,
    #[serde(default)]
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
    /// ISO-8601 timestamp as reported by CoinGecko
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Open/high/low/close candle
///
/// CoinGecko encodes candles positionally as `[timestamp_ms, open, high, low, close]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcData {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl OhlcData {
    /// Decode a positional candle. Returns `None` for fewer than five values
    /// or values that are not numeric.
    pub fn from_values(values: &[Value]) -> Option<Self> {
        if values.len() < 5 {
            return None;
        }

        Some(Self {
            timestamp: values[0]
                .as_i64()
                .or_else(|| values[0].as_f64().map(|ts| ts as i64))?,
            open: decimal_from_json(&values[1])?,
            high: decimal_from_json(&values[2])?,
            low: decimal_from_json(&values[3])?,
            close: decimal_from_json(&values[4])?,
        })
    }

    /// Decode a candle from a JSON node, which must be an array
    pub fn from_json(node: &Value) -> Option<Self> {
        node.as_array().and_then(|values| Self::from_values(values))
    }

    /// Candle open time as a UTC instant
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Read a JSON number or numeric string as an exact decimal, going through
/// its textual form so that `61942.5` stays `61942.5`.
fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub provider: AuthProvider,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Apply fresh profile data from the identity provider
    pub fn update_profile(&mut self, nickname: String, profile_image: Option<String>) {
        self.nickname = nickname;
        self.profile_image = profile_image;
    }
}

/// A user that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub provider: AuthProvider,
    pub provider_id: String,
}

/// Principal resolved from a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
}

/// Profile attributes returned by an OAuth identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: AuthProvider,
    pub provider_id: String,
    pub login: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl OAuthProfile {
    /// Provider email, or a synthetic `{provider_id}@github.user` address
    /// when the account keeps its email private.
    pub fn email_or_fallback(&self) -> String {
        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => format!("{}@github.user", self.provider_id),
        }
    }

    pub fn into_new_user(self) -> NewUser {
        NewUser {
            email: self.email_or_fallback(),
            nickname: self.login,
            profile_image: self.avatar_url,
            provider: self.provider,
            provider_id: self.provider_id,
        }
    }
}
