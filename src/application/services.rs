//! Application services for orchestrating business logic

use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{AlertCode, ApplicationError, AuthError, ErrorCode};
use crate::domain::{
    AuthenticatedUser, CoinMarketData, CoinMatcher, OAuthProfile, OhlcData, Timeframe, User,
};
use crate::infrastructure::api_clients::MarketDataClient;
use crate::infrastructure::cache::MemoryCache;
use crate::infrastructure::database::{DbError, UserRepository};
use crate::infrastructure::oauth::OAuthProviderClient;
use crate::infrastructure::security::JwtTokenProvider;

/// Quote currency for every market lookup
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// How long a login `state` stays redeemable
pub const OAUTH_STATE_TTL: Duration = Duration::from_secs(600);

const OAUTH_STATE_CACHE: &str = "oauthStates";
const OAUTH_STATE_CAPACITY: usize = 10_000;

/// Market data use cases
#[async_trait]
pub trait MarketService: Send + Sync {
    /// One page of the market listing, optionally narrowed by a keyword
    async fn get_coins(
        &self,
        page: u32,
        size: u32,
        keyword: Option<&str>,
    ) -> Result<Vec<CoinMarketData>, ApplicationError>;

    async fn get_coin_detail(&self, coin_id: &str) -> Result<CoinMarketData, ApplicationError>;

    fn parse_timeframe(&self, value: &str) -> Result<Timeframe, ApplicationError>;

    async fn get_ohlcv(
        &self,
        coin_id: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<OhlcData>, ApplicationError>;
}

pub struct MarketServiceImpl {
    client: Arc<dyn MarketDataClient>,
}

impl MarketServiceImpl {
    pub fn new(client: Arc<dyn MarketDataClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MarketService for MarketServiceImpl {
    async fn get_coins(
        &self,
        page: u32,
        size: u32,
        keyword: Option<&str>,
    ) -> Result<Vec<CoinMarketData>, ApplicationError> {
        debug!(page, size, keyword = ?keyword, "Listing coins");

        let coins = self
            .client
            .get_coins_markets(DEFAULT_VS_CURRENCY, None, size, page)
            .await?;

        Ok(CoinMatcher::filter(coins, keyword))
    }

    async fn get_coin_detail(&self, coin_id: &str) -> Result<CoinMarketData, ApplicationError> {
        let coins = self
            .client
            .get_coins_markets_by_ids(DEFAULT_VS_CURRENCY, coin_id)
            .await?;

        coins.into_iter().next().ok_or_else(|| {
            debug!(coin_id = %coin_id, "Coin not found");
            ApplicationError::business(ErrorCode::CoinNotFound)
        })
    }

    fn parse_timeframe(&self, value: &str) -> Result<Timeframe, ApplicationError> {
        value.parse::<Timeframe>().map_err(|e| {
            ApplicationError::business_with_message(ErrorCode::InvalidParameter, e.to_string())
        })
    }

    async fn get_ohlcv(
        &self,
        coin_id: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<OhlcData>, ApplicationError> {
        Ok(self
            .client
            .get_ohlc(coin_id, DEFAULT_VS_CURRENCY, timeframe.days())
            .await?)
    }
}

/// Login, token verification and the current-user lookup
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Start an OAuth login: remember a fresh `state` and return the
    /// provider URL the browser should be sent to
    async fn begin_login(&self) -> Result<Url, ApplicationError>;

    /// Finish an OAuth login and return the frontend URL carrying the token
    async fn complete_login(&self, code: &str, state: &str) -> Result<Url, ApplicationError>;

    /// Create the user on first login, refresh its profile afterwards
    async fn upsert_user(&self, profile: OAuthProfile) -> Result<User, ApplicationError>;

    /// Resolve a bearer token; `None` when it is malformed, forged or expired
    fn authenticate(&self, token: &str) -> Option<AuthenticatedUser>;

    async fn current_user(&self, user_id: i64) -> Result<User, ApplicationError>;
}

pub struct AuthServiceImpl {
    users: Arc<dyn UserRepository>,
    oauth: Arc<dyn OAuthProviderClient>,
    tokens: Arc<JwtTokenProvider>,
    states: MemoryCache<()>,
    frontend_redirect_uri: String,
}

impl AuthServiceImpl {
    pub fn new(
        users: Arc<dyn UserRepository>,
        oauth: Arc<dyn OAuthProviderClient>,
        tokens: Arc<JwtTokenProvider>,
        frontend_redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            users,
            oauth,
            tokens,
            states: MemoryCache::new(OAUTH_STATE_CACHE, OAUTH_STATE_TTL, OAUTH_STATE_CAPACITY),
            frontend_redirect_uri: frontend_redirect_uri.into(),
        }
    }

    fn success_redirect(&self, token: &str) -> Result<Url, ApplicationError> {
        let mut url =
            Url::parse(&self.frontend_redirect_uri).map_err(|e| ApplicationError::Configuration {
                message: format!("invalid frontend redirect URI: {}", e),
            })?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn begin_login(&self) -> Result<Url, ApplicationError> {
        let state = Uuid::new_v4().to_string();
        let url = self.oauth.authorization_url(&state)?;
        self.states.insert(state, ()).await;
        Ok(url)
    }

    async fn complete_login(&self, code: &str, state: &str) -> Result<Url, ApplicationError> {
        if self.states.take(state).await.is_none() {
            warn!("OAuth callback with unknown or expired state");
            return Err(AuthError::InvalidState.into());
        }

        let access_token = self.oauth.exchange_code(code).await?;
        let profile = self.oauth.fetch_profile(&access_token).await?;
        let user = self.upsert_user(profile).await?;

        let token = self.tokens.create_token(user.id, &user.email)?;
        info!(user_id = user.id, provider = %user.provider, "OAuth login succeeded");

        self.success_redirect(&token)
    }

    async fn upsert_user(&self, profile: OAuthProfile) -> Result<User, ApplicationError> {
        let existing = self
            .users
            .find_by_provider_and_provider_id(profile.provider, &profile.provider_id)
            .await?;

        if let Some(user) = existing {
            debug!(user_id = user.id, "Refreshing profile of existing user");
            return Ok(self
                .users
                .update_profile(user.id, &profile.login, profile.avatar_url.as_deref())
                .await?);
        }

        let new_user = profile.clone().into_new_user();
        match self.users.save(&new_user).await {
            Ok(user) => {
                info!(user_id = user.id, provider = %user.provider, "Registered new user");
                Ok(user)
            }
            // Lost a race with a concurrent first login for the same account
            Err(DbError::UserExists { .. }) => {
                let user = self
                    .users
                    .find_by_provider_and_provider_id(profile.provider, &profile.provider_id)
                    .await?
                    .ok_or_else(|| ApplicationError::business(ErrorCode::InternalServerError))?;
                Ok(self
                    .users
                    .update_profile(user.id, &profile.login, profile.avatar_url.as_deref())
                    .await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn authenticate(&self, token: &str) -> Option<AuthenticatedUser> {
        let claims = self.tokens.parse_claims(token).ok()?;
        let user_id = claims.sub.parse::<i64>().ok()?;
        Some(AuthenticatedUser {
            user_id,
            email: claims.email,
        })
    }

    async fn current_user(&self, user_id: i64) -> Result<User, ApplicationError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApplicationError::alert(AlertCode::MemberNotFound))
    }
}
