//! Shared fixtures for the HTTP-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crypto_market_insight::{
    Config,
    application::{AuthServiceImpl, MarketServiceImpl},
    domain::{AuthProvider, NewUser, User},
    infrastructure::{
        api_clients::{CoinGeckoClient, MarketDataClient},
        cache::{CachingMarketDataClient, MarketCaches},
        database::{DbError, UserRepository},
        oauth::GitHubOAuthClient,
        security::JwtTokenProvider,
    },
    presentation::{AppState, create_router},
};

pub const JWT_SECRET: &str = "test-secret-key-for-jwt-token-must-be-at-least-256-bits";
pub const FRONTEND_REDIRECT: &str = "http://localhost:5173/oauth/callback";

pub const COINS_MARKETS_BODY: &str = r#"[
    {
        "id": "bitcoin",
        "symbol": "btc",
        "name": "Bitcoin",
        "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
        "current_price": 97500.25,
        "market_cap": 1930000000000,
        "market_cap_rank": 1,
        "total_volume": 35000000000,
        "high_24h": 98000.0,
        "low_24h": 95000.5,
        "price_change_24h": 2375.5,
        "price_change_percentage_24h": 2.5,
        "circulating_supply": 19800000.0,
        "total_supply": 21000000.0,
        "last_updated": "2024-03-02T16:00:00.000Z"
    },
    {
        "id": "ethereum",
        "symbol": "eth",
        "name": "Ethereum",
        "image": null,
        "current_price": 3400.1,
        "market_cap": 410000000000,
        "market_cap_rank": 2,
        "price_change_percentage_24h": -1.25
    }
]"#;

pub const OHLC_BODY: &str = r#"[
    [1709395200000, 61942.5, 62100.0, 61800.25, 62050.75],
    [1709398800000, 62050.75, 62300.0, 62000.0, 62210.0],
    []
]"#;

/// In-memory [`UserRepository`] recording how often rows are written
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
    pub saves: AtomicUsize,
    pub updates: AtomicUsize,
}

impl InMemoryUserRepository {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn all(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_provider_and_provider_id(
        &self,
        provider: AuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, DbError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.provider == provider && u.provider_id == provider_id)
            .cloned())
    }

    async fn save(&self, user: &NewUser) -> Result<User, DbError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        let now = Utc::now();
        let saved = User {
            id: users.len() as i64 + 1,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            profile_image: user.profile_image.clone(),
            provider: user.provider,
            provider_id: user.provider_id.clone(),
            created_at: now,
            updated_at: now,
        };
        users.push(saved.clone());
        Ok(saved)
    }

    async fn update_profile(
        &self,
        id: i64,
        nickname: &str,
        profile_image: Option<&str>,
    ) -> Result<User, DbError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DbError::UserNotFound(id))?;
        user.update_profile(nickname.to_string(), profile_image.map(str::to_string));
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

pub fn test_config(coingecko_url: &str, github_url: &str) -> Config {
    let mut config = Config::default();
    config.coingecko.base_url = coingecko_url.to_string();
    config.auth.jwt_secret = JWT_SECRET.to_string();
    config.auth.frontend_redirect_uri = FRONTEND_REDIRECT.to_string();
    config.auth.github.client_id = "test-client".to_string();
    config.auth.github.client_secret = "test-secret".to_string();
    config.auth.github.authorize_url = format!("{}/login/oauth/authorize", github_url);
    config.auth.github.token_url = format!("{}/login/oauth/access_token", github_url);
    config.auth.github.api_base_url = github_url.to_string();
    config
}

/// Everything a test needs to drive the full router
pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub tokens: Arc<JwtTokenProvider>,
    pub caches: Arc<MarketCaches>,
}

/// Wire the application the way `main` does, with PostgreSQL replaced by
/// [`InMemoryUserRepository`]
pub fn build_app(config: &Config) -> TestApp {
    let users = Arc::new(InMemoryUserRepository::default());
    let caches = Arc::new(MarketCaches::new(&config.cache));

    let coingecko: Arc<dyn MarketDataClient> =
        Arc::new(CoinGeckoClient::new(&config.coingecko).unwrap());
    let market_client: Arc<dyn MarketDataClient> =
        Arc::new(CachingMarketDataClient::new(coingecko, caches.clone()));

    let tokens = Arc::new(
        JwtTokenProvider::new(&config.auth.jwt_secret, config.auth.jwt_expiration_ms).unwrap(),
    );
    let github = Arc::new(
        GitHubOAuthClient::new(&config.auth.github, config.github_callback_uri()).unwrap(),
    );
    let auth_service = Arc::new(AuthServiceImpl::new(
        users.clone(),
        github,
        tokens.clone(),
        config.auth.frontend_redirect_uri.clone(),
    ));

    let state = AppState {
        market_service: Arc::new(MarketServiceImpl::new(market_client)),
        auth_service,
        caches: caches.clone(),
        users: users.clone(),
    };

    TestApp {
        router: create_router(state, config),
        users,
        tokens,
        caches,
    }
}

pub fn github_user(id: i64, provider_id: &str, nickname: &str) -> User {
    let created = Utc::now() - chrono::Duration::days(30);
    User {
        id,
        email: format!("{}@example.com", nickname),
        nickname: nickname.to_string(),
        profile_image: None,
        provider: AuthProvider::Github,
        provider_id: provider_id.to_string(),
        created_at: created,
        updated_at: created,
    }
}
