//! OAuth2 provider integrations

use async_trait::async_trait;
use reqwest::Url;

use crate::application::errors::AuthError;
use crate::domain::{AuthProvider, OAuthProfile};

pub mod github;

pub use github::GitHubOAuthClient;

/// Authorization-code flow against an external identity provider
#[async_trait]
pub trait OAuthProviderClient: Send + Sync {
    fn provider(&self) -> AuthProvider;

    /// URL the browser is sent to, carrying `state` for CSRF protection
    fn authorization_url(&self, state: &str) -> Result<Url, AuthError>;

    /// Trade an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<OAuthProfile, AuthError>;
}
