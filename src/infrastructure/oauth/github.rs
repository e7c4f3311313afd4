//! GitHub OAuth2 authorization-code client

use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::OAuthProviderClient;
use crate::application::errors::AuthError;
use crate::config::GitHubOAuthConfig;
use crate::domain::{AuthProvider, OAuthProfile};

const USER_AGENT: &str = concat!("crypto-market-insight/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    email: Option<String>,
    avatar_url: Option<String>,
}

/// Talks to github.com for the login flow and to the REST API for the profile
pub struct GitHubOAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    authorize_url: String,
    token_url: String,
    api_base_url: String,
    scope: String,
    redirect_uri: String,
}

impl GitHubOAuthClient {
    pub fn new(config: &GitHubOAuthConfig, redirect_uri: impl Into<String>) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AuthError::Provider {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            scope: config.scope.clone(),
            redirect_uri: redirect_uri.into(),
        })
    }

    fn provider_error(message: impl Into<String>) -> AuthError {
        AuthError::Provider {
            message: message.into(),
        }
    }
}

#[async_trait]
impl OAuthProviderClient for GitHubOAuthClient {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Github
    }

    fn authorization_url(&self, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| Self::provider_error(format!("invalid authorize URL: {}", e)))
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        debug!("Exchanging GitHub authorization code");

        let response = self
            .client
            .post(&self.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Self::provider_error(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "GitHub token endpoint returned an error status");
            return Err(Self::provider_error(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Self::provider_error(format!("invalid token response: {}", e)))?;

        match (body.access_token, body.error) {
            (Some(token), None) if !token.is_empty() => Ok(token),
            (_, Some(error)) => {
                let description = body.error_description.unwrap_or_default();
                warn!(error = %error, description = %description, "GitHub rejected authorization code");
                Err(Self::provider_error(format!("{}: {}", error, description)))
            }
            _ => Err(Self::provider_error("token response carried no access_token")),
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<OAuthProfile, AuthError> {
        let response = self
            .client
            .get(format!("{}/user", self.api_base_url))
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| Self::provider_error(format!("user request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "GitHub user endpoint returned an error status");
            return Err(Self::provider_error(format!(
                "user endpoint returned {}",
                status
            )));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| Self::provider_error(format!("invalid user response: {}", e)))?;

        debug!(login = %user.login, "Fetched GitHub profile");

        Ok(OAuthProfile {
            provider: AuthProvider::Github,
            provider_id: user.id.to_string(),
            login: user.login,
            email: user.email,
            avatar_url: user.avatar_url,
        })
    }
}
