//! HTTP controllers for handling requests

use axum::extract::rejection::QueryRejection;
use std::sync::Arc;

use crate::application::errors::ApplicationError;
use crate::application::{AuthService, MarketService};
use crate::infrastructure::cache::MarketCaches;
use crate::infrastructure::database::UserRepository;

pub mod auth;
pub mod health;
pub mod market;

pub use auth::*;
pub use health::*;
pub use market::*;

/// Application state containing services
#[derive(Clone)]
pub struct AppState {
    pub market_service: Arc<dyn MarketService>,
    pub auth_service: Arc<dyn AuthService>,
    pub caches: Arc<MarketCaches>,
    pub users: Arc<dyn UserRepository>,
}

/// Map an unparseable query string to `400 INVALID_PARAMETER`
pub(crate) fn invalid_query(rejection: QueryRejection) -> ApplicationError {
    ApplicationError::MalformedQuery {
        message: rejection.body_text(),
    }
}
