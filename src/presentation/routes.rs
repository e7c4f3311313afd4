//! Route definitions and server setup

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::Config;
use crate::application::errors::ErrorCode;
use crate::config::ServerConfig;
use crate::presentation::{
    controllers::{
        AppState,
        auth::{github_callback, login_github, me},
        health::{
            detailed_health_check, health_check, liveness_probe, prometheus, readiness_probe,
        },
        market::{get_coin_detail, get_coins, get_ohlcv},
    },
    middleware::{logging_middleware, require_auth, uniform_error_body},
    models::*,
};

/// Registers the JWT bearer scheme referenced by protected operations
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::market::get_coins,
        crate::presentation::controllers::market::get_coin_detail,
        crate::presentation::controllers::market::get_ohlcv,
        crate::presentation::controllers::auth::login_github,
        crate::presentation::controllers::auth::github_callback,
        crate::presentation::controllers::auth::me,
        crate::presentation::controllers::health::health_check,
        crate::presentation::controllers::health::detailed_health_check,
        crate::presentation::controllers::health::liveness_probe,
        crate::presentation::controllers::health::readiness_probe,
        crate::presentation::controllers::health::prometheus
    ),
    components(
        schemas(
            CoinListResponse,
            CoinSummaryDto,
            CoinDetailResponse,
            OhlcvResponse,
            OhlcvDto,
            UserInfoResponse,
            ErrorResponse,
            HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "market", description = "Cryptocurrency market data backed by CoinGecko"),
        (name = "auth", description = "GitHub OAuth2 login and the current user"),
        (name = "health", description = "Health probes and Prometheus metrics")
    ),
    info(
        title = "Crypto Market Insight API",
        version = "1.0.0",
        description = "Coin listings, coin details and OHLC candles proxied from CoinGecko with short-lived caching, plus GitHub login issuing JWT bearer tokens."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    )
)]
pub struct ApiDoc;

/// CORS policy from configuration; a `*` origin allows any origin without credentials
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

async fn not_found() -> impl IntoResponse {
    let code = ErrorCode::DataNotFound;
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(code.as_str(), code.message())),
    )
}

/// Create the application router with comprehensive middleware stack
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let market_routes = Router::new()
        .route("/coins", get(get_coins))
        .route("/coins/{coin_id}", get(get_coin_detail))
        .route("/coins/{coin_id}/ohlcv", get(get_ohlcv));

    let protected_auth_routes = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let auth_routes = Router::new()
        .route("/login/github", get(login_github))
        .merge(protected_auth_routes);

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/actuator/health", get(detailed_health_check))
        .route("/actuator/health/liveness", get(liveness_probe))
        .route("/actuator/health/readiness", get(readiness_probe))
        .route("/actuator/prometheus", get(prometheus));

    let mut router = Router::new()
        .nest("/api/market", market_routes)
        .nest("/api/auth", auth_routes)
        .route("/login/oauth2/code/github", get(github_callback))
        .merge(health_routes);

    if config.server.enable_docs {
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    router
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                // HTTP tracing
                .layer(TraceLayer::new_for_http())
                // CORS handling
                .layer(cors_layer(&config.server))
                // JSON bodies for timeouts and unsupported methods
                .layer(middleware::map_response(uniform_error_body))
                // Request timeout
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.server.request_timeout_seconds),
                ))
                // Request logging and HTTP metrics
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(app_state)
}
