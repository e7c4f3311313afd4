use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use http_body_util::BodyExt;
use reqwest::Url;
use std::sync::Arc;
use tower::ServiceExt;

use crate::application::{
    AlertCode, ApplicationError, AuthError, AuthService, ErrorCode, MarketApiError, MarketService,
};
use crate::domain::{
    AuthProvider, AuthenticatedUser, CoinMarketData, NewUser, OAuthProfile, OhlcData, Timeframe,
    User,
};
use crate::infrastructure::cache::MarketCaches;
use crate::infrastructure::database::{DbError, UserRepository};
use crate::presentation::{AppState, ErrorResponse, create_router};

const VALID_TOKEN: &str = "valid-token";

struct StubMarketService;

#[async_trait]
impl MarketService for StubMarketService {
    async fn get_coins(
        &self,
        _page: u32,
        _size: u32,
        _keyword: Option<&str>,
    ) -> Result<Vec<CoinMarketData>, ApplicationError> {
        Ok(vec![])
    }

    async fn get_coin_detail(&self, _coin_id: &str) -> Result<CoinMarketData, ApplicationError> {
        Err(ApplicationError::business(ErrorCode::CoinNotFound))
    }

    fn parse_timeframe(&self, value: &str) -> Result<Timeframe, ApplicationError> {
        value.parse::<Timeframe>().map_err(|e| {
            ApplicationError::business_with_message(ErrorCode::InvalidParameter, e.to_string())
        })
    }

    async fn get_ohlcv(
        &self,
        _coin_id: &str,
        _timeframe: Timeframe,
    ) -> Result<Vec<OhlcData>, ApplicationError> {
        Err(MarketApiError::RateLimited.into())
    }
}

struct StubAuthService;

#[async_trait]
impl AuthService for StubAuthService {
    async fn begin_login(&self) -> Result<Url, ApplicationError> {
        Ok(Url::parse("https://github.com/login/oauth/authorize?state=abc").unwrap())
    }

    async fn complete_login(&self, _code: &str, _state: &str) -> Result<Url, ApplicationError> {
        Err(AuthError::InvalidState.into())
    }

    async fn upsert_user(&self, _profile: OAuthProfile) -> Result<User, ApplicationError> {
        Err(ApplicationError::business(ErrorCode::InternalServerError))
    }

    fn authenticate(&self, token: &str) -> Option<AuthenticatedUser> {
        (token == VALID_TOKEN).then(|| AuthenticatedUser {
            user_id: 7,
            email: "octocat@github.com".to_string(),
        })
    }

    async fn current_user(&self, user_id: i64) -> Result<User, ApplicationError> {
        let now = Utc::now();
        Ok(User {
            id: user_id,
            email: "octocat@github.com".to_string(),
            nickname: "octocat".to_string(),
            profile_image: None,
            provider: AuthProvider::Github,
            provider_id: "583231".to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

struct StubUsers {
    healthy: bool,
}

#[async_trait]
impl UserRepository for StubUsers {
    async fn find_by_id(&self, _id: i64) -> Result<Option<User>, DbError> {
        Ok(None)
    }

    async fn find_by_provider_and_provider_id(
        &self,
        _provider: AuthProvider,
        _provider_id: &str,
    ) -> Result<Option<User>, DbError> {
        Ok(None)
    }

    async fn save(&self, _user: &NewUser) -> Result<User, DbError> {
        Err(DbError::CorruptRow("read-only stub".to_string()))
    }

    async fn update_profile(
        &self,
        id: i64,
        _nickname: &str,
        _profile_image: Option<&str>,
    ) -> Result<User, DbError> {
        Err(DbError::UserNotFound(id))
    }

    async fn ping(&self) -> Result<(), DbError> {
        if self.healthy {
            Ok(())
        } else {
            Err(DbError::CorruptRow("connection refused".to_string()))
        }
    }
}

fn dummy_state(db_healthy: bool) -> AppState {
    AppState {
        market_service: Arc::new(StubMarketService),
        auth_service: Arc::new(StubAuthService),
        caches: Arc::new(MarketCaches::default()),
        users: Arc::new(StubUsers {
            healthy: db_healthy,
        }),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(config: &crate::Config, request: Request<Body>) -> axum::response::Response {
    create_router(dummy_state(true), config)
        .oneshot(request)
        .await
        .unwrap()
}

async fn error_body(response: axum::response::Response) -> ErrorResponse {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn docs_disabled_returns_404() {
    let mut config = crate::Config::default();
    config.server.enable_docs = false;

    let response = send(&config, get("/swagger-ui")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&config, get("/api-docs/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn docs_enabled_serves_openapi_with_bearer_scheme() {
    let config = crate::Config::default();

    let response = send(&config, get("/api-docs/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["info"]["title"], "Crypto Market Insight API");
    assert_eq!(
        doc["components"]["securitySchemes"]["bearer_auth"]["scheme"],
        "bearer"
    );
    assert!(doc["paths"]["/api/market/coins"].is_object());

    let response = send(&config, get("/swagger-ui/")).await;
    assert!(
        matches!(response.status(), StatusCode::OK | StatusCode::SEE_OTHER),
        "unexpected status: {}",
        response.status()
    );
}

#[tokio::test]
async fn unknown_route_is_data_not_found() {
    let response = send(&crate::Config::default(), get("/api/unknown")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(response).await.code, "DATA_NOT_FOUND");
}

#[tokio::test]
async fn me_requires_bearer_token() {
    let config = crate::Config::default();

    let response = send(&config, get("/api/auth/me")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = error_body(response).await;
    assert_eq!(body.code, "UNAUTHORIZED");
    assert_eq!(body.message, "Authentication required");

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, "Bearer forged")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&config, request).await.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", VALID_TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = send(&config, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["userId"], 7);
    assert_eq!(body["nickname"], "octocat");
}

#[tokio::test]
async fn login_redirects_with_found() {
    let response = send(&crate::Config::default(), get("/api/auth/login/github")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://github.com/login/oauth/authorize?state=abc"
    );
}

#[tokio::test]
async fn callback_without_state_is_unauthorized() {
    let response = send(
        &crate::Config::default(),
        get("/login/oauth2/code/github?code=abc"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn market_routes_are_public_and_validated() {
    let config = crate::Config::default();

    assert_eq!(
        send(&config, get("/api/market/coins")).await.status(),
        StatusCode::OK
    );

    let response = send(&config, get("/api/market/coins?page=0")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = error_body(response).await;
    assert_eq!(body.code, "INVALID_PARAMETER");
    assert!(body.message.starts_with("page: "));

    let response = send(&config, get("/api/market/coins?size=abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "INVALID_PARAMETER");

    let response = send(&config, get("/api/market/coins/bitcoin/ohlcv?timeframe=2d")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(response).await.message,
        "Invalid timeframe: 2d. Valid values: 1h, 4h, 1d, 1w"
    );

    let response = send(&config, get("/api/market/coins/bitcoin/ohlcv")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_body(response).await.code, "COINGECKO_RATE_LIMIT");
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin_only() {
    let config = crate::Config::default();

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/market/coins")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap()
    };

    let response = send(&config, preflight("http://localhost:5173")).await;
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let response = send(&config, preflight("http://evil.example")).await;
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn cors_wildcard_origin_drops_credentials() {
    let mut config = crate::Config::default();
    config.server.allowed_origins = vec!["*".to_string()];

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/market/coins")
        .header(header::ORIGIN, "https://anywhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = send(&config, request).await;

    assert!(response.status().is_success());
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_MAX_AGE], "3600");
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .is_none()
    );
}

#[tokio::test]
async fn wrong_method_gets_json_error_body() {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/market/coins")
        .body(Body::empty())
        .unwrap();
    let response = send(&crate::Config::default(), request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().contains_key(header::ALLOW));
    let body = error_body(response).await;
    assert_eq!(body.code, "INVALID_PARAMETER");
    assert_eq!(body.message, "Method not allowed");
}

#[tokio::test]
async fn request_timeout_gets_json_error_body() {
    let response = crate::presentation::middleware::uniform_error_body(
        StatusCode::REQUEST_TIMEOUT.into_response(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    let body = error_body(response).await;
    assert_eq!(body.code, "INTERNAL_SERVER_ERROR");
    assert_eq!(body.message, "Request timed out");
}

#[tokio::test]
async fn detailed_health_reports_down_database() {
    let config = crate::Config::default();

    let response = create_router(dummy_state(true), &config)
        .oneshot(get("/actuator/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_router(dummy_state(false), &config)
        .oneshot(get("/actuator/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "DOWN");
    assert_eq!(body["details"]["db"]["status"], "DOWN");
    assert!(body["details"]["caches"]["details"]["coinMarkets"].is_object());
}

#[tokio::test]
async fn error_mapping_statuses_and_codes() {
    let cases = vec![
        (
            ApplicationError::business(ErrorCode::CoinNotFound),
            StatusCode::NOT_FOUND,
            "COIN_NOT_FOUND",
        ),
        (
            ApplicationError::alert(AlertCode::MemberNotFound),
            StatusCode::UNPROCESSABLE_ENTITY,
            "MEMBER_NOT_FOUND",
        ),
        (
            ApplicationError::validation("size", "must be less than or equal to 250"),
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_PARAMETER",
        ),
        (
            MarketApiError::Server { status: 503 }.into(),
            StatusCode::BAD_GATEWAY,
            "COINGECKO_SERVER_ERROR",
        ),
        (
            MarketApiError::Timeout {
                message: "timed out".to_string(),
            }
            .into(),
            StatusCode::GATEWAY_TIMEOUT,
            "COINGECKO_TIMEOUT",
        ),
        (
            AuthError::InvalidToken.into(),
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
        ),
        (
            DbError::UserNotFound(3).into(),
            StatusCode::NOT_FOUND,
            "USER_NOT_FOUND",
        ),
        (
            DbError::CorruptRow("provider=???".to_string()).into(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
        ),
    ];

    for (error, status, code) in cases {
        let response = error.into_response();
        assert_eq!(response.status(), status, "status for {}", code);
        let body = error_body(response).await;
        assert_eq!(body.code, code);
    }
}

#[tokio::test]
async fn internal_errors_do_not_leak_details() {
    let error: ApplicationError = DbError::CorruptRow("secret detail".to_string()).into();
    let body = error_body(error.into_response()).await;
    assert_eq!(body.message, "Internal server error");
}

#[tokio::test]
async fn prometheus_endpoint_exports_text() {
    crate::metrics::init();
    let response = send(&crate::Config::default(), get("/actuator/prometheus")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("app_build_info"));
}
