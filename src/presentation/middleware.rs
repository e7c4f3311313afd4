//! HTTP middleware for the web server

use axum::{
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::time::Instant;
use uuid::Uuid;

use crate::application::errors::{ApplicationError, AuthError, ErrorCode};
use crate::domain::DomainError;
use crate::infrastructure::database::DbError;
use crate::infrastructure::security::bearer_token;
use crate::metrics;
use crate::presentation::controllers::AppState;
use crate::presentation::models::ErrorResponse;

fn error_body(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

/// Error handling middleware
impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        match self {
            ApplicationError::Business { code, message } => {
                tracing::error!(code = code.as_str(), message = %message, "Business error");
                error_body(code.status(), code.as_str(), message)
            }
            ApplicationError::Alert { code, message } => {
                tracing::warn!(code = code.as_str(), message = %message, "Alert");
                error_body(StatusCode::UNPROCESSABLE_ENTITY, code.as_str(), message)
            }
            ApplicationError::Validation { field, message } => {
                let message = format!("{}: {}", field, message);
                tracing::warn!(message = %message, "Validation failed");
                error_body(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorCode::InvalidParameter.as_str(),
                    message,
                )
            }
            ApplicationError::MalformedQuery { message } => {
                tracing::warn!(message = %message, "Malformed query string");
                let code = ErrorCode::InvalidParameter;
                error_body(code.status(), code.as_str(), message)
            }
            ApplicationError::Domain(err) => {
                tracing::warn!(error = %err, "Rejected invalid input");
                let status = match err {
                    DomainError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    DomainError::InvalidTimeframe { .. } | DomainError::InvalidProvider { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                };
                error_body(status, ErrorCode::InvalidParameter.as_str(), err.to_string())
            }
            ApplicationError::MarketApi(err) => {
                let code = err.error_code();
                tracing::error!(code = code.as_str(), error = %err, "CoinGecko request failed");
                error_body(code.status(), code.as_str(), code.message())
            }
            ApplicationError::Database(DbError::UserNotFound(id)) => {
                tracing::warn!(user_id = id, "User not found");
                let code = ErrorCode::UserNotFound;
                error_body(code.status(), code.as_str(), code.message())
            }
            ApplicationError::Auth(
                err @ (AuthError::InvalidToken
                | AuthError::InvalidState
                | AuthError::Provider { .. }),
            ) => {
                tracing::warn!(error = %err, "Authentication failed");
                let code = ErrorCode::Unauthorized;
                error_body(code.status(), code.as_str(), code.message())
            }
            err => {
                tracing::error!(error = %err, "Unhandled error");
                let code = ErrorCode::InternalServerError;
                error_body(code.status(), code.as_str(), code.message())
            }
        }
    }
}

/// Give bodiless framework responses the JSON error body
///
/// Covers the 405 from method routing and the 408 from the timeout layer.
/// Headers such as `Allow` are kept.
pub async fn uniform_error_body(response: Response) -> Response {
    if response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    let (code, message) = match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => (ErrorCode::InvalidParameter, "Method not allowed"),
        StatusCode::REQUEST_TIMEOUT => (ErrorCode::InternalServerError, "Request timed out"),
        _ => return response,
    };

    let (parts, _) = response.into_parts();
    (parts, Json(ErrorResponse::new(code.as_str(), message))).into_response()
}

/// Request logging middleware with timing, request ID and HTTP metrics
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    metrics::record_http_request(
        method.as_str(),
        &route,
        response.status().as_u16(),
        duration.as_secs_f64(),
    );

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Bearer authentication for protected routes
///
/// On success the resolved [`crate::domain::AuthenticatedUser`] is stored in
/// the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .and_then(|token| state.auth_service.authenticate(token));

    match principal {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::debug!(uri = %request.uri(), "Rejected unauthenticated request");
            let code = ErrorCode::Unauthorized;
            error_body(code.status(), code.as_str(), code.message())
        }
    }
}
