//! GitHub login flow and the current-user endpoint

use axum::{
    Extension,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use reqwest::Url;

use super::{AppState, invalid_query};
use crate::application::errors::{ApplicationError, AuthError};
use crate::domain::AuthenticatedUser;
use crate::presentation::models::{ErrorResponse, OAuthCallbackQuery, UserInfoResponse};

fn found(location: &Url) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.as_str())]).into_response()
}

/// Redirect the browser to GitHub's authorization page
#[utoipa::path(
    get,
    path = "/api/auth/login/github",
    tag = "auth",
    responses(
        (status = 302, description = "Redirect to GitHub")
    )
)]
pub async fn login_github(State(app_state): State<AppState>) -> Result<Response, ApplicationError> {
    let url = app_state.auth_service.begin_login().await?;
    Ok(found(&url))
}

/// GitHub redirects here after the user authorizes the application
#[utoipa::path(
    get,
    path = "/login/oauth2/code/github",
    tag = "auth",
    params(OAuthCallbackQuery),
    responses(
        (status = 302, description = "Redirect to the frontend with `?token=<jwt>`"),
        (status = 401, description = "Unknown state or rejected authorization", body = ErrorResponse)
    )
)]
pub async fn github_callback(
    State(app_state): State<AppState>,
    query: Result<Query<OAuthCallbackQuery>, QueryRejection>,
) -> Result<Response, ApplicationError> {
    let Query(query) = query.map_err(invalid_query)?;

    if let Some(error) = query.error {
        return Err(AuthError::Provider { message: error }.into());
    }
    let (Some(code), Some(state)) = (query.code, query.state) else {
        return Err(AuthError::InvalidState.into());
    };

    let redirect = app_state.auth_service.complete_login(&code, &state).await?;
    Ok(found(&redirect))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfoResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 422, description = "User no longer exists", body = ErrorResponse)
    )
)]
pub async fn me(
    State(app_state): State<AppState>,
    Extension(principal): Extension<AuthenticatedUser>,
) -> Result<Json<UserInfoResponse>, ApplicationError> {
    let user = app_state.auth_service.current_user(principal.user_id).await?;
    Ok(Json(UserInfoResponse::from(user)))
}
