//! Market data endpoints

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    response::Json,
};

use super::{AppState, invalid_query};
use crate::application::errors::ApplicationError;
use crate::presentation::models::{
    CoinDetailResponse, CoinListQuery, CoinListResponse, CoinSummaryDto, ErrorResponse,
    OhlcvDto, OhlcvQuery, OhlcvResponse,
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_SIZE: i64 = 10;
const MAX_SIZE: i64 = 250;
const DEFAULT_TIMEFRAME: &str = "1d";

impl CoinListQuery {
    /// Validate and normalize pagination parameters
    pub fn validate(&self) -> Result<(u32, u32), ApplicationError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let size = self.size.unwrap_or(DEFAULT_SIZE);

        if page < 1 {
            return Err(ApplicationError::validation(
                "page",
                "must be greater than or equal to 1",
            ));
        }
        if size < 1 {
            return Err(ApplicationError::validation(
                "size",
                "must be greater than or equal to 1",
            ));
        }
        if size > MAX_SIZE {
            return Err(ApplicationError::validation(
                "size",
                format!("must be less than or equal to {}", MAX_SIZE),
            ));
        }

        let page = u32::try_from(page)
            .map_err(|_| ApplicationError::validation("page", "is out of range"))?;
        Ok((page, size as u32))
    }
}

/// List coins with pagination and an optional keyword filter
#[utoipa::path(
    get,
    path = "/api/market/coins",
    tag = "market",
    params(CoinListQuery),
    responses(
        (status = 200, description = "Coin listing", body = CoinListResponse),
        (status = 400, description = "Malformed query string", body = ErrorResponse),
        (status = 422, description = "Pagination out of range", body = ErrorResponse),
        (status = 429, description = "CoinGecko rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn get_coins(
    State(app_state): State<AppState>,
    query: Result<Query<CoinListQuery>, QueryRejection>,
) -> Result<Json<CoinListResponse>, ApplicationError> {
    let Query(query) = query.map_err(invalid_query)?;
    let (page, size) = query.validate()?;

    let coins = app_state
        .market_service
        .get_coins(page, size, query.keyword.as_deref())
        .await?;

    Ok(Json(CoinListResponse {
        coins: coins.into_iter().map(CoinSummaryDto::from).collect(),
        page,
        size,
    }))
}

/// Full market data for a single coin
#[utoipa::path(
    get,
    path = "/api/market/coins/{coin_id}",
    tag = "market",
    params(
        ("coin_id" = String, Path, description = "CoinGecko coin id", example = "bitcoin")
    ),
    responses(
        (status = 200, description = "Coin market data", body = CoinDetailResponse),
        (status = 404, description = "Unknown coin", body = ErrorResponse)
    )
)]
pub async fn get_coin_detail(
    State(app_state): State<AppState>,
    Path(coin_id): Path<String>,
) -> Result<Json<CoinDetailResponse>, ApplicationError> {
    let coin = app_state.market_service.get_coin_detail(&coin_id).await?;
    Ok(Json(CoinDetailResponse::from(coin)))
}

/// OHLC candles for a coin over the requested timeframe
#[utoipa::path(
    get,
    path = "/api/market/coins/{coin_id}/ohlcv",
    tag = "market",
    params(
        ("coin_id" = String, Path, description = "CoinGecko coin id", example = "bitcoin"),
        OhlcvQuery
    ),
    responses(
        (status = 200, description = "Candle series", body = OhlcvResponse),
        (status = 400, description = "Invalid timeframe", body = ErrorResponse)
    )
)]
pub async fn get_ohlcv(
    State(app_state): State<AppState>,
    Path(coin_id): Path<String>,
    query: Result<Query<OhlcvQuery>, QueryRejection>,
) -> Result<Json<OhlcvResponse>, ApplicationError> {
    let Query(query) = query.map_err(invalid_query)?;
    let timeframe_text = query
        .timeframe
        .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());
    let timeframe = app_state.market_service.parse_timeframe(&timeframe_text)?;

    let candles = app_state
        .market_service
        .get_ohlcv(&coin_id, timeframe)
        .await?;

    Ok(Json(OhlcvResponse {
        coin_id,
        timeframe: timeframe.as_str().to_string(),
        data: candles.into_iter().map(OhlcvDto::from).collect(),
    }))
}
