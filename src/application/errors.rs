//! Application layer error types

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::database::DbError;

/// Business error codes surfaced to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Common
    InvalidParameter,
    DataNotFound,
    InternalServerError,
    // Auth
    Unauthorized,
    AccessDenied,
    // User
    UserNotFound,
    DuplicateEmail,
    // Market
    CoinNotFound,
    ExternalApiError,
    // CoinGecko
    CoingeckoRateLimit,
    CoingeckoTimeout,
    CoingeckoServerError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidParameter => StatusCode::BAD_REQUEST,
            ErrorCode::DataNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::AccessDenied => StatusCode::FORBIDDEN,
            ErrorCode::UserNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DuplicateEmail => StatusCode::CONFLICT,
            ErrorCode::CoinNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ExternalApiError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::CoingeckoRateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::CoingeckoTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::CoingeckoServerError => StatusCode::BAD_GATEWAY,
        }
    }

    /// Wire name of the code, e.g. `COIN_NOT_FOUND`
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::DataNotFound => "DATA_NOT_FOUND",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::DuplicateEmail => "DUPLICATE_EMAIL",
            ErrorCode::CoinNotFound => "COIN_NOT_FOUND",
            ErrorCode::ExternalApiError => "EXTERNAL_API_ERROR",
            ErrorCode::CoingeckoRateLimit => "COINGECKO_RATE_LIMIT",
            ErrorCode::CoingeckoTimeout => "COINGECKO_TIMEOUT",
            ErrorCode::CoingeckoServerError => "COINGECKO_SERVER_ERROR",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameter => "Invalid request parameter",
            ErrorCode::DataNotFound => "Requested data was not found",
            ErrorCode::InternalServerError => "Internal server error",
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::AccessDenied => "Access denied",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::DuplicateEmail => "Email is already in use",
            ErrorCode::CoinNotFound => "Coin not found",
            ErrorCode::ExternalApiError => "External API call failed",
            ErrorCode::CoingeckoRateLimit => "CoinGecko API rate limit exceeded",
            ErrorCode::CoingeckoTimeout => "CoinGecko API request timed out",
            ErrorCode::CoingeckoServerError => "CoinGecko API server error",
        }
    }
}

/// User-facing alert codes; always reported as HTTP 422
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCode {
    MemberNotFound,
    InvalidInputValue,
    InvalidDateRange,
    SymbolNotSupported,
}

impl AlertCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCode::MemberNotFound => "MEMBER_NOT_FOUND",
            AlertCode::InvalidInputValue => "INVALID_INPUT_VALUE",
            AlertCode::InvalidDateRange => "INVALID_DATE_RANGE",
            AlertCode::SymbolNotSupported => "SYMBOL_NOT_SUPPORTED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AlertCode::MemberNotFound => "Member not found",
            AlertCode::InvalidInputValue => "Invalid input value",
            AlertCode::InvalidDateRange => "Invalid date range",
            AlertCode::SymbolNotSupported => "Unsupported coin symbol",
        }
    }
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Market data error: {0}")]
    MarketApi(#[from] MarketApiError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("{message}")]
    Business { code: ErrorCode, message: String },

    #[error("{message}")]
    Alert { code: AlertCode, message: String },

    /// A request parameter violated a declared constraint
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// The query string could not be parsed at all
    #[error("{message}")]
    MalformedQuery { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ApplicationError {
    /// Business error carrying the code's default message
    pub fn business(code: ErrorCode) -> Self {
        Self::business_with_message(code, code.message())
    }

    pub fn business_with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        ApplicationError::Business {
            code,
            message: message.into(),
        }
    }

    pub fn alert(code: AlertCode) -> Self {
        ApplicationError::Alert {
            code,
            message: code.message().to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApplicationError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the CoinGecko client
#[derive(Error, Debug)]
pub enum MarketApiError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("server error {status}")]
    Server { status: u16 },

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed or timed out: {message}")]
    Timeout { message: String },

    #[error("invalid response body: {message}")]
    Decode { message: String },
}

impl MarketApiError {
    /// Error code reported to API clients
    pub fn error_code(&self) -> ErrorCode {
        match self {
            MarketApiError::RateLimited => ErrorCode::CoingeckoRateLimit,
            MarketApiError::Server { .. } => ErrorCode::CoingeckoServerError,
            MarketApiError::Timeout { .. } => ErrorCode::CoingeckoTimeout,
            MarketApiError::Http { .. } | MarketApiError::Decode { .. } => {
                ErrorCode::ExternalApiError
            }
        }
    }

    /// Short label used for metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            MarketApiError::RateLimited => "rate_limited",
            MarketApiError::Server { .. } => "server_error",
            MarketApiError::Http { .. } => "http_error",
            MarketApiError::Timeout { .. } => "timeout",
            MarketApiError::Decode { .. } => "decode_error",
        }
    }
}

impl From<reqwest::Error> for MarketApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MarketApiError::Decode {
                message: err.to_string(),
            }
        } else {
            // Connect failures, resets and timeouts all surface as I/O failures
            MarketApiError::Timeout {
                message: err.to_string(),
            }
        }
    }
}

/// Errors raised while issuing or checking credentials
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing or invalid bearer token")]
    InvalidToken,

    #[error("Unknown or expired OAuth state")]
    InvalidState,

    #[error("OAuth provider error: {message}")]
    Provider { message: String },

    #[error("JWT secret must be at least {min_bytes} bytes")]
    WeakSecret { min_bytes: usize },

    #[error("Token creation failed: {0}")]
    TokenCreation(#[from] jsonwebtoken::errors::Error),
}
