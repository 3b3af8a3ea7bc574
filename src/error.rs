//! Unified error types for the items service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::item::Status;

/// Process-level error (startup, configuration, serving).
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Store client could not be constructed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Metrics exporter failed to start.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller input that cannot be accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `customer_name` or `service_type` missing or empty on create.
    #[error("customer_name and service_type are required")]
    MissingRequired,

    /// Status does not match any known label.
    #[error("invalid status. Valid choices: {choices}")]
    InvalidStatus {
        /// Comma-separated valid labels.
        choices: String,
    },

    /// A required column was sent as an empty string.
    #[error("{field} must be a non-empty string")]
    EmptyField {
        /// Offending field.
        field: &'static str,
    },

    /// A non-nullable column was sent as null.
    #[error("{field} cannot be null")]
    NullField {
        /// Offending field.
        field: &'static str,
    },

    /// Price is a number the price column cannot hold.
    #[error("price is out of range")]
    PriceOutOfRange,

    /// Body could not be parsed into the expected shape.
    #[error("invalid request body: {0}")]
    Body(String),
}

impl ValidationError {
    /// Error for an unrecognized status, listing the valid labels.
    pub fn invalid_status() -> Self {
        ValidationError::InvalidStatus {
            choices: Status::choices(),
        }
    }
}

/// Errors reported by an item store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A single-row operation matched no row.
    #[error("no row matched the request")]
    NotFound,

    /// Store URL or key missing.
    #[error("store is not configured: set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY or SUPABASE_ANON_KEY")]
    NotConfigured,

    /// Store URL is malformed.
    #[error("invalid store url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The store answered with an error object.
    #[error("{message}")]
    Remote {
        /// Store error code, when present.
        code: Option<String>,
        /// Store error message.
        message: String,
    },

    /// Transport failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Id cannot key a row in this store.
    #[error("invalid item id {0:?}")]
    InvalidId(String),

    /// Response body did not match the item shape.
    #[error("failed to decode store response: {0}")]
    Decode(String),
}

/// HTTP-facing error, rendered as `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 400.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 404.
    #[error("{0}")]
    NotFound(String),

    /// 500.
    #[error(transparent)]
    Store(StoreError),

    /// 500 for failures outside the store.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a store failure for a single-row operation on `id`.
    pub fn from_store(err: StoreError, id: &str) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(format!("item {} not found", id)),
            other => ApiError::Store(other),
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("item not found".to_string()),
            other => ApiError::Store(other),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
