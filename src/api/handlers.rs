//! HTTP API handlers.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, error, info};

use crate::error::{ApiError, ErrorBody, StoreError, ValidationError};
use crate::item::{CreateItemRequest, DeletedItem, Item, Status, UpdateItemRequest};
use crate::metrics::{self, StoreTimer};
use crate::store::ItemStore;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Item persistence.
    pub store: Arc<dyn ItemStore>,
    /// Process start, for `/health` uptime.
    started_at: Instant,
}

impl AppState {
    /// Create new app state around a store.
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always true.
    pub ok: bool,
    /// Uptime in seconds.
    pub uptime: f64,
}

/// Query string of `GET /items`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Optional status filter, any case.
    pub status: Option<String>,
}

fn reject(err: ValidationError) -> ApiError {
    debug!(error = %err, "Rejected request");
    metrics::inc_validation_failures();
    ApiError::Validation(err)
}

fn store_failure(op: &'static str, id: Option<&str>, err: StoreError) -> ApiError {
    match (&err, id) {
        (StoreError::NotFound, Some(id)) => {
            debug!(op, id, "Item not found");
            ApiError::from_store(err, id)
        }
        _ => {
            error!(op, error = %err, "Store call failed");
            ApiError::from(err)
        }
    }
}

/// Health check handler - always returns 200.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        uptime: state.uptime(),
    })
}

/// `POST /items`.
pub async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(request) = body.map_err(|e| reject(ValidationError::Body(e.body_text())))?;
    let new_item = request
        .into_new_item(OffsetDateTime::now_utc())
        .map_err(reject)?;

    let item = StoreTimer::start("insert")
        .finish(state.store.insert(new_item).await)
        .map_err(|e| store_failure("insert", None, e))?;

    metrics::inc_items_created();
    info!(id = %item.id, status = %item.status, "Item created");

    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /items[?status=]`.
pub async fn list_items(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let Query(query) = query.map_err(|e| reject(ValidationError::Body(e.body_text())))?;

    // `?status=` with an empty value means no filter.
    let filter = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let status = Status::parse_label(raw)
                .ok_or_else(|| reject(ValidationError::invalid_status()))?;
            Some(status)
        }
    };

    let items = StoreTimer::start("list")
        .finish(state.store.list(filter).await)
        .map_err(|e| store_failure("list", None, e))?;

    debug!(count = items.len(), ?filter, "Listed items");
    Ok(Json(items))
}

/// `GET /items/:id`.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let item = StoreTimer::start("get")
        .finish(state.store.get(&id).await)
        .map_err(|e| store_failure("get", Some(&id), e))?;

    Ok(Json(item))
}

/// `PATCH /items/:id`.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(request) = body.map_err(|e| reject(ValidationError::Body(e.body_text())))?;
    let patch = request
        .into_patch(OffsetDateTime::now_utc())
        .map_err(reject)?;

    let item = StoreTimer::start("update")
        .finish(state.store.update(&id, patch).await)
        .map_err(|e| store_failure("update", Some(&id), e))?;

    metrics::inc_items_updated();
    info!(id = %item.id, status = %item.status, "Item updated");

    Ok(Json(item))
}

/// `DELETE /items/:id`.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedItem>, ApiError> {
    let item = StoreTimer::start("delete")
        .finish(state.store.delete(&id).await)
        .map_err(|e| store_failure("delete", Some(&id), e))?;

    metrics::inc_items_deleted();
    info!(id = %item.id, "Item deleted");

    Ok(Json(DeletedItem {
        deleted: true,
        item,
    }))
}

/// Catch-all for unknown paths and unsupported methods.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
        }),
    )
}

/// Answer `HEAD` on any path with an empty 200 before routing.
pub async fn head_probe(request: Request, next: Next) -> Response {
    if request.method() == Method::HEAD {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

/// Render a panicking handler as a 500 JSON error.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Handler panicked");

    ApiError::Internal("internal error".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn uptime_is_monotonic() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        let first = state.uptime();
        assert!(first >= 0.0);
        assert!(state.uptime() >= first);
    }

    #[test]
    fn panic_response_is_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_failures_map_by_kind() {
        let err = store_failure("get", Some("5"), StoreError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = store_failure("list", None, StoreError::NotConfigured);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
