//! HTTP API route definitions.

use axum::{
    middleware,
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsOrigins;

use super::handlers::{
    create_item, delete_item, get_item, handle_panic, head_probe, health, list_items,
    not_found, update_item, AppState,
};

/// Build the CORS layer for the configured origins.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::from(Any),
        CorsOrigins::List(list) => AllowOrigin::list(list.clone()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the API router.
pub fn create_router(state: AppState, origins: &CorsOrigins) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route(
            "/items",
            get(list_items).post(create_item).fallback(not_found),
        )
        .route(
            "/items/:id",
            get(get_item)
                .patch(update_item)
                .delete(delete_item)
                .fallback(not_found),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        // Outermost: liveness probes never reach routing.
        .layer(middleware::from_fn(head_probe))
}
