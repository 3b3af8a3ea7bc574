//! REST API for laundry and shoe-care orders.
//!
//! Each order is an *item* row in a hosted Postgres table exposed through
//! Supabase's PostgREST endpoint. The service validates input, normalizes the
//! item status and forwards single-row operations to the store:
//!
//! ```text
//! POST   /items        create   -> 201 item
//! GET    /items        list     -> 200 [item] (newest first, ?status=)
//! GET    /items/:id    fetch    -> 200 item
//! PATCH  /items/:id    update   -> 200 item
//! DELETE /items/:id    delete   -> 200 {deleted, item}
//! GET    /health       liveness -> 200 {ok, uptime}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`item`]: Item records, request bodies and status normalization
//! - [`store`]: Store trait with Supabase and in-memory implementations
//! - [`api`]: HTTP handlers and router
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod item;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
