//! HTTP API server for mailtriage.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]
#![allow(clippy::single_call_fn, reason = "Helper functions improve readability")]

pub mod api_error;
mod handlers;
mod query_types;
mod response_types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use mailtriage_service::EmailService;

/// Shared application state for all HTTP handlers.
pub struct AppState {
    /// Service for email queries and mutations
    pub email_service: Arc<EmailService>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    use handlers::email;

    Router::new()
        .route("/health", get(health))
        .route("/api/email/list", get(email::list_emails).fallback(api_error::method_not_allowed))
        .route("/api/email/mark", post(email::mark_email).fallback(api_error::method_not_allowed))
        .route(
            "/api/email/recipients",
            get(email::list_recipients).fallback(api_error::method_not_allowed),
        )
        .route(
            "/api/email/delete",
            post(email::delete_email).fallback(api_error::method_not_allowed),
        )
        .route(
            "/api/email/batch-delete",
            post(email::batch_delete_emails).fallback(api_error::method_not_allowed),
        )
        .route(
            "/api/email/update",
            post(email::update_email).fallback(api_error::method_not_allowed),
        )
        .route(
            "/api/email/ingest",
            post(email::ingest_email).fallback(api_error::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod router_tests;
