//! Route handlers

pub mod health;
pub mod task;

use axum::{http::StatusCode, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::response::ApiError;
use crate::state::AppState;

async fn route_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        "Method not allowed",
    )
}

/// Build the full application router with its middleware
pub fn app(state: AppState) -> Router {
    let prefix = state.config().api_prefix.clone();
    let cors_permissive = state.config().cors_permissive;

    let api = if prefix.is_empty() {
        task::router()
    } else {
        Router::new().nest(&prefix, task::router())
    };

    let app = Router::new()
        .merge(health::router())
        .merge(api)
        // must follow merge: only applies to routes already registered
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}
