//! Axum router configuration with middleware.
//!
//! All REST routes are under `/api/v1/`; the live chat socket is at
//! `/ws/chat`. Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Accounts
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // Chat read side
        .route("/chat/sessions", get(handlers::session::list_sessions))
        .route(
            "/chat/sessions/{id}/messages",
            get(handlers::session::get_messages),
        )
        .route("/chat/thread", get(handlers::session::get_own_thread))
        .route(
            "/chat/users/{user_id}/thread",
            get(handlers::session::get_user_thread),
        )
        .route("/chat/unread", get(handlers::session::get_unread));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/ws/chat", get(handlers::ws::ws_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
