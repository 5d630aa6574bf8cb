//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Fallback handler: JSON 404 for unknown routes
async fn fallback_handler(uri: axum::http::Uri) -> impl IntoResponse {
    let body = serde_json::json!({ "error": format!("Not Found: {}", uri.path()) });
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(body.to_string()),
    )
        .into_response()
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Wallets
        .route(
            "/api/wallets",
            get(handlers::list_wallets).post(handlers::create_wallet),
        )
        .route("/api/wallets/{id}", get(handlers::get_wallet))
        .route("/api/wallets/{id}/summary", get(handlers::get_wallet_summary))
        .route("/api/wallets/{id}/rename", post(handlers::rename_wallet))
        .route("/api/wallets/{id}/owners", post(handlers::add_owner))
        .route("/api/wallets/{id}/owners/remove", post(handlers::remove_owner))
        .route("/api/wallets/{id}/threshold", post(handlers::change_threshold))
        .route("/api/wallets/{id}/balance", post(handlers::set_balance))
        .route(
            "/api/owners/{identity}/wallets",
            get(handlers::list_owner_wallets),
        )
        // Transactions
        .route(
            "/api/wallets/{id}/transactions",
            get(handlers::list_wallet_transactions).post(handlers::propose_transaction),
        )
        .route("/api/transactions/{id}", get(handlers::get_transaction))
        .route(
            "/api/transactions/{id}/approve",
            post(handlers::approve_transaction),
        )
        .route(
            "/api/transactions/{id}/reject",
            post(handlers::reject_transaction),
        )
        .route(
            "/api/transactions/{id}/execute",
            post(handlers::execute_transaction),
        )
        .fallback(fallback_handler)
        // Add state and middleware
        .with_state(state)
        .layer(cors)
}

/// Routes listed at server start-up
pub const ROUTE_TABLE: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Health check"),
    ("GET", "/api/wallets", "List wallets"),
    ("POST", "/api/wallets", "Create wallet"),
    ("GET", "/api/wallets/{id}", "Get wallet by id or address"),
    ("GET", "/api/wallets/{id}/summary", "Wallet summary"),
    ("POST", "/api/wallets/{id}/rename", "Rename wallet"),
    ("POST", "/api/wallets/{id}/owners", "Add owner"),
    ("POST", "/api/wallets/{id}/owners/remove", "Remove owner"),
    ("POST", "/api/wallets/{id}/threshold", "Change threshold"),
    ("POST", "/api/wallets/{id}/balance", "Set display balance"),
    ("GET", "/api/owners/{identity}/wallets", "Wallets of an owner"),
    ("GET", "/api/wallets/{id}/transactions", "List transactions (?status=, ?awaiting=)"),
    ("POST", "/api/wallets/{id}/transactions", "Propose transaction"),
    ("GET", "/api/transactions/{id}", "Get transaction"),
    ("POST", "/api/transactions/{id}/approve", "Approve transaction"),
    ("POST", "/api/transactions/{id}/reject", "Reject transaction"),
    ("POST", "/api/transactions/{id}/execute", "Execute transaction"),
];
