// ABOUTME: Main entry point for the storekeep inventory-assignment tracker
// ABOUTME: Sets up the web server, routes, and initialization logic

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod entities;
mod error;
mod items;
mod middleware;
mod migration;
mod storage;
mod types;

#[cfg(test)]
mod storage_tests;

use auth::AuthState;
use config::{AssignPolicy, Config};
use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub storage: Arc<Storage>,
    pub policy: AssignPolicy,
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh-token", post(auth::refresh_token))
        .route("/api/items", get(items::list_items).post(items::create_item))
        .route("/api/items/search", get(items::search_items))
        .route("/api/items/filter", get(items::filter_items))
        .route("/api/items/assigned", get(items::assigned_items))
        .route("/api/items/request", post(items::request_item))
        .route("/api/items/assign", post(items::assign_item))
        .route("/api/items/reassign", post(items::reassign_item))
        .route(
            "/api/items/:item_id",
            put(items::update_item).delete(items::delete_item),
        )
        .route("/api/items/:item_id/status", put(items::update_status))
        .route("/api/items/:item_id/report", post(items::report_issue))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    // Connect and migrate
    let storage = Arc::new(Storage::new(&config.database_url).await?);

    let auth = AuthState::new(&config.jwt_secret, config.token_ttl_secs);

    let state = AppState {
        auth,
        storage,
        policy: config.assign_policy,
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    println!("🚀 Server running on http://{}", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
