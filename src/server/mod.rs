mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::geo::GeoResolver;

pub fn build_router(resolver: GeoResolver) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/api/geo/resolve", get(handlers::resolve))
        .route("/api/geo/resolve/batch", post(handlers::resolve_batch))
        .route("/api/geo/cache", get(handlers::cache_info))
        .route("/api/geo/cache/clear", post(handlers::cache_clear))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, resolver: GeoResolver) {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!(%addr, "kartograf server listening");

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    });
}
