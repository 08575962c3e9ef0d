//! Repograph Web Server
//!
//! Axum-based HTTP surface: signed push events and operator control endpoints.

pub mod error;
pub mod routes;
pub mod signature;
pub mod state;

use std::future::Future;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::ApiError;
pub use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/webhook", post(routes::webhook::receive))
        .route("/rollback/{revision}", post(routes::control::rollback))
        .route("/graph/health", get(routes::control::graph_health))
        .route("/health", get(routes::control::liveness))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server until `shutdown` resolves.
pub async fn run_server<F>(state: AppState, host: &str, port: u16, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
