use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use handlers::brochure_filename;
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/generate-brochure", post(handlers::generate_brochure))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves the app until the process stops.
pub async fn serve(state: AppState, addr: &str) -> folio_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌍 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state).await).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::AppState;
    pub use folio_core::{BrochureRequest, Error, Result};
}
