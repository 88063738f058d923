// Review Board Server

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use review_board::{app_state::AppState, config::Config, rest_interface::create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app_state = AppState::new(config.clone()).await?;
    let store = app_state.store.clone();

    let app = create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = config.server_address().parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Review Board listening on http://{}", addr);
    tracing::info!("  POST/GET /users, POST/GET /movies, POST/GET /reviews, POST/GET /posts");
    tracing::info!("  GET /movies/ratings, GET /movies/top-sci-fi, GET /posts/clean, GET /posts/latest");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("storage closed, bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
