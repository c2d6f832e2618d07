//! JudgeFlow - Application Entry Point
//!
//! This is the main entry point for the JudgeFlow server.

use std::net::SocketAddr;

use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use judgeflow::{config::CONFIG, db, handlers, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting JudgeFlow server...");

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&CONFIG.database).await?;
    db::test_connection(&db_pool).await?;

    // Run database migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    // Redis only backs the node load event log, so the server runs without it
    tracing::info!("Connecting to Redis...");
    let redis_conn = match connect_redis(&CONFIG.redis.url).await {
        Ok(conn) => Some(conn),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, node load events will not be recorded");
            None
        }
    };

    // Create application state
    let state = AppState::new(db_pool, redis_conn, CONFIG.clone())?;

    // Build the router
    let app = handlers::app(state).layer(CompressionLayer::new()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_redis(url: &str) -> redis::RedisResult<redis::aio::ConnectionManager> {
    let client = RedisClient::open(url)?;
    redis::aio::ConnectionManager::new(client).await
}
