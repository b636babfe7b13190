use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use barbershop_backend::domain::BookingPolicy;
use barbershop_backend::rest::{self, AppState};
use barbershop_backend::storage::csv::CsvConnection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    info!("Opening data directory at {}", data_dir);
    let connection = Arc::new(CsvConnection::new(PathBuf::from(&data_dir))?);

    let policy_path =
        std::env::var("POLICY_FILE").unwrap_or_else(|_| format!("{}/policy.json", data_dir));
    let policy = BookingPolicy::load(&policy_path)?;

    let state = AppState::new(connection, policy);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", rest::router(state))
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
