use std::{net::SocketAddr, sync::Arc};

use axum::http::{HeaderValue, Method};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pollvote_backend::app;
use pollvote_backend::core::AdmissionPolicy;
use pollvote_backend::db;
use pollvote_backend::state::AppState;
use pollvote_backend::store::{DocumentStore, MongoStore};

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database = match db::connection::init_db().await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn DocumentStore> = Arc::new(MongoStore::new(database));

    let policy = AdmissionPolicy {
        reject_inactive: env_flag("REJECT_INACTIVE_POLLS", true),
        reject_expired: env_flag("REJECT_EXPIRED_POLLS", true),
    };

    let app_state = AppState::new(store, policy);

    let cors_origin = match std::env::var("CORS_ORIGIN") {
        Ok(origin) => origin,
        Err(_) => {
            error!("CORS_ORIGIN environment variable not set");
            std::process::exit(1);
        }
    };

    let origin = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(_) => {
            error!("Failed to parse CORS origin: {}", cors_origin);
            std::process::exit(1);
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::AUTHORIZATION,
            axum::http::header::COOKIE,
        ])
        .allow_credentials(true);

    let app = app(app_state).layer(cors);

    let server_addr =
        std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let addr: SocketAddr = match server_addr.parse() {
        Ok(addr) => addr,
        Err(_) => {
            error!("Failed to parse SERVER_ADDR: {}", server_addr);
            std::process::exit(1);
        }
    };

    info!(%addr, cors_origin = %cors_origin, "server starting");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
