use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod config;
mod database;
mod error;
mod handlers;
mod multipart;
mod services;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();
    tracing::info!("Starting PSOT admin API in {:?} mode", config.environment);

    // Best effort: the server still starts without connectivity so /health
    // can report the degraded state
    if let Err(e) = crate::database::manager::DatabaseManager::run_migrations().await {
        tracing::warn!("Skipping migrations, database unavailable: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("ADMIN_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("PSOT admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(points_routes())
        .merge(storage_routes())
        // Global middleware: permissive CORS answers the frontend's OPTIONS
        // preflights; unsupported methods on matched routes get a 405
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(
            crate::config::config().api.max_request_size_bytes,
        ))
}

fn points_routes() -> Router {
    use handlers::{points, points_rules};

    Router::new()
        .route(
            "/points",
            get(points::get).post(points::post).put(points::put),
        )
        .route(
            "/points-rules",
            get(points_rules::get)
                .post(points_rules::post)
                .put(points_rules::put),
        )
}

fn storage_routes() -> Router {
    use handlers::{folders, upload};

    Router::new()
        .route("/storage/folders", get(folders::get).post(folders::post))
        .route("/upload-file", post(upload::post))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "PSOT Admin API (Rust)",
        "version": version,
        "description": "Multi-tenant enterprise administration backend",
        "endpoints": {
            "points": "GET/POST/PUT /points",
            "points_rules": "GET/POST/PUT /points-rules",
            "storage_folders": "GET/POST /storage/folders",
            "upload": "POST /upload-file",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
