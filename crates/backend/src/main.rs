mod auth;
mod db;
mod error;
mod handlers;
mod metrics;
mod models;
mod schema;
mod storage;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::AuthConfig;
use crate::db::DbPool;
use crate::metrics::Metrics;
use crate::storage::{LocalDiskStore, PhotoStore};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub auth_config: AuthConfig,
    pub photo_store: Arc<dyn PhotoStore>,
    pub metrics: Arc<Metrics>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let auth_config = AuthConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()?;

    tracing::info!("Starting todo board backend server");

    // Initialize database pool
    let pool = db::establish_connection_pool()?;
    tracing::info!("Database connection pool initialized");

    let state = AppState {
        pool,
        auth_config,
        photo_store: Arc::new(LocalDiskStore::new(upload_dir.clone())),
        metrics: Arc::new(Metrics::new()),
    };

    // Build application
    let app = create_app(state, &upload_dir);

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_app(state: AppState, upload_dir: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .nest("/api/v1", api_routes())
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/google/login", get(auth::handlers::auth_login))
        .route("/auth/google/callback", get(auth::handlers::auth_callback))
        .route("/auth/me", get(auth::handlers::auth_me))
        .route("/auth/logout", get(auth::handlers::auth_logout))
        // Todos
        .route(
            "/todos",
            get(handlers::todos::list_todos).post(handlers::todos::create_todo),
        )
        .route(
            "/todos/:todo_id",
            get(handlers::todos::get_todo)
                .put(handlers::todos::update_todo)
                .delete(handlers::todos::delete_todo),
        )
        .route(
            "/todos/column/:column_status",
            delete(handlers::todos::bulk_delete_todos_by_status),
        )
        // Photos
        .route(
            "/todos/:todo_id/photos",
            post(handlers::photos::upload_photo),
        )
        .route(
            "/todos/photos/:photo_id",
            delete(handlers::photos::delete_photo),
        )
        // Column settings
        .route(
            "/columns",
            get(handlers::columns::get_column_settings)
                .post(handlers::columns::create_column_settings)
                .put(handlers::columns::update_column_settings)
                .delete(handlers::columns::delete_column_settings),
        )
        .route("/columns/reset", post(handlers::columns::reset_column_settings))
        .route(
            "/columns/default",
            get(handlers::columns::get_default_column_settings),
        )
}

/// Build CORS layer based on environment configuration.
///
/// If CORS_ALLOWED_ORIGINS is set, only those origins are allowed.
/// If not set, defaults to permissive CORS (for development only).
fn build_cors_layer() -> CorsLayer {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS").ok();

    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!(
                    "CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS (not recommended for production)"
                );
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                    .allow_credentials(true)
            }
        }
        None => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
