// Bursary Dashboard - Web Server
// Serves the dashboard page and its view model over HTTP with Axum

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use bursary_dashboard::{html, Dashboard, DashboardConfig, Dataset, QualificationKeyTable, CONFIG_FILE};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<DashboardConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Files are re-read on every request so edits to the CSVs show up on refresh
fn build_dashboard(config: &DashboardConfig) -> Result<Dashboard> {
    let dataset = Dataset::load(config)?;
    let dashboard = Dashboard::build(&dataset, config)?;
    Ok(dashboard)
}

/// Run the synchronous CSV pipeline off the async workers
async fn blocking<T, F>(config: Arc<DashboardConfig>, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&DashboardConfig) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || job(&config))
        .await
        .context("dashboard task panicked")?
}

fn api_error<T: Serialize>(context: &str, e: anyhow::Error) -> Response {
    error!(error = %format!("{:#}", e), "{}", context);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<T>::err(format!("{:#}", e))),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Rendered dashboard page
async fn serve_dashboard(State(state): State<AppState>) -> Response {
    match blocking(state.config.clone(), build_dashboard).await {
        Ok(dashboard) => Html(html::render_page(&dashboard)).into_response(),
        Err(e) => {
            error!(error = %format!("{:#}", e), "failed to build dashboard");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(html::render_error_page(&state.config.title, &format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - Dashboard view model as JSON
async fn get_dashboard(State(state): State<AppState>) -> Response {
    match blocking(state.config.clone(), build_dashboard).await {
        Ok(dashboard) => (StatusCode::OK, Json(ApiResponse::ok(dashboard))).into_response(),
        Err(e) => api_error::<Dashboard>("failed to build dashboard", e),
    }
}

/// GET /api/qualification-key - Deduplicated qualification key table
async fn get_qualification_key(State(state): State<AppState>) -> Response {
    let load = |config: &DashboardConfig| -> Result<QualificationKeyTable> {
        Ok(Dataset::load(config)?.qualification_key)
    };

    match blocking(state.config.clone(), load).await {
        Ok(key) => (StatusCode::OK, Json(ApiResponse::ok(key))).into_response(),
        Err(e) => api_error::<QualificationKeyTable>("failed to load qualification key", e),
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/qualification-key", get(get_qualification_key))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_dashboard))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE))?;
    let addr = config.server_addr.clone();

    let state = AppState {
        config: Arc::new(config),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!(%addr, "bursary dashboard server listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
