// Tint Shop - Web Server
// JSON read API over the shop database (Axum)

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Local;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use tint_shop::{
    load_report, scale_formulation, search_by_color, search_by_customer, share_purchase, ColorSearchResult,
    CustomerSearchResult, PersistenceGateway, ShopConfig, ShopError, ShopResult, SqliteGateway,
};

/// Command-line arguments for the shop server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind (overrides TINT_SHOP_ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// SQLite database file (overrides TINT_SHOP_DB)
    #[arg(long)]
    db: Option<PathBuf>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    gateway: Arc<SqliteGateway>,
    config: Arc<ShopConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Set when data is a fallback shown instead of failing the page
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
            warning: None,
        }
    }

    fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

impl ApiResponse<()> {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
            warning: None,
        }
    }
}

fn status_for(error: &ShopError) -> StatusCode {
    match error {
        ShopError::NotFound { .. } => StatusCode::NOT_FOUND,
        ShopError::InvalidBaseSize(_)
        | ShopError::InvalidTargetSize(_)
        | ShopError::InvalidQuantity(_)
        | ShopError::Validation(_) => StatusCode::BAD_REQUEST,
        ShopError::DataSourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ShopError::ExtractionFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

fn respond<T: Serialize>(result: ShopResult<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => {
            warn!(error = %e, "request failed");
            (status_for(&e), Json(ApiResponse::failed(e.to_string()))).into_response()
        }
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/report - Shop summary; zeros plus a warning when the store is down
async fn get_report(State(state): State<AppState>) -> impl IntoResponse {
    let today = Local::now().date_naive();
    let outcome = load_report(state.gateway.as_ref(), today, &state.config.report);

    Json(ApiResponse::ok(outcome.summary).with_warning(outcome.warning))
}

/// GET /api/customers
async fn get_customers(State(state): State<AppState>) -> Response {
    respond(state.gateway.list_customers())
}

/// GET /api/paints
async fn get_paints(State(state): State<AppState>) -> Response {
    respond(state.gateway.list_paints())
}

/// GET /api/paints/:id - Paint with its base formulation
async fn get_paint(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    respond(
        state
            .gateway
            .get_paint(id)
            .and_then(|paint| paint.ok_or_else(|| ShopError::not_found("paint", id))),
    )
}

/// GET /api/paints/:id/scale/:size - Formulation scaled to a batch size
async fn get_scaled(State(state): State<AppState>, Path((id, size)): Path<(i64, f64)>) -> Response {
    let result = state
        .gateway
        .get_paint(id)
        .and_then(|paint| paint.ok_or_else(|| ShopError::not_found("paint", id)))
        .and_then(|paint| scale_formulation(&paint.formulations, size, Some(paint.paint.base_size)));

    respond(result)
}

/// GET /api/purchases - Purchases with customer and color, newest first
async fn get_purchases(State(state): State<AppState>) -> Response {
    respond(state.gateway.list_purchases_with_details())
}

/// GET /api/purchases/:id/share - Plain-text share message
async fn get_share(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    respond(share_purchase(state.gateway.as_ref(), id))
}

/// GET /api/search/customer/:query
async fn search_customer(State(state): State<AppState>, Path(query): Path<String>) -> impl IntoResponse {
    let query = decode(&query);

    match search_by_customer(state.gateway.as_ref(), &query) {
        Ok(result) => Json(ApiResponse::ok(result)),
        Err(e) => Json(
            ApiResponse::ok(CustomerSearchResult::not_found())
                .with_warning(Some(format!("Customer search unavailable: {}", e))),
        ),
    }
}

/// GET /api/search/color/:query
async fn search_color(State(state): State<AppState>, Path(query): Path<String>) -> impl IntoResponse {
    let query = decode(&query);

    match search_by_color(state.gateway.as_ref(), &query) {
        Ok(result) => Json(ApiResponse::ok(result)),
        Err(e) => Json(
            ApiResponse::ok(ColorSearchResult::not_found())
                .with_warning(Some(format!("Color search unavailable: {}", e))),
        ),
    }
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/report", get(get_report))
        .route("/customers", get(get_customers))
        .route("/paints", get(get_paints))
        .route("/paints/:id", get(get_paint))
        .route("/paints/:id/scale/:size", get(get_scaled))
        .route("/purchases", get(get_purchases))
        .route("/purchases/:id/share", get(get_share))
        .route("/search/customer/:query", get(search_customer))
        .route("/search/color/:query", get(search_color))
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ShopConfig::from_env();
    if let Some(db) = args.db {
        config = config.with_db_path(db);
    }
    if let Some(addr) = &args.addr {
        config = config.with_server_addr(addr);
    }

    tracing_subscriber::fmt().with_max_level(config.level()).init();

    let gateway = SqliteGateway::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    let addr = config.server_addr.clone();
    let state = AppState {
        gateway: Arc::new(gateway),
        config: Arc::new(config),
    };

    let app = Router::new().nest("/api", api_routes(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "tint shop server listening");
    println!("🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/report", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
