//! Tally Web Server
//!
//! Axum-based REST API behind the Tally expense tracker frontend.
//!
//! - Expense ledger: balance, count, add
//! - OCR receipt upload with a manual review queue for unparseable text
//! - Chart data: weekly totals and month calendars (sample or ledger)
//! - Equal-split investment suggestions for the remaining balance
//! - Restrictive CORS policy and sanitized error responses

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use tally_core::{
    AppConfig, CsvLedger, LedgerStore, MarketDataClient, MemoryLedger, OcrClient, OcrEngine,
    ReviewQueue,
};

mod handlers;

/// Maximum receipt upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub server: ServerConfig,
    pub ledger: Arc<dyn LedgerStore>,
    pub review: ReviewQueue,
    /// None when the configured engine is missing settings
    pub ocr: Option<OcrClient>,
    /// None when the provider is missing settings
    pub market: Option<MarketDataClient>,
}

impl AppState {
    /// Build state from config: CSV ledger when `ledger.path` is set,
    /// otherwise in memory
    pub fn from_config(config: AppConfig, server: ServerConfig) -> anyhow::Result<Self> {
        let principal = config.ledger.principal;
        let ledger: Arc<dyn LedgerStore> = match &config.ledger.path {
            Some(path) => Arc::new(CsvLedger::open(path, principal)?),
            None => Arc::new(MemoryLedger::new(principal)),
        };

        let ocr = OcrClient::from_config(&config.ocr);
        if ocr.is_none() {
            info!("ℹ️  OCR engine not configured (set OLLAMA_HOST for the ollama backend)");
        }

        let market = match MarketDataClient::from_config(&config.provider) {
            Ok(client) => Some(client),
            Err(e) => {
                info!("ℹ️  Market data provider not configured: {}", e);
                None
            }
        };

        Ok(Self::new(config, server, ledger, ocr, market))
    }

    pub fn new(
        config: AppConfig,
        server: ServerConfig,
        ledger: Arc<dyn LedgerStore>,
        ocr: Option<OcrClient>,
        market: Option<MarketDataClient>,
    ) -> Self {
        Self {
            review: ReviewQueue::new(config.ocr.review_capacity),
            config: Arc::new(config),
            server,
            ledger,
            ocr,
            market,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState, static_dir: Option<&str>) -> Router {
    let cors = build_cors(&state.server);
    let state = Arc::new(state);

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        // Ledger
        .route("/expenses/balance", get(handlers::get_balance))
        .route("/api/total-balance", get(handlers::get_balance))
        .route("/expenses/count", get(handlers::get_count))
        .route("/expenses/add", post(handlers::add_expense))
        // Sample data and charts
        .route("/expenses/random", get(handlers::random_expenses))
        .route("/expenses/weekly", get(handlers::weekly_chart))
        .route("/calendar/month", get(handlers::month_calendar))
        // OCR
        .route(
            "/ocr/receipt",
            // Multipart framing on top of the image itself
            post(handlers::upload_receipt).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024)),
        )
        .route("/ocr/review", get(handlers::list_review))
        .route("/ocr/review/:hash", get(handlers::get_review_item))
        // Investments
        .route("/investments/recommend", get(handlers::recommend_investments))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    // Serve the frontend build if a directory is provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allowed_origins.is_empty() {
        cors
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve_with_config(
    state: AppState,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(ocr) = &state.ocr {
        if ocr.health_check().await {
            info!("✅ OCR engine ready: {}", ocr.name());
        } else {
            warn!("⚠️  OCR engine {} is not responding", ocr.name());
        }
    }

    let snapshot = state.ledger.snapshot()?;
    info!(
        balance = %snapshot.balance,
        count = snapshot.count,
        "Ledger loaded"
    );

    let app = create_router(state, static_dir);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Convert a currency amount to a JSON number
pub(crate) fn money(amount: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    amount.round_dp(2).to_f64().unwrap_or(0.0)
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error onto a status code
    ///
    /// Bad input is the caller's fault (400), a silent provider is 502, and
    /// anything else is a generic 500 with the detail only in the log.
    pub fn from_core(err: tally_core::Error) -> Self {
        use tally_core::Error as CoreError;

        match err {
            CoreError::InvalidData(msg) => Self::bad_request(&msg),
            CoreError::Parse(e) => Self::bad_request(&e.to_string()),
            CoreError::NotFound(msg) => Self::not_found(&msg),
            e @ CoreError::DataUnavailable { .. } => Self {
                status: StatusCode::BAD_GATEWAY,
                message: e.to_string(),
                internal: None,
            },
            other => Self::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
