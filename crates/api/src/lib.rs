//! Telemetry Logger API Server
//!
//! HTTP boundary for querying, exporting and ingesting water height and flow
//! readings.

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use query_engine::QueryEngine;
use sample_generator::SampleGenerator;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use storage::Repository;
use tokio::sync::watch;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod config;
pub mod error;
pub mod ingest;
pub mod rate_limit;
mod routes;

use config::{LogFormat, LoggingSettings, Settings};
use ingest::IngestionAdapter;
use rate_limit::create_governor_config;

/// Application state shared across handlers
pub struct AppState {
    /// Reading queries and exports
    pub engine: QueryEngine,
    /// Form ingestion
    pub ingestor: IngestionAdapter,
    /// Shared API key, if authentication is enabled
    pub api_key: Option<String>,
    /// Prometheus render handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state over an open repository
    pub fn new(repository: Repository, settings: &Settings) -> Self {
        Self {
            engine: QueryEngine::new(repository.clone(), settings.query.live_limit),
            ingestor: IngestionAdapter::new(repository, settings.validation.clone()),
            api_key: settings.auth.api_key.clone().filter(|k| !k.is_empty()),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub reading_count: Option<i64>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/readings", get(routes::readings::get_readings))
        .route("/download", get(routes::export::download))
        .route("/receive", post(routes::receive::receive))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_auth,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let database = match state.engine.repository().count().await {
        Ok(count) => ComponentHealth {
            status: "ok".to_string(),
            reading_count: Some(count),
        },
        Err(e) => {
            warn!(error = %e, "Health check could not count readings");
            ComponentHealth {
                status: "error".to_string(),
                reading_count: None,
            }
        }
    };

    let status = if database.reading_count.is_some() {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database,
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if result.is_err() {
        debug!("Tracing subscriber already installed");
    }
}

/// Open storage, start the generator if enabled, and serve until Ctrl-C.
///
/// Schema creation failure is fatal; everything after that is not.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let repository =
        Repository::open(&settings.database.path, settings.database.max_connections).await?;
    repository.ensure_schema().await?;

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Metrics recorder not installed");
            None
        }
    };

    let state = Arc::new(AppState::new(repository.clone(), &settings).with_metrics(metrics));
    if state.api_key.is_none() {
        warn!("No API key configured, reading endpoints are unauthenticated");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let generator = settings.generator.enabled.then(|| {
        let generator =
            SampleGenerator::new(settings.generator.generator_config(), repository.clone());
        tokio::spawn(generator.run(shutdown_rx))
    });

    let governor = create_governor_config(&settings.rate_limit)
        .ok_or_else(|| anyhow::anyhow!("rate_limit values must be greater than zero"))?;
    let app = create_router(state).layer(GovernorLayer { config: governor });

    info!("Starting API server on {}", settings.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = generator {
        let _ = handle.await;
    }
    repository.close().await;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
