//! ==============================================================================
//! server.rs - web surface for the render pass
//! ==============================================================================
//!
//! purpose:
//!     every request re-runs the pass from scratch: read the csv, build the
//!     page, emit html or json. nothing is cached between requests.
//!
//! routes:
//!     GET /            html dashboard (sidebar form submits back here)
//!     GET /api/page    same page model as json
//!     GET /api/reading first row of the source as json
//!     GET /health      liveness
//!
//! ==============================================================================

use crate::config::DashboardConfig;
use crate::domain::{ControlState, Reading, PUMP_SECONDS_MAX};
use crate::layout::{self, Page};
use crate::render::{html_escape, render_page};
use crate::source::{DataLoadError, Table};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

type AppState = Arc<DashboardConfig>;

/// sidebar form as it arrives in the query string
///
/// checkboxes and the reset button are only sent when set, so presence
/// means true.
#[derive(Debug, Default, Deserialize)]
pub struct ControlParams {
    pump: Option<String>,
    pump_seconds: Option<i64>,
    generator: Option<String>,
    reset: Option<String>,
}

impl ControlParams {
    pub fn into_controls(self) -> ControlState {
        ControlState {
            pump_on: flag(self.pump.as_deref()),
            pump_seconds: self
                .pump_seconds
                .map(|s| s.clamp(0, PUMP_SECONDS_MAX as i64) as u8)
                .unwrap_or(0),
            generator_on: flag(self.generator.as_deref()),
            reset_requested: flag(self.reset.as_deref()),
        }
    }
}

fn flag(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off"),
    }
}

pub fn router(config: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/page", get(page_handler))
        .route("/api/reading", get(reading_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

pub async fn run_server(config: AppState) -> anyhow::Result<()> {
    let addr = config.server.bind_addr();
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("dashboard live at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// run the pass off the async workers; it does blocking file io
async fn run_pass(config: AppState, controls: ControlState) -> Result<Page, PassError> {
    tokio::task::spawn_blocking(move || {
        if controls.reset_requested {
            tracing::info!("reset requested (display only)");
        }
        layout::render_pass(&config.data.path, &controls, config.logging.show_readings)
    })
    .await
    .map_err(|e| PassError::Join(e.to_string()))?
    .map_err(PassError::Load)
}

#[derive(Debug)]
enum PassError {
    Load(DataLoadError),
    Join(String),
}

impl std::fmt::Display for PassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassError::Load(e) => write!(f, "{}", e),
            PassError::Join(e) => write!(f, "render task failed: {}", e),
        }
    }
}

async fn dashboard_handler(
    State(config): State<AppState>,
    Query(params): Query<ControlParams>,
) -> Response {
    match run_pass(config, params.into_controls()).await {
        Ok(page) => Html(render_page(&page)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "render pass aborted");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(error_page(&e.to_string()))).into_response()
        }
    }
}

async fn page_handler(
    State(config): State<AppState>,
    Query(params): Query<ControlParams>,
) -> Response {
    match run_pass(config, params.into_controls()).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "render pass aborted");
            json_error(&e.to_string())
        }
    }
}

async fn reading_handler(State(config): State<AppState>) -> Response {
    let path = config.data.path.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<Reading, DataLoadError> {
        Table::load(&path)?.first_reading()
    })
    .await;

    match result {
        Ok(Ok(reading)) => Json(reading).into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "reading unavailable");
            json_error(&e.to_string())
        }
        Err(e) => json_error(&format!("render task failed: {}", e)),
    }
}

fn json_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn error_page(message: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head><title>error</title></head>
<body style="font-family: system-ui; padding: 2rem; background: #0e1117; color: #eee;">
    <h1 style="color: #ff6b6b;">⚠️ dashboard error</h1>
    <p>the data source could not be loaded, nothing was rendered:</p>
    <pre style="background: #262730; padding: 1rem; border-radius: 8px; overflow-x: auto;">{}</pre>
</body>
</html>"#,
        html_escape(message)
    )
}
