//! axum handlers for `/render` and `/statistics`.
//!
//! The handlers own no state of their own: the [`Renderer`] and the
//! statistics it records into live in [`AppState`], created once at startup
//! and shared by every request.

use crate::server::{
    config::ServerConfig,
    service::{ApiError, ApiResponse, params::parse_request},
    telemetry::{
        decrement_renders_inflight, increment_items_rendered, increment_render_errors,
        increment_renders, increment_renders_inflight, record_render_duration,
    },
};
use axum::{
    Json,
    extract::{Query, State},
    http::Uri,
};
use fizzbuzz::{Items, Renderer, RequestStatistic, StatisticRecorder, Statistics};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    renderer: Renderer<Statistics>,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates the renderer and an empty statistics store.
    pub fn new(config: ServerConfig) -> Self {
        let renderer = Renderer::new(Arc::new(Statistics::new()), config.renderer.clone());
        Self {
            renderer,
            config: Arc::new(config),
        }
    }

    pub const fn renderer(&self) -> &Renderer<Statistics> {
        &self.renderer
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Cancels every in-flight render.
    pub fn shutdown(&self) {
        self.renderer.shutdown();
    }
}

/// Keeps the in-flight gauge balanced even when the handler future is
/// dropped by a disconnecting client.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        increment_renders_inflight();
        Self
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        decrement_renders_inflight();
    }
}

/// Drains `items` into a comma-joined string, returning it with the item
/// count.
async fn join_items(mut items: Items) -> (String, u64) {
    let mut joined = String::new();
    let mut count = 0_u64;
    while let Some(item) = items.next().await {
        if count > 0 {
            joined.push(',');
        }
        joined.push_str(&item);
        count += 1;
    }
    (joined, count)
}

/// `GET /render`
///
/// Parses the query, renders the sequence and answers with the comma-joined
/// items. Collection is bounded by the configured render timeout; when it
/// expires the item stream is dropped, which cancels its producer. A render
/// cut short by shutdown is reported as an error, never as a partial success.
#[tracing::instrument(skip_all)]
pub async fn render_handler(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let start = Instant::now();
    increment_renders();

    let request = parse_request(&params).inspect_err(|_| increment_render_errors())?;

    // Invalid requests fall through to the renderer, which reports and records them.
    let limit = request.limit();
    let max_limit = state.config.max_limit;
    if limit > max_limit && request.validate().is_ok() {
        increment_render_errors();
        return Err(ApiError::LimitTooLarge {
            max: max_limit,
            value: limit,
        });
    }

    tracing::debug!(?request, "Rendering");
    let items = state
        .renderer
        .render(request)
        .into_result()
        .inspect_err(|_| increment_render_errors())?;

    let _inflight = InflightGuard::new();
    let render_timeout = state.config.render_timeout;
    let Ok((joined, count)) = tokio::time::timeout(render_timeout, join_items(items)).await else {
        increment_render_errors();
        return Err(ApiError::Timeout(render_timeout));
    };

    // A short sequence means the renderer was shut down mid-render.
    if u64::try_from(limit) != Ok(count) {
        increment_render_errors();
        return Err(ApiError::ShuttingDown);
    }

    increment_items_rendered(count);
    #[allow(clippy::cast_precision_loss)]
    record_render_duration(start.elapsed().as_millis() as f64);

    Ok(Json(ApiResponse::ok(joined)))
}

/// `GET /statistics`
///
/// Answers with the most requested parameter set and its total, or `null`
/// when nothing has been rendered yet.
pub async fn statistics_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<Option<RequestStatistic>>> {
    Json(ApiResponse::ok(
        state.renderer.statistics().get_top_statistic(),
    ))
}

pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_owned())
}
