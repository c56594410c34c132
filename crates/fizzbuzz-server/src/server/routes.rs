//! Router assembly.
//!
//! - `GET /render`
//! - `GET /statistics`
//!
//! Every request is logged by a [`TraceLayer`] (method, URI, status and
//! latency). Unknown paths answer `404` with the JSON envelope.

use crate::server::service::{
    AppState,
    handler::{not_found_handler, render_handler, statistics_handler},
};
use axum::{Router, routing::get};
use tower_http::{
    LatencyUnit,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Builds the application router around `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/render", get(render_handler))
        .route("/statistics", get(statistics_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
