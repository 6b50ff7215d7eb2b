//! sab-bridge library - acoustic measurement bridge
//!
//! Acquires spectrum, transfer-function, phase and impulse-response
//! measurements from capture-software exports, synthesizing them when no
//! export is usable, and runs the loudspeaker/room alignment analysis over
//! them.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod acquisition;
pub mod analysis;
pub mod api;
pub mod config;
pub mod discovery;
pub mod dsp;
pub mod error;
pub mod generator;
pub mod history;
pub mod measurement;
pub mod parsers;
pub mod settings;
pub mod state;

pub use error::{Error, Result};
pub use state::BridgeState;

/// Module name reported by /health and SSE logs
pub const SERVICE_NAME: &str = "sab-bridge";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<BridgeState>,
}

impl AppState {
    pub fn new(bridge: BridgeState) -> Self {
        Self {
            bridge: Arc::new(bridge),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let bridge_routes = Router::new()
        .route("/api/status", get(api::handlers::get_status))
        .route("/api/connect", post(api::handlers::connect))
        .route("/api/measurement", get(api::handlers::get_measurement))
        .route("/api/synthesize/:kind", get(api::handlers::synthesize))
        .route("/api/alignment", get(api::handlers::get_alignment))
        .route("/api/history", get(api::handlers::list_history))
        .route("/api/history/:id", get(api::handlers::get_history_entry))
        .route("/api/files", get(api::handlers::list_files))
        .route("/api/config", post(api::handlers::update_config));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/events", get(api::event_stream))
        .merge(api::health_routes());

    Router::new()
        .merge(bridge_routes)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
