//! Health check routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | / | GET | Plain-text banner with the active label setup |
//! | /health | GET | JSON health check |
//!
//! # Response example
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "device": "connected",
//!   "device_path": "/dev/usb/lp0",
//!   "uptime_seconds": 42
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::SystemTime;
use tspl_printer::DeviceState;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    device: DeviceState,
    device_path: String,
    uptime_seconds: u64,
}

// Server start time (lazily initialized)
static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

fn get_uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// GET /
pub async fn banner(State(state): State<ServerState>) -> String {
    START_TIME.get_or_init(SystemTime::now);
    let profile = state.profiles.snapshot();
    format!(
        "TSPL Label Server\n\
         Label: {}x{}mm\n\
         Offsets: X={} Y={}\n\
         \n\
         Endpoints: /print, /shipping, /packing, /image, /raw, /api/config\n",
        profile.label_width_mm, profile.label_height_mm, profile.x_offset, profile.y_offset
    )
}

/// GET /health
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let device = state.device.state();
    Json(HealthResponse {
        status: match device {
            DeviceState::Connected => "ok",
            DeviceState::Disconnected => "degraded",
        },
        version: env!("CARGO_PKG_VERSION"),
        device,
        device_path: state.device.path().display().to_string(),
        uptime_seconds: get_uptime_seconds(),
    })
}
