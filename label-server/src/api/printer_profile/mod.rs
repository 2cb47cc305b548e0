//! Printer profile API
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/config | GET | Current printer profile |
//! | /api/config | POST | Merge fields into the profile, persist |
//! | /api/nudge | POST | Shift an offset by a distance in mm |

mod handler;

use axum::{Router, routing::{get, post}};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/config", get(handler::get).post(handler::update))
        .route("/api/nudge", post(handler::nudge))
}
