//! Maintenance routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/print-test/{kind} | POST | Calibration pattern: border, center, direction |
//! | /api/feed | POST | Media control: feed, reset, calibrate |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/print-test/{kind}", post(handler::print_test))
        .route("/api/feed", post(handler::feed))
}
