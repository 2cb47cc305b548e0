//! Label print routes
//!
//! | Path | Method | Body |
//! |------|--------|------|
//! | /print | POST | newline-separated text |
//! | /shipping | POST | `order_id\|name\|address\|tracking_code` |
//! | /packing | POST | `order_id\|name\|item1,item2,...` |
//! | /image | POST | base64-encoded image |
//! | /raw | POST | literal command stream, passed through unmodified |
//!
//! Responses are plain text, e.g. `printed shipping (412 bytes)`.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/print", post(handler::print_text))
        .route("/shipping", post(handler::print_shipping))
        .route("/packing", post(handler::print_packing))
        .route("/image", post(handler::print_image))
        .route("/raw", post(handler::print_raw))
}
