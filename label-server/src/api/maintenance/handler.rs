//! Maintenance API Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::printing::{FeedAction, TestPattern};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct FeedRequest {
    #[serde(default)]
    pub action: FeedAction,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceResponse {
    pub ok: bool,
    pub action: &'static str,
    pub bytes: usize,
}

/// POST /api/print-test/{kind}
pub async fn print_test(
    State(state): State<ServerState>,
    Path(kind): Path<String>,
) -> AppResult<Json<MaintenanceResponse>> {
    let pattern = TestPattern::parse(&kind).ok_or_else(|| {
        AppError::malformed(format!(
            "unknown test pattern '{}', expected border, center or direction",
            kind
        ))
    })?;

    let profile = state.profiles.snapshot();
    let stream = pattern.stream(&profile)?;
    let outcome = state.printer.send(pattern.name(), &stream).await?;

    Ok(Json(MaintenanceResponse {
        ok: true,
        action: pattern.name(),
        bytes: outcome.bytes,
    }))
}

/// POST /api/feed
///
/// An empty body feeds one label.
pub async fn feed(State(state): State<ServerState>, body: Bytes) -> AppResult<Json<MaintenanceResponse>> {
    let req: FeedRequest = if body.iter().all(u8::is_ascii_whitespace) {
        FeedRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::malformed(format!("invalid JSON: {}", e)))?
    };

    let profile = state.profiles.snapshot();
    let stream = req.action.stream(&profile);
    let outcome = state.printer.send(req.action.name(), &stream).await?;

    Ok(Json(MaintenanceResponse {
        ok: true,
        action: req.action.name(),
        bytes: outcome.bytes,
    }))
}
