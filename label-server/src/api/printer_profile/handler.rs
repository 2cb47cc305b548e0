//! Printer Profile API Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tspl_printer::{DOTS_PER_MM, OFFSET_MAX, OFFSET_MIN, PrintError, PrintResult, PrinterProfile};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Offset axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Deserialize)]
pub struct NudgeRequest {
    pub axis: Axis,
    pub mm: f64,
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| AppError::malformed(format!("invalid JSON: {}", e)))
}

/// GET /api/config
pub async fn get(State(state): State<ServerState>) -> Json<PrinterProfile> {
    Json(state.profiles.snapshot().as_ref().clone())
}

/// POST /api/config
///
/// Only the supplied fields change. The merged profile is validated as a
/// whole before anything is written.
pub async fn update(State(state): State<ServerState>, body: Bytes) -> AppResult<Json<PrinterProfile>> {
    let patch: Map<String, Value> = parse_json(&body)?;

    let previous = state.profiles.snapshot();
    let updated = update_profile(&state, move |current| merge(current, patch)).await?;

    if updated.device_path != previous.device_path {
        tracing::warn!(
            from = %previous.device_path.display(),
            to = %updated.device_path.display(),
            "device_path changed, restart the server to open the new device"
        );
    }
    Ok(Json(updated.as_ref().clone()))
}

/// POST /api/nudge
pub async fn nudge(State(state): State<ServerState>, body: Bytes) -> AppResult<Json<PrinterProfile>> {
    let req: NudgeRequest = parse_json(&body)?;
    let delta = nudge_dots(req.mm)?;

    let updated = update_profile(&state, move |current| {
        let mut next = current.clone();
        let offset = match req.axis {
            Axis::X => &mut next.x_offset,
            Axis::Y => &mut next.y_offset,
        };
        *offset = (*offset + delta).clamp(OFFSET_MIN, OFFSET_MAX);
        Ok(next)
    })
    .await?;

    tracing::info!(
        axis = ?req.axis,
        mm = req.mm,
        x_offset = updated.x_offset,
        y_offset = updated.y_offset,
        "Offset nudged"
    );
    Ok(Json(updated.as_ref().clone()))
}

/// Run a profile update on the blocking pool; it persists to disk
async fn update_profile<F>(state: &ServerState, f: F) -> AppResult<Arc<PrinterProfile>>
where
    F: FnOnce(&PrinterProfile) -> PrintResult<PrinterProfile> + Send + 'static,
{
    let profiles = state.profiles.clone();
    let updated = tokio::task::spawn_blocking(move || profiles.update(f))
        .await
        .map_err(|e| AppError::internal(format!("profile update task failed: {}", e)))??;
    Ok(updated)
}

/// Overlay `patch` onto the serialized profile and read it back
fn merge(current: &PrinterProfile, patch: Map<String, Value>) -> Result<PrinterProfile, PrintError> {
    let mut value = serde_json::to_value(current)
        .map_err(|e| PrintError::InvalidConfig(e.to_string()))?;
    if let Value::Object(fields) = &mut value {
        fields.extend(patch);
    }
    serde_json::from_value(value).map_err(|e| PrintError::InvalidConfig(e.to_string()))
}

/// Millimetres to a dot delta, bounded by the offset range
fn nudge_dots(mm: f64) -> AppResult<i32> {
    if !mm.is_finite() {
        return Err(AppError::malformed("mm must be a finite number"));
    }
    let span = f64::from(OFFSET_MAX - OFFSET_MIN);
    Ok((mm * DOTS_PER_MM).round().clamp(-span, span) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_unlisted_fields() {
        let current = PrinterProfile::default();
        let patch = json!({ "x_offset": -12, "label_height_mm": 50.0 });
        let Value::Object(patch) = patch else { unreachable!() };

        let merged = merge(&current, patch).unwrap();
        assert_eq!(merged.x_offset, -12);
        assert_eq!(merged.label_height_mm, 50.0);
        assert_eq!(merged.device_path, current.device_path);
        assert_eq!(merged.label_width_mm, current.label_width_mm);
    }

    #[test]
    fn test_merge_rejects_wrong_types() {
        let Value::Object(patch) = json!({ "x_offset": "left" }) else { unreachable!() };
        assert!(matches!(
            merge(&PrinterProfile::default(), patch),
            Err(PrintError::InvalidConfig(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_update_runs_on_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::core::Config::with_overrides(
            dir.path().display().to_string(),
            dir.path().join("printer_profile.json"),
        );
        let state = ServerState::initialize(&config).await.unwrap();

        let caller = std::thread::current().id();
        let (tx, rx) = std::sync::mpsc::channel();
        let updated = update_profile(&state, move |current| {
            tx.send(std::thread::current().id()).unwrap();
            Ok(PrinterProfile {
                y_offset: 8,
                ..current.clone()
            })
        })
        .await
        .unwrap();

        assert_ne!(rx.recv().unwrap(), caller);
        assert_eq!(updated.y_offset, 8);
        assert_eq!(state.profiles.snapshot().y_offset, 8);
        assert!(dir.path().join("printer_profile.json").exists());
    }

    #[test]
    fn test_nudge_dots() {
        assert_eq!(nudge_dots(1.0).unwrap(), 8);
        assert_eq!(nudge_dots(-0.5).unwrap(), -4);
        assert_eq!(nudge_dots(0.06).unwrap(), 0);
        assert_eq!(nudge_dots(1000.0).unwrap(), 600);
        assert!(nudge_dots(f64::NAN).is_err());
    }
}
