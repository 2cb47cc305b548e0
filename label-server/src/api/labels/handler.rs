//! Label print handlers
//!
//! Each handler parses the body into a [`LabelJob`] and hands it to the
//! print service. A body that does not parse never reaches the device.

use axum::body::Bytes;
use axum::extract::State;

use crate::core::ServerState;
use crate::printing::LabelJob;
use crate::utils::AppResult;

async fn submit(state: &ServerState, job: LabelJob) -> AppResult<String> {
    let outcome = state.printer.print(job).await?;
    Ok(format!("{}\n", outcome))
}

/// POST /print
pub async fn print_text(State(state): State<ServerState>, body: Bytes) -> AppResult<String> {
    submit(&state, LabelJob::plain_text(&body)?).await
}

/// POST /shipping
pub async fn print_shipping(State(state): State<ServerState>, body: Bytes) -> AppResult<String> {
    submit(&state, LabelJob::shipping(&body)?).await
}

/// POST /packing
pub async fn print_packing(State(state): State<ServerState>, body: Bytes) -> AppResult<String> {
    submit(&state, LabelJob::packing(&body)?).await
}

/// POST /image
pub async fn print_image(State(state): State<ServerState>, body: Bytes) -> AppResult<String> {
    let job = LabelJob::image_base64(&body, state.config.max_image_bytes)?;
    submit(&state, job).await
}

/// POST /raw
pub async fn print_raw(State(state): State<ServerState>, body: Bytes) -> AppResult<String> {
    let job = LabelJob::raw(&body, state.config.max_raw_bytes)?;
    submit(&state, job).await
}
