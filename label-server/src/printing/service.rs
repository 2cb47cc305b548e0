//! Print service - job → label → command stream → device
//!
//! Everything that can fail before the printer is involved (parsing,
//! decoding, barcode data, geometry) fails here first; the device only sees
//! complete streams.

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};
use tspl_printer::{CommandStream, DeviceChannel, PrintResult, PrinterProfile, compose_label};

use super::renderer::LabelRenderer;
use super::types::LabelJob;
use crate::core::ProfileStore;
use crate::utils::{AppError, AppResult};

/// Bytes ready for the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedJob {
    pub data: Vec<u8>,
    /// Lines or items dropped from the label
    pub truncated: usize,
}

/// Render and compose one job against a profile
///
/// Raw commands pass through byte-for-byte.
pub fn render_job(profile: &PrinterProfile, job: &LabelJob) -> PrintResult<RenderedJob> {
    let renderer = LabelRenderer::new(profile);
    let label = match job {
        LabelJob::RawCommand { data } => {
            return Ok(RenderedJob {
                data: data.clone(),
                truncated: 0,
            });
        }
        LabelJob::PlainText { lines } => renderer.plain_text(lines),
        LabelJob::Shipping(info) => renderer.shipping(info)?,
        LabelJob::Packing(info) => renderer.packing(info),
        LabelJob::Image { bytes, .. } => renderer.image(bytes)?,
    };

    let stream = compose_label(profile, &label)?;
    Ok(RenderedJob {
        data: stream.to_bytes(),
        truncated: label.truncated,
    })
}

/// Result of a completed print
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOutcome {
    pub kind: &'static str,
    pub bytes: usize,
    pub truncated: usize,
}

impl fmt::Display for PrintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "printed {} ({} bytes)", self.kind, self.bytes)?;
        if self.truncated > 0 {
            write!(f, ", truncated {}", self.truncated)?;
        }
        Ok(())
    }
}

/// Label print service
///
/// Responsibilities:
/// - Snapshot the profile once per job
/// - Render off the async runtime
/// - Hand complete streams to the device channel
#[derive(Debug, Clone)]
pub struct PrintService {
    profiles: Arc<ProfileStore>,
    device: DeviceChannel,
}

impl PrintService {
    pub fn new(profiles: Arc<ProfileStore>, device: DeviceChannel) -> Self {
        Self { profiles, device }
    }

    pub fn device(&self) -> &DeviceChannel {
        &self.device
    }

    pub fn profiles(&self) -> &Arc<ProfileStore> {
        &self.profiles
    }

    /// Render a job and write it to the printer
    #[instrument(skip_all, fields(job = job.kind()))]
    pub async fn print(&self, job: LabelJob) -> AppResult<PrintOutcome> {
        let profile = self.profiles.snapshot();
        let kind = job.kind();

        let rendered = tokio::task::spawn_blocking(move || render_job(&profile, &job))
            .await
            .map_err(|e| AppError::internal(format!("render task failed: {}", e)))??;

        let bytes = self.device.write(&rendered.data).await?;
        info!(kind, bytes, truncated = rendered.truncated, "Label printed");
        Ok(PrintOutcome {
            kind,
            bytes,
            truncated: rendered.truncated,
        })
    }

    /// Write a prepared maintenance stream
    pub async fn send(&self, kind: &'static str, stream: &CommandStream) -> AppResult<PrintOutcome> {
        let bytes = self.device.write(&stream.to_bytes()).await?;
        info!(kind, bytes, "Maintenance command sent");
        Ok(PrintOutcome {
            kind,
            bytes,
            truncated: 0,
        })
    }
}
