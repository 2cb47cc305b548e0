//! CUPS backend: forward a job to the label server over HTTP
//!
//! The queue's device URI names the server, `tspl://host:port`. Image data
//! is posted base64-encoded to `/image`; anything else (typically the TSPL
//! stream produced by the filter) goes to `/raw` unchanged.

use std::process::ExitCode;

use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use tracing::{info, warn};

/// Line printed when CUPS runs the backend without arguments
pub const DISCOVERY: &str = r#"network tspl "Unknown" "TSPL Label Printer (HTTP)""#;

/// Backend exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Ok,
    Failed,
    /// Ask CUPS to retry the job later
    Retry,
}

impl BackendStatus {
    pub fn code(self) -> u8 {
        match self {
            BackendStatus::Ok => 0,
            BackendStatus::Failed => 1,
            BackendStatus::Retry => 6,
        }
    }
}

impl From<BackendStatus> for ExitCode {
    fn from(status: BackendStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Map the device URI to the server's base URL
pub fn resolve_uri(uri: &str) -> anyhow::Result<String> {
    let uri = uri.trim();
    let (scheme, rest) = if let Some(rest) = uri.strip_prefix("tspl://") {
        ("http", rest)
    } else if let Some(rest) = uri.strip_prefix("http://") {
        ("http", rest)
    } else if let Some(rest) = uri.strip_prefix("https://") {
        ("https", rest)
    } else {
        bail!("unsupported device URI '{}', expected tspl://host:port", uri);
    };

    let authority = rest.trim_end_matches('/');
    if authority.is_empty() || authority.starts_with(':') {
        bail!("device URI '{}' has no host", uri);
    }
    Ok(format!("{}://{}", scheme, authority))
}

/// Pick the endpoint and body for a job
pub fn request_for(data: &[u8]) -> (&'static str, Vec<u8>) {
    match image::guess_format(data) {
        Ok(_) => ("/image", STANDARD.encode(data).into_bytes()),
        Err(_) => ("/raw", data.to_vec()),
    }
}

/// Map the server's answer to a backend status
pub fn status_for(status: StatusCode) -> BackendStatus {
    if status.is_success() {
        BackendStatus::Ok
    } else if status == StatusCode::SERVICE_UNAVAILABLE {
        BackendStatus::Retry
    } else {
        BackendStatus::Failed
    }
}

/// Post one job `copies` times
///
/// Stops at the first copy that does not print.
pub async fn submit(
    client: &reqwest::Client,
    base_url: &str,
    data: &[u8],
    copies: u32,
) -> anyhow::Result<BackendStatus> {
    let (endpoint, body) = request_for(data);
    let url = format!("{}{}", base_url, endpoint);

    for copy in 1..=copies {
        let resp = client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body.clone())
            .send()
            .await
            .with_context(|| format!("POST {}", url))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        match status_for(status) {
            BackendStatus::Ok => info!(copy, copies, %url, "{}", text.trim()),
            other => {
                warn!(copy, %status, %url, "Server rejected job: {}", text.trim());
                return Ok(other);
            }
        }
    }
    Ok(BackendStatus::Ok)
}
