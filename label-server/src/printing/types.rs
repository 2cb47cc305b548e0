//! Label job types
//!
//! A [`LabelJob`] is parsed once from an inbound body and never modified
//! afterwards. Parsing never touches the device.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::utils::{AppError, AppResult};

/// Shipping label fields (`order_id|name|address|tracking_code`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingInfo {
    pub order_id: String,
    pub name: String,
    pub address: String,
    pub tracking_code: String,
}

/// Packing slip fields (`order_id|name|item1,item2,...`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingInfo {
    pub order_id: String,
    pub name: String,
    pub items: Vec<String>,
}

/// One print request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelJob {
    PlainText { lines: Vec<String> },
    Shipping(ShippingInfo),
    Packing(PackingInfo),
    /// Encoded image bytes; `format` is the detected container name
    Image { bytes: Vec<u8>, format: String },
    /// Complete command stream passed through untouched
    RawCommand { data: Vec<u8> },
}

impl LabelJob {
    pub fn kind(&self) -> &'static str {
        match self {
            LabelJob::PlainText { .. } => "plain_text",
            LabelJob::Shipping(_) => "shipping",
            LabelJob::Packing(_) => "packing",
            LabelJob::Image { .. } => "image",
            LabelJob::RawCommand { .. } => "raw",
        }
    }

    /// Newline-separated text; blank lines are kept as spacing
    pub fn plain_text(body: &[u8]) -> AppResult<Self> {
        let text = utf8(body)?;
        let text = text.trim_matches(|c| c == '\n' || c == '\r');
        if text.trim().is_empty() {
            return Err(AppError::malformed("empty text body"));
        }
        let lines = text
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        Ok(LabelJob::PlainText { lines })
    }

    pub fn shipping(body: &[u8]) -> AppResult<Self> {
        let [order_id, name, address, tracking_code] =
            fields::<4>(body, "order_id|name|address|tracking_code")?;
        require("order_id", &order_id)?;
        require("name", &name)?;
        require("tracking_code", &tracking_code)?;
        Ok(LabelJob::Shipping(ShippingInfo {
            order_id,
            name,
            address,
            tracking_code,
        }))
    }

    pub fn packing(body: &[u8]) -> AppResult<Self> {
        let [order_id, name, items] = fields::<3>(body, "order_id|name|item1,item2,...")?;
        require("order_id", &order_id)?;
        let items: Vec<String> = items
            .split(',')
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map(String::from)
            .collect();
        if items.is_empty() {
            return Err(AppError::malformed("packing slip has no items"));
        }
        Ok(LabelJob::Packing(PackingInfo {
            order_id,
            name,
            items,
        }))
    }

    /// Base64 image body; whitespace (line wrapping) is ignored
    pub fn image_base64(body: &[u8], limit: usize) -> AppResult<Self> {
        check_size(body.len(), limit)?;
        let compact: Vec<u8> = body
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if compact.is_empty() {
            return Err(AppError::malformed("empty image body"));
        }
        let bytes = STANDARD
            .decode(&compact)
            .map_err(|e| AppError::malformed(format!("invalid base64: {}", e)))?;
        Self::image(bytes)
    }

    /// Encoded image bytes; the container format must be recognizable
    pub fn image(bytes: Vec<u8>) -> AppResult<Self> {
        let format = image::guess_format(&bytes).map_err(|e| {
            AppError::from(tspl_printer::PrintError::UnsupportedImageFormat(e.to_string()))
        })?;
        Ok(LabelJob::Image {
            bytes,
            format: format!("{:?}", format).to_lowercase(),
        })
    }

    pub fn raw(body: &[u8], limit: usize) -> AppResult<Self> {
        check_size(body.len(), limit)?;
        if body.is_empty() {
            return Err(AppError::malformed("empty command body"));
        }
        // BITMAP payloads make a valid stream non-UTF-8, so bytes are not inspected
        Ok(LabelJob::RawCommand {
            data: body.to_vec(),
        })
    }
}

fn utf8(body: &[u8]) -> AppResult<&str> {
    std::str::from_utf8(body).map_err(|_| AppError::malformed("body is not valid UTF-8"))
}

fn check_size(size: usize, limit: usize) -> AppResult<()> {
    if size > limit {
        return Err(AppError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::malformed(format!("{} is empty", field)));
    }
    Ok(())
}

/// Split a `|`-separated body into exactly `N` trimmed fields
fn fields<const N: usize>(body: &[u8], layout: &str) -> AppResult<[String; N]> {
    let text = utf8(body)?.trim();
    let parts: Vec<String> = text.split('|').map(|p| p.trim().to_string()).collect();
    let count = parts.len();
    parts
        .try_into()
        .map_err(|_| AppError::malformed(format!("expected {}, got {} fields", layout, count)))
}
