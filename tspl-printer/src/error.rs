//! Error types for the printer library

use std::path::PathBuf;
use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Canvas or frame with a zero (or otherwise unusable) dimension
    #[error("Invalid geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// Image bytes could not be identified or decoded
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// Barcode data not representable in the requested symbology
    #[error("Invalid barcode data: {0}")]
    InvalidBarcode(String),

    /// Device node missing at open time
    #[error("Device unavailable: {}", .0.display())]
    DeviceUnavailable(PathBuf),

    /// Write stopped before the full stream reached the device
    #[error("Device write failed after {written}/{total} bytes: {source}")]
    DeviceWriteError {
        written: usize,
        total: usize,
        #[source]
        source: std::io::Error,
    },

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error outside of the device write path
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrintError {
    /// Whether the caller may retry the same job later
    pub fn is_retryable(&self) -> bool {
        matches!(self, PrintError::DeviceUnavailable(_))
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
