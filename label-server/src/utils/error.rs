//! Unified error handling
//!
//! [`AppError`] is the single error type returned by HTTP handlers. Responses
//! are plain text (`error: <message>`), matching the rest of the label API.
//!
//! # Status mapping
//!
//! | Error | Status | Retry |
//! |-------|--------|-------|
//! | MalformedRequest | 400 | no |
//! | InvalidBarcode | 400 | no |
//! | PayloadTooLarge | 413 | no |
//! | UnsupportedImageFormat | 415 | no |
//! | DeviceUnavailable | 503 | yes |
//! | DeviceWriteError | 502 | no |
//! | InvalidGeometry / Internal | 500 | no |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use tspl_printer::PrintError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Client errors (4xx) ==========
    #[error("Malformed request: {0}")]
    /// Unparseable job or config body (400)
    MalformedRequest(String),

    #[error("Payload too large: {size} bytes (limit {limit})")]
    /// Body exceeds the configured size limit (413)
    PayloadTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    /// Rendering, composing or device failure
    Print(#[from] PrintError),

    // ========== System errors (5xx) ==========
    #[error("Internal server error: {0}")]
    /// Internal error (500)
    Internal(String),
}

impl AppError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Print(e) => match e {
                PrintError::InvalidBarcode(_) | PrintError::InvalidConfig(_) => {
                    StatusCode::BAD_REQUEST
                }
                PrintError::UnsupportedImageFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                PrintError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                PrintError::DeviceWriteError { .. } => StatusCode::BAD_GATEWAY,
                PrintError::InvalidGeometry { .. } | PrintError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "internal", error = %self, "Request failed");
        }
        (status, format!("error: {}\n", self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::malformed("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(PrintError::DeviceUnavailable(PathBuf::from("/dev/usb/lp0"))).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(PrintError::DeviceWriteError {
                written: 3,
                total: 10,
                source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(PrintError::UnsupportedImageFormat("?".into())).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::PayloadTooLarge { size: 2, limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
