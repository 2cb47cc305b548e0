use thiserror::Error;
use tspl_printer::PrintError;

/// Startup and serve-loop errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Printer profile error: {0}")]
    Profile(#[from] PrintError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid listen address: {0}")]
    Address(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
