//! Core module - server configuration, state and errors
//!
//! # Contents
//!
//! - [`Config`] - server configuration
//! - [`ProfileStore`] - active printer profile
//! - [`ServerState`] - shared server state
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup errors

pub mod config;
pub mod error;
pub mod profile;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use profile::ProfileStore;
pub use server::Server;
pub use state::ServerState;
