//! TSPL Label Server - HTTP print server for a USB thermal label printer
//!
//! # Overview
//!
//! Request bodies become label jobs, jobs are rendered and composed into
//! TSPL command streams by [`tspl_printer`], and the streams are written
//! to the printer's device node one job at a time.
//!
//! - **HTTP API** (`api`): print endpoints, profile and maintenance API
//! - **Printing** (`printing`): job parsing, label templates, print service
//! - **CUPS bridge** (`cups`): filter and backend for a print queue
//! - **Core** (`core`): configuration, profile store, server state
//!
//! # Module layout
//!
//! ```text
//! label-server/src/
//! ├── core/          # config, state, profile store, errors
//! ├── api/           # HTTP routes and handlers
//! ├── printing/      # jobs, templates, print service
//! ├── cups/          # CUPS filter and backend
//! └── utils/         # error type, logging
//! ```

pub mod api;
pub mod core;
pub mod cups;
pub mod printing;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file, init_stderr_logger};

/// Load `.env` and initialize logging
///
/// Reads `LOG_LEVEL`, `LOG_JSON` and `LOG_DIR` through [`Config::from_env`].
/// Must run inside the tokio runtime when `LOG_DIR` is set.
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
 _____ ____  ____  _
|_   _/ ___||  _ \| |
  | | \___ \| |_) | |
  | |  ___) |  __/| |___
  |_| |____/|_|   |_____|
   label server
    "#
    );
}
