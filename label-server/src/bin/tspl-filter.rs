//! CUPS filter for TSPL label printers
//!
//! ```text
//! tspl-filter job-id user title copies options [file]
//! ```

use std::process::ExitCode;

use clap::Parser;
use label_server::cups::{JobArgs, filter};
use label_server::{Config, init_stderr_logger};

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_stderr_logger(&config.log_level);

    let args = JobArgs::parse();
    tracing::info!(job = %args.job, user = %args.user, title = %args.title, "Filtering job");

    let result = args
        .read_input()
        .map_err(anyhow::Error::from)
        .and_then(|data| filter::run(data, &config.profile_path, &mut std::io::stdout().lock()));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
