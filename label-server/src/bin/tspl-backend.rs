//! CUPS backend for the TSPL label server
//!
//! ```text
//! tspl-backend                                      # discovery
//! DEVICE_URI=tspl://host:8765 tspl-backend job-id user title copies options [file]
//! ```

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use label_server::cups::JobArgs;
use label_server::cups::backend::{self, BackendStatus};
use label_server::{Config, init_stderr_logger};

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::args_os().len() == 1 {
        println!("{}", backend::DISCOVERY);
        return ExitCode::SUCCESS;
    }

    dotenv::dotenv().ok();
    init_stderr_logger(&Config::from_env().log_level);

    let args = JobArgs::parse();
    match run(&args).await {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            BackendStatus::Failed.into()
        }
    }
}

async fn run(args: &JobArgs) -> anyhow::Result<BackendStatus> {
    let uri = std::env::var("DEVICE_URI").context("DEVICE_URI is not set")?;
    let base_url = backend::resolve_uri(&uri)?;
    let data = args.read_input().context("reading job data")?;
    if data.is_empty() {
        anyhow::bail!("job {} is empty", args.job);
    }

    tracing::info!(job = %args.job, bytes = data.len(), %base_url, "Sending job");
    let client = reqwest::Client::new();
    backend::submit(&client, &base_url, &data, args.copies()).await
}
