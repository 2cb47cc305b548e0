//! CUPS bridge
//!
//! Two small programs let a CUPS queue drive the printer:
//!
//! - [`filter`]: page image in, TSPL stream out (`application/vnd.cups-raw`)
//! - [`backend`]: job data in, forwarded to a running label server over HTTP
//!
//! Both only translate. Rendering stays in [`crate::printing`].

pub mod backend;
pub mod filter;

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;

/// Arguments CUPS passes to filters and backends
///
/// `job-id user title copies options [file]`; without `file` the job is
/// read from stdin.
#[derive(Debug, Clone, Parser)]
#[command(about = "TSPL label printer CUPS program")]
pub struct JobArgs {
    pub job: String,
    pub user: String,
    pub title: String,
    pub copies: String,
    pub options: String,
    pub file: Option<PathBuf>,
}

impl JobArgs {
    /// Copy count, at least 1
    pub fn copies(&self) -> u32 {
        self.copies.trim().parse().unwrap_or(1).max(1)
    }

    /// Job data from the file argument or stdin
    pub fn read_input(&self) -> io::Result<Vec<u8>> {
        match &self.file {
            Some(path) => std::fs::read(path),
            None => {
                let mut data = Vec::new();
                io::stdin().lock().read_to_end(&mut data)?;
                Ok(data)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_args() {
        let args = JobArgs::try_parse_from(["tspl-filter", "42", "alice", "label", "2", ""]).unwrap();
        assert_eq!(args.job, "42");
        assert_eq!(args.copies(), 2);
        assert!(args.file.is_none());

        let args =
            JobArgs::try_parse_from(["tspl-filter", "42", "alice", "label", "x", "", "/tmp/page.png"])
                .unwrap();
        assert_eq!(args.copies(), 1);
        assert_eq!(args.file.as_deref(), Some(std::path::Path::new("/tmp/page.png")));
    }

    #[test]
    fn test_missing_arguments() {
        assert!(JobArgs::try_parse_from(["tspl-filter", "42"]).is_err());
    }
}
