use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment (a `.env` file is
/// loaded first):
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/tspl-label | Working directory |
/// | HTTP_HOST | 0.0.0.0 | HTTP bind address |
/// | HTTP_PORT | 8765 | HTTP port |
/// | PROFILE_PATH | `<WORK_DIR>/printer_profile.json` | Printer profile file |
/// | LOG_LEVEL | info | Log level |
/// | LOG_JSON | false | JSON log format |
/// | LOG_DIR | (unset) | Rolling log directory, console only when unset |
/// | MAX_RAW_BYTES | 1048576 | Limit for `/raw` bodies |
/// | MAX_IMAGE_BYTES | 8388608 | Limit for `/image` bodies |
/// | WATCHDOG_INTERVAL_MS | 2000 | Device node poll interval |
/// | DRIVER_MODULE | usblp | Kernel module reloaded on unplug, empty disables |
/// | RELOAD_COOLDOWN_MS | 30000 | Minimum time between driver reloads |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/tmp/label HTTP_PORT=9000 cargo run --bin label-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the profile and logs
    pub work_dir: String,
    pub http_host: String,
    pub http_port: u16,
    /// Printer profile JSON file
    pub profile_path: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub max_raw_bytes: usize,
    pub max_image_bytes: usize,
    pub watchdog_interval_ms: u64,
    /// Kernel driver behind the device node (`None` disables reload)
    pub driver_module: Option<String>,
    pub reload_cooldown_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to their defaults
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/tspl-label".into());
        let profile_path = std::env::var("PROFILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&work_dir).join("printer_profile.json"));

        Self {
            profile_path,
            http_host: std::env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8765),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            max_raw_bytes: std::env::var("MAX_RAW_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024 * 1024),
            max_image_bytes: std::env::var("MAX_IMAGE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8 * 1024 * 1024),
            watchdog_interval_ms: std::env::var("WATCHDOG_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
            driver_module: match std::env::var("DRIVER_MODULE") {
                Ok(m) if m.trim().is_empty() => None,
                Ok(m) => Some(m.trim().to_string()),
                Err(_) => Some("usblp".into()),
            },
            reload_cooldown_ms: std::env::var("RELOAD_COOLDOWN_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30000),
            work_dir,
        }
    }

    /// Override the working directory and profile location
    ///
    /// Commonly used in tests
    pub fn with_overrides(work_dir: impl Into<String>, profile_path: impl Into<PathBuf>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.profile_path = profile_path.into();
        config
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    pub fn reload_cooldown(&self) -> Duration {
        Duration::from_millis(self.reload_cooldown_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
