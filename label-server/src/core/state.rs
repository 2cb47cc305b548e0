use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tspl_printer::{DeviceChannel, DeviceWatchdog, DriverReloader, KernelModuleReloader};

use crate::core::{Config, ProfileStore, Result};
use crate::printing::PrintService;

/// Server state - shared handles to every service
///
/// Cloning is cheap, every field is reference counted.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | config | Config | Configuration (immutable) |
/// | profiles | Arc<ProfileStore> | Active printer profile |
/// | device | DeviceChannel | Single writer for the device node |
/// | printer | PrintService | Render → compose → write |
/// | shutdown | CancellationToken | Stops background tasks |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub profiles: Arc<ProfileStore>,
    pub device: DeviceChannel,
    pub printer: PrintService,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Initialize server state
    ///
    /// Loads the printer profile (a malformed file is fatal) and opens the
    /// device channel for the profile's device path. Background tasks are
    /// not started here, see [`start_background_tasks`](Self::start_background_tasks).
    pub async fn initialize(config: &Config) -> Result<Self> {
        let profiles = Arc::new(ProfileStore::load(&config.profile_path)?);
        let profile = profiles.snapshot();
        tracing::info!(
            path = %config.profile_path.display(),
            device = %profile.device_path.display(),
            width_mm = profile.label_width_mm,
            height_mm = profile.label_height_mm,
            "Printer profile loaded"
        );

        let device = DeviceChannel::new(&profile.device_path);
        let printer = PrintService::new(profiles.clone(), device.clone());

        Ok(Self {
            config: config.clone(),
            profiles,
            device,
            printer,
            shutdown: CancellationToken::new(),
        })
    }

    /// Start the device watchdog
    pub fn start_background_tasks(&self) {
        let reloader = self
            .config
            .driver_module
            .as_ref()
            .map(|m| Arc::new(KernelModuleReloader::new(m.clone())) as Arc<dyn DriverReloader>);
        if reloader.is_none() {
            tracing::info!("Driver reload disabled");
        }

        let watchdog = DeviceWatchdog::new(
            self.device.clone(),
            reloader,
            self.config.watchdog_interval(),
            self.config.reload_cooldown(),
            self.shutdown.clone(),
        );
        tokio::spawn(watchdog.run());
    }
}
