//! Device channel - the single writer for the printer device node
//!
//! - All writes are serialized by one FIFO lock, held from open to close
//! - A write that has started runs to completion even if the caller goes away
//! - [`DeviceWatchdog`] tracks presence of the node and reloads the kernel
//!   driver when it disappears, under the same lock

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::{PrintError, PrintResult};

/// errno values meaning "node exists but no device behind it"
const ENXIO: i32 = 6;
const ENODEV: i32 = 19;

/// Watchdog view of the device node
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Connected,
    Disconnected,
}

/// Shared handle to the printer device node
#[derive(Debug, Clone)]
pub struct DeviceChannel {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
    state: Arc<watch::Sender<DeviceState>>,
}

impl DeviceChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = if path.exists() {
            DeviceState::Connected
        } else {
            DeviceState::Disconnected
        };
        let (tx, _) = watch::channel(initial);
        Self {
            path: Arc::new(path),
            lock: Arc::new(Mutex::new(())),
            state: Arc::new(tx),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last state observed by the watchdog or a write
    pub fn state(&self) -> DeviceState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: DeviceState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Write a complete command stream; returns the number of bytes written
    ///
    /// Waits (FIFO) for any write or driver reload in progress. The blocking
    /// write owns the lock guard, so dropping the returned future after the
    /// write started does not cut it short.
    #[instrument(skip(self, data), fields(path = %self.path.display(), len = data.len()))]
    pub async fn write(&self, data: &[u8]) -> PrintResult<usize> {
        let guard = self.lock.clone().lock_owned().await;
        let path = self.path.clone();
        let bytes = data.to_vec();

        let result = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            write_stream(&path, &bytes)
        })
        .await
        .map_err(|e| PrintError::Io(io::Error::other(e)))?;

        match &result {
            Ok(n) => {
                self.set_state(DeviceState::Connected);
                info!(bytes = n, "Print job written");
            }
            Err(PrintError::DeviceUnavailable(_)) => {
                self.set_state(DeviceState::Disconnected);
                warn!("Device unavailable");
            }
            Err(e) => warn!(error = %e, "Device write failed"),
        }
        result
    }
}

/// Open, write everything, close. The file handle is dropped on every path.
fn write_stream(path: &Path, data: &[u8]) -> PrintResult<usize> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound
                || matches!(e.raw_os_error(), Some(ENXIO) | Some(ENODEV))
            {
                PrintError::DeviceUnavailable(path.to_path_buf())
            } else {
                PrintError::DeviceWriteError {
                    written: 0,
                    total: data.len(),
                    source: e,
                }
            }
        })?;

    let mut written = 0;
    while written < data.len() {
        match file.write(&data[written..]) {
            Ok(0) => {
                return Err(PrintError::DeviceWriteError {
                    written,
                    total: data.len(),
                    source: io::Error::from(io::ErrorKind::WriteZero),
                });
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PrintError::DeviceWriteError {
                    written,
                    total: data.len(),
                    source: e,
                });
            }
        }
    }

    file.flush().map_err(|e| PrintError::DeviceWriteError {
        written,
        total: data.len(),
        source: e,
    })?;
    Ok(written)
}

/// Reattaches the kernel driver behind the device node
#[async_trait]
pub trait DriverReloader: Send + Sync {
    async fn reload(&self) -> io::Result<()>;
}

/// Unloads and reloads a kernel module with `modprobe`
#[derive(Debug, Clone)]
pub struct KernelModuleReloader {
    module: String,
}

impl KernelModuleReloader {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }

    async fn modprobe(&self, args: &[&str]) -> io::Result<()> {
        let status = tokio::process::Command::new("modprobe")
            .args(args)
            .arg(&self.module)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "modprobe {} {} exited with {}",
                args.join(" "),
                self.module,
                status
            )))
        }
    }
}

#[async_trait]
impl DriverReloader for KernelModuleReloader {
    async fn reload(&self) -> io::Result<()> {
        self.modprobe(&["-r"]).await?;
        self.modprobe(&[]).await
    }
}

/// Polls the device node and drives hot-unplug recovery
pub struct DeviceWatchdog {
    channel: DeviceChannel,
    reloader: Option<Arc<dyn DriverReloader>>,
    interval: Duration,
    cooldown: Duration,
    shutdown: CancellationToken,
}

impl DeviceWatchdog {
    pub fn new(
        channel: DeviceChannel,
        reloader: Option<Arc<dyn DriverReloader>>,
        interval: Duration,
        cooldown: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            channel,
            reloader,
            interval,
            cooldown,
            shutdown,
        }
    }

    /// Main loop: poll until shutdown
    pub async fn run(self) {
        info!(path = %self.channel.path().display(), "Device watchdog started");
        let mut last_reload: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.poll(&mut last_reload).await;
                }
                _ = self.shutdown.cancelled() => {
                    info!("Device watchdog received shutdown signal");
                    return;
                }
            }
        }
    }

    async fn poll(&self, last_reload: &mut Option<Instant>) {
        let present = tokio::fs::try_exists(self.channel.path())
            .await
            .unwrap_or(false);

        if present {
            if self.channel.set_state(DeviceState::Connected) {
                info!("Device node reappeared");
            }
            return;
        }

        if self.channel.set_state(DeviceState::Disconnected) {
            warn!("Device node disappeared");
        }

        let Some(reloader) = &self.reloader else {
            return;
        };
        if let Some(at) = last_reload
            && at.elapsed() < self.cooldown
        {
            return;
        }
        *last_reload = Some(Instant::now());

        // no write may run while the driver is being swapped
        let _guard = self.channel.lock.lock().await;
        info!("Reloading printer driver");
        match reloader.reload().await {
            Ok(()) => info!("Printer driver reloaded"),
            Err(e) => warn!(error = %e, "Printer driver reload failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_missing_device_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let channel = DeviceChannel::new(dir.path().join("lp0"));
        assert_eq!(channel.state(), DeviceState::Disconnected);
        let err = channel.write(b"CLS\n").await.unwrap_err();
        assert!(matches!(err, PrintError::DeviceUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_write_full_stream() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let channel = DeviceChannel::new(file.path());
        let n = channel.write(b"CLS\nPRINT 1,1\n").await.unwrap();
        assert_eq!(n, 14);
        assert_eq!(std::fs::read(file.path()).unwrap(), b"CLS\nPRINT 1,1\n");
        assert_eq!(channel.state(), DeviceState::Connected);
    }

    #[tokio::test]
    async fn test_short_write_is_write_error() {
        // every write to /dev/full fails with ENOSPC
        let full = std::path::Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let channel = DeviceChannel::new(full);
        let data = b"SIZE 101.6 mm,152.4 mm\nCLS\nPRINT 1,1\n";

        let err = channel.write(data).await.unwrap_err();
        match err {
            PrintError::DeviceWriteError { written, total, .. } => {
                assert_eq!(total, data.len());
                assert!(written < total);
            }
            other => panic!("expected DeviceWriteError, got {:?}", other),
        }
        assert!(!channel.write(b"CLS\n").await.unwrap_err().is_retryable());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_do_not_interleave() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let channel = DeviceChannel::new(file.path());

        let mut jobs = Vec::new();
        for i in 0..8u8 {
            let channel = channel.clone();
            jobs.push(tokio::spawn(async move {
                let payload = vec![b'a' + i; 64 * 1024];
                channel.write(&payload).await.unwrap();
            }));
        }
        for job in jobs {
            job.await.unwrap();
        }

        let content = std::fs::read(file.path()).unwrap();
        assert_eq!(content.len(), 8 * 64 * 1024);
        for chunk in content.chunks(64 * 1024) {
            assert!(chunk.iter().all(|&b| b == chunk[0]));
        }
    }

    struct CountingReloader(AtomicUsize);

    #[async_trait]
    impl DriverReloader for CountingReloader {
        async fn reload(&self) -> io::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_watchdog_tracks_node() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp0");
        std::fs::write(&path, b"").unwrap();

        let channel = DeviceChannel::new(&path);
        let mut rx = channel.subscribe();
        let reloader = Arc::new(CountingReloader(AtomicUsize::new(0)));
        let shutdown = CancellationToken::new();
        let watchdog = DeviceWatchdog::new(
            channel.clone(),
            Some(reloader.clone()),
            Duration::from_millis(20),
            Duration::from_secs(30),
            shutdown.clone(),
        );
        let task = tokio::spawn(watchdog.run());

        let wait = Duration::from_secs(5);
        std::fs::remove_file(&path).unwrap();
        tokio::time::timeout(wait, rx.changed()).await.unwrap().unwrap();
        assert_eq!(*rx.borrow_and_update(), DeviceState::Disconnected);

        // several polls inside the cooldown trigger a single reload
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(reloader.0.load(Ordering::SeqCst), 1);

        std::fs::write(&path, b"").unwrap();
        tokio::time::timeout(wait, rx.changed()).await.unwrap().unwrap();
        assert_eq!(*rx.borrow_and_update(), DeviceState::Connected);

        shutdown.cancel();
        task.await.unwrap();
    }
}
