//! Printer profile store
//!
//! Holds the active [`PrinterProfile`] behind an `Arc` that is swapped whole.
//! Requests take one snapshot at the start, so a concurrent update never
//! mixes two profiles inside one job.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tspl_printer::{PrintError, PrintResult, PrinterProfile};

#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    current: RwLock<Arc<PrinterProfile>>,
    /// Serializes read-modify-write updates and the file they persist to
    update_lock: Mutex<()>,
}

impl ProfileStore {
    /// Load the profile file, falling back to defaults when it does not exist
    ///
    /// A file that exists but does not parse or validate is an error.
    pub fn load(path: impl Into<PathBuf>) -> PrintResult<Self> {
        let path = path.into();
        let profile = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str::<PrinterProfile>(&raw).map_err(|e| {
                PrintError::InvalidConfig(format!("{}: {}", path.display(), e))
            })?
        } else {
            tracing::info!(path = %path.display(), "No printer profile found, using defaults");
            PrinterProfile::default()
        };
        profile.validate()?;

        Ok(Self::with_profile(path, profile))
    }

    /// In-memory store around a given profile; persisted on first update
    pub fn with_profile(path: impl Into<PathBuf>, profile: PrinterProfile) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(profile)),
            update_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current profile
    pub fn snapshot(&self) -> Arc<PrinterProfile> {
        self.current.read().clone()
    }

    /// Derive a new profile from the current one, persist it and swap it in
    ///
    /// Nothing changes if `f` fails or the result does not validate.
    pub fn update<F>(&self, f: F) -> PrintResult<Arc<PrinterProfile>>
    where
        F: FnOnce(&PrinterProfile) -> PrintResult<PrinterProfile>,
    {
        let _guard = self.update_lock.lock();
        let next = f(&self.snapshot())?;
        next.validate()?;
        self.persist(&next)?;

        let next = Arc::new(next);
        *self.current.write() = next.clone();
        tracing::info!(path = %self.path.display(), "Printer profile updated");
        Ok(next)
    }

    /// Write the profile, keeping the previous file as `<path>.bak`
    fn persist(&self, profile: &PrinterProfile) -> PrintResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if self.path.exists() {
            fs::copy(&self.path, sibling(&self.path, "bak"))?;
        }

        let json = serde_json::to_string_pretty(profile)
            .map_err(|e| PrintError::InvalidConfig(e.to_string()))?;
        let tmp = sibling(&self.path, "tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// `<path>.<ext>` next to `path`
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
