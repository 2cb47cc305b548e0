//! CUPS filter: page image → TSPL command stream
//!
//! Accepts anything the `image` crate decodes (PNG or PNM from a
//! rasterizing pre-filter, JPEG, BMP, WebP) and renders it exactly like an
//! `/image` request, using the same printer profile file as the server.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::core::ProfileStore;
use crate::printing::{LabelJob, render_job};

/// Render `data` with the profile at `profile_path` and write the stream
///
/// Returns the number of bytes written.
pub fn run(data: Vec<u8>, profile_path: &Path, out: &mut impl Write) -> anyhow::Result<usize> {
    let store = ProfileStore::load(profile_path)
        .with_context(|| format!("loading profile {}", profile_path.display()))?;
    let profile = store.snapshot();

    let job = LabelJob::image(data)?;
    let rendered = render_job(&profile, &job)?;

    out.write_all(&rendered.data)?;
    out.flush()?;
    info!(bytes = rendered.data.len(), "Page rendered");
    Ok(rendered.data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([0]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_filter_emits_one_bitmap_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let written = run(png(16, 4), &dir.path().join("missing.json"), &mut out).unwrap();

        assert_eq!(written, out.len());
        assert!(out.starts_with(b"SIZE "));
        assert!(out.windows(7).any(|w| w == b"BITMAP "));
        assert!(out.ends_with(b"PRINT 1,1\n"));
    }

    #[test]
    fn test_filter_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        assert!(run(b"%!PS-Adobe-3.0".to_vec(), &dir.path().join("p.json"), &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_rejects_malformed_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut out = Vec::new();
        assert!(run(png(8, 8), &path, &mut out).is_err());
    }
}
