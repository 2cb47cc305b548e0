//! Printer profile - the static description of one physical label printer
//!
//! Loaded once at startup and shared read-only; a changed profile is a new
//! value swapped in whole, never mutated in place.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PrintError, PrintResult};

/// Print resolution of this hardware class
pub const DPI: u32 = 203;

/// Dots per millimetre at 203 DPI (rounded, as the firmware does)
pub const DOTS_PER_MM: f64 = 8.0;

/// Offset clamp range in dots
pub const OFFSET_MIN: i32 = -300;
pub const OFFSET_MAX: i32 = 300;

/// Largest label edge accepted, in mm
pub const LABEL_MAX_MM: f64 = 1000.0;

/// Firmware `DENSITY` range
pub const DENSITY_MAX: u8 = 15;
/// Firmware `SPEED` range
pub const SPEED_MIN: u8 = 1;
pub const SPEED_MAX: u8 = 15;

/// Gap sensor mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GapMode {
    /// Continuous / perforated stock: gap detection disabled (`GAP 0,0`)
    Continuous,
    /// Die-cut stock with a calibrated gap
    DieCut { gap_mm: f64, offset_mm: f64 },
}

/// How text-like templates reach the printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Firmware-rendered TEXT / BAR / BOX / BARCODE directives
    #[default]
    Native,
    /// Everything rasterized into one BITMAP
    Raster,
}

/// Printer profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterProfile {
    pub label_width_mm: f64,
    pub label_height_mm: f64,
    /// Horizontal offset in dots (positive moves content right)
    pub x_offset: i32,
    /// Vertical offset in dots, compensates the unprintable top margin
    pub y_offset: i32,
    pub device_path: PathBuf,
    pub gap: GapMode,
    pub dpi: u32,
    pub density: u8,
    pub speed: u8,
    pub direction: u8,
    /// Floyd-Steinberg dithering for grayscale input (fixed threshold when off)
    pub dither: bool,
    pub render_mode: RenderMode,
}

impl Default for PrinterProfile {
    /// 4" x 6" shipping label on `/dev/usb/lp0`
    fn default() -> Self {
        Self {
            label_width_mm: 101.6,
            label_height_mm: 152.4,
            x_offset: 32,
            y_offset: 0,
            device_path: PathBuf::from("/dev/usb/lp0"),
            gap: GapMode::Continuous,
            dpi: DPI,
            density: 8,
            speed: 4,
            direction: 1,
            dither: true,
            render_mode: RenderMode::Native,
        }
    }
}

impl PrinterProfile {
    /// Label width in device dots
    pub fn width_dots(&self) -> u32 {
        mm_to_dots(self.label_width_mm)
    }

    /// Label height in device dots
    pub fn height_dots(&self) -> u32 {
        mm_to_dots(self.label_height_mm)
    }

    /// Reject profiles the firmware cannot honour
    pub fn validate(&self) -> PrintResult<()> {
        if self.dpi != DPI {
            return Err(PrintError::InvalidConfig(format!(
                "dpi must be {}, got {}",
                DPI, self.dpi
            )));
        }
        let in_range = |mm: f64| mm > 0.0 && mm <= LABEL_MAX_MM;
        if !in_range(self.label_width_mm) || !in_range(self.label_height_mm) {
            return Err(PrintError::InvalidConfig(format!(
                "label size must be within 0..={} mm, got {}x{} mm",
                LABEL_MAX_MM, self.label_width_mm, self.label_height_mm
            )));
        }
        if self.density > DENSITY_MAX {
            return Err(PrintError::InvalidConfig(format!(
                "density must be within 0..={}, got {}",
                DENSITY_MAX, self.density
            )));
        }
        if !(SPEED_MIN..=SPEED_MAX).contains(&self.speed) {
            return Err(PrintError::InvalidConfig(format!(
                "speed must be within {}..={}, got {}",
                SPEED_MIN, SPEED_MAX, self.speed
            )));
        }
        if self.direction > 1 {
            return Err(PrintError::InvalidConfig(format!(
                "direction must be 0 or 1, got {}",
                self.direction
            )));
        }
        for (name, value) in [("x_offset", self.x_offset), ("y_offset", self.y_offset)] {
            if !(OFFSET_MIN..=OFFSET_MAX).contains(&value) {
                return Err(PrintError::InvalidConfig(format!(
                    "{} must be within {}..={}, got {}",
                    name, OFFSET_MIN, OFFSET_MAX, value
                )));
            }
        }
        if let GapMode::DieCut { gap_mm, offset_mm } = self.gap
            && (!(gap_mm > 0.0) || offset_mm < 0.0)
        {
            return Err(PrintError::InvalidConfig(format!(
                "die-cut gap must be positive, got {} mm (offset {} mm)",
                gap_mm, offset_mm
            )));
        }
        if self.device_path.as_os_str().is_empty() {
            return Err(PrintError::InvalidConfig("device_path is empty".into()));
        }
        Ok(())
    }
}

/// Convert millimetres to dots at 203 DPI
pub fn mm_to_dots(mm: f64) -> u32 {
    (mm * DOTS_PER_MM).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dimensions() {
        let p = PrinterProfile::default();
        assert_eq!(p.width_dots(), 813);
        assert_eq!(p.height_dots(), 1219);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_rejects_other_dpi() {
        let p = PrinterProfile {
            dpi: 300,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(PrintError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unprintable_sizes() {
        for (w, h) in [(0.0, 50.0), (50.0, -1.0), (1000.5, 50.0), (50.0, 268_435_455.0), (f64::NAN, 50.0), (50.0, f64::INFINITY)] {
            let p = PrinterProfile {
                label_width_mm: w,
                label_height_mm: h,
                ..Default::default()
            };
            assert!(matches!(p.validate(), Err(PrintError::InvalidConfig(_))), "{}x{}", w, h);
        }
        let p = PrinterProfile {
            label_width_mm: LABEL_MAX_MM,
            label_height_mm: 2.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_rejects_firmware_settings_out_of_range() {
        let bad = [
            PrinterProfile { density: 16, ..Default::default() },
            PrinterProfile { speed: 0, ..Default::default() },
            PrinterProfile { speed: 16, ..Default::default() },
            PrinterProfile { direction: 2, ..Default::default() },
        ];
        for p in bad {
            assert!(p.validate().is_err(), "{:?}", p);
        }
        let edge = PrinterProfile {
            density: DENSITY_MAX,
            speed: SPEED_MAX,
            direction: 0,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let p = PrinterProfile {
            y_offset: 301,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let p: PrinterProfile =
            serde_json::from_str(r#"{"x_offset": -8, "gap": {"mode": "die_cut", "gap_mm": 2.5, "offset_mm": 0}}"#)
                .unwrap();
        assert_eq!(p.x_offset, -8);
        assert_eq!(p.label_width_mm, 101.6);
        assert_eq!(
            p.gap,
            GapMode::DieCut {
                gap_mm: 2.5,
                offset_mm: 0.0
            }
        );
        assert!(p.validate().is_ok());
    }
}
