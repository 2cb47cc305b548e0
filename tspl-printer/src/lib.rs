//! # tspl-printer
//!
//! TSPL thermal label printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Pixel canvas, text and barcode rasterization
//! - 1-bit BITMAP packing
//! - TSPL command building
//! - Serialized device writes and hot-unplug recovery
//!
//! Business logic (WHAT to print) should stay in application code:
//! - Label templates, HTTP and CUPS entry points → label-server
//!
//! ## Example
//!
//! ```ignore
//! use tspl_printer::{compose_label, DeviceChannel, Element, Font, Label, PrinterProfile};
//!
//! let profile = PrinterProfile::default();
//! let mut label = Label::new(profile.width_dots(), profile.height_dots());
//! label.push(Element::Text { x: 50, y: 30, font: Font::F3, text: "Hello".into() });
//!
//! let stream = compose_label(&profile, &label)?;
//! let device = DeviceChannel::new(&profile.device_path);
//! device.write(&stream.to_bytes()).await?;
//! ```

mod barcode;
mod bitmap;
mod canvas;
mod device;
mod element;
mod error;
mod font;
mod profile;
mod tspl;

// Re-exports
pub use barcode::{code128_values, module_count, Symbology};
pub use bitmap::{BitmapFrame, BITMAP_MODE_OR};
pub use canvas::{fit_within, PixelCanvas, Reduction};
pub use device::{
    DeviceChannel, DeviceState, DeviceWatchdog, DriverReloader, KernelModuleReloader,
};
pub use element::{Element, Label, BARCODE_NARROW};
pub use error::{PrintError, PrintResult};
pub use font::{fit_width, sanitize, Font};
pub use profile::{
    mm_to_dots, GapMode, PrinterProfile, RenderMode, DENSITY_MAX, DOTS_PER_MM, DPI, LABEL_MAX_MM,
    OFFSET_MAX, OFFSET_MIN, SPEED_MAX, SPEED_MIN,
};
pub use tspl::{compose_label, CommandStream, Segment, TsplBuilder};
