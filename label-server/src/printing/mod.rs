//! Label Printing Module
//!
//! WHAT gets printed:
//! - Job parsing: request bodies → [`LabelJob`]
//! - Templates: plain text, shipping label, packing slip, image
//! - Calibration patterns and media control
//! - Print service: render, compose, write

pub mod calibration;
pub mod renderer;
pub mod service;
pub mod types;

pub use calibration::{FeedAction, TestPattern};
pub use renderer::LabelRenderer;
pub use service::{PrintOutcome, PrintService, RenderedJob, render_job};
pub use types::{LabelJob, PackingInfo, ShippingInfo};
