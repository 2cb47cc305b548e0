//! TSPL command composer
//!
//! Provides a fluent API for building TSPL command streams, and
//! [`compose_label`] which wraps a laid out [`Label`] into a complete job.

use crate::barcode::Symbology;
use crate::bitmap::BitmapFrame;
use crate::element::{Element, Label, BARCODE_NARROW};
use crate::error::PrintResult;
use crate::font::{sanitize, Font};
use crate::profile::{GapMode, PrinterProfile, RenderMode};
use tracing::instrument;

/// Directive terminator
const EOL: &[u8] = b"\n";

/// One directive, or one atomic BITMAP segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// ASCII directive without terminator
    Command(String),
    /// `BITMAP` header immediately followed by its payload
    Bitmap { header: String, data: Vec<u8> },
}

/// Ordered command stream for one device write
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandStream {
    segments: Vec<Segment>,
}

impl CommandStream {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// ASCII part of every segment, in order (BITMAP segments yield their header)
    pub fn directives(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| match s {
            Segment::Command(line) => line.as_str(),
            Segment::Bitmap { header, .. } => header.as_str(),
        })
    }

    /// Number of directives whose keyword is `keyword`
    pub fn count(&self, keyword: &str) -> usize {
        self.directives()
            .filter(|d| d.split([' ', ',']).next() == Some(keyword))
            .count()
    }

    /// Serialize to the exact bytes sent to the device
    ///
    /// A BITMAP header and its payload are written back to back; the
    /// terminator only follows the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for segment in &self.segments {
            match segment {
                Segment::Command(line) => out.extend_from_slice(line.as_bytes()),
                Segment::Bitmap { header, data } => {
                    out.extend_from_slice(header.as_bytes());
                    out.extend_from_slice(data);
                }
            }
            out.extend_from_slice(EOL);
        }
        out
    }

    fn byte_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Command(line) => line.len(),
                Segment::Bitmap { header, data } => header.len() + data.len(),
            } + EOL.len())
            .sum()
    }
}

/// TSPL command builder
pub struct TsplBuilder {
    segments: Vec<Segment>,
}

impl TsplBuilder {
    pub fn new() -> Self {
        Self {
            segments: Vec::with_capacity(16),
        }
    }

    fn command(&mut self, line: String) -> &mut Self {
        self.segments.push(Segment::Command(line));
        self
    }

    // === Media Setup ===

    /// `SIZE w mm,h mm`
    pub fn size(&mut self, width_mm: f64, height_mm: f64) -> &mut Self {
        self.command(format!("SIZE {} mm,{} mm", width_mm, height_mm))
    }

    /// `GAP 0,0` for continuous stock, `GAP g mm,o mm` for die-cut
    pub fn gap(&mut self, gap: GapMode) -> &mut Self {
        match gap {
            GapMode::Continuous => self.command("GAP 0,0".into()),
            GapMode::DieCut { gap_mm, offset_mm } => {
                self.command(format!("GAP {} mm,{} mm", gap_mm, offset_mm))
            }
        }
    }

    pub fn density(&mut self, density: u8) -> &mut Self {
        self.command(format!("DENSITY {}", density))
    }

    pub fn speed(&mut self, speed: u8) -> &mut Self {
        self.command(format!("SPEED {}", speed))
    }

    pub fn direction(&mut self, direction: u8) -> &mut Self {
        self.command(format!("DIRECTION {}", direction))
    }

    /// Media setup directives for a profile
    pub fn setup(&mut self, profile: &PrinterProfile) -> &mut Self {
        self.size(profile.label_width_mm, profile.label_height_mm)
            .gap(profile.gap)
            .density(profile.density)
            .speed(profile.speed)
            .direction(profile.direction)
    }

    // === Buffer ===

    /// Clear the image buffer
    pub fn cls(&mut self) -> &mut Self {
        self.command("CLS".into())
    }

    // === Drawing ===

    pub fn text(&mut self, x: i32, y: i32, font: Font, text: &str) -> &mut Self {
        self.command(format!(
            "TEXT {},{},\"{}\",0,1,1,\"{}\"",
            dot(x),
            dot(y),
            font.code(),
            sanitize(text)
        ))
    }

    pub fn bar(&mut self, x: i32, y: i32, width: u32, height: u32) -> &mut Self {
        self.command(format!("BAR {},{},{},{}", dot(x), dot(y), width, height))
    }

    pub fn box_outline(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, thickness: u32) -> &mut Self {
        self.command(format!(
            "BOX {},{},{},{},{}",
            dot(x1),
            dot(y1),
            dot(x2),
            dot(y2),
            thickness
        ))
    }

    pub fn barcode(
        &mut self,
        x: i32,
        y: i32,
        symbology: Symbology,
        height: u32,
        human_readable: bool,
        data: &str,
    ) -> &mut Self {
        self.command(format!(
            "BARCODE {},{},\"{}\",{},{},0,{},{},\"{}\"",
            dot(x),
            dot(y),
            symbology.code(),
            height,
            human_readable as u8,
            BARCODE_NARROW,
            BARCODE_NARROW,
            sanitize(data)
        ))
    }

    /// `BITMAP` header and payload as one segment
    pub fn bitmap(&mut self, x: i32, y: i32, frame: &BitmapFrame) -> &mut Self {
        self.segments.push(Segment::Bitmap {
            header: frame.header(dot(x), dot(y)),
            data: frame.data().to_vec(),
        });
        self
    }

    /// Emit the directive for one element
    pub fn element(&mut self, element: &Element) -> &mut Self {
        match element {
            Element::Text { x, y, font, text } => self.text(*x, *y, *font, text),
            Element::Bar {
                x,
                y,
                width,
                height,
            } => self.bar(*x, *y, *width, *height),
            Element::Box {
                x1,
                y1,
                x2,
                y2,
                thickness,
            } => self.box_outline(*x1, *y1, *x2, *y2, *thickness),
            Element::Barcode {
                x,
                y,
                symbology,
                height,
                human_readable,
                data,
            } => self.barcode(*x, *y, *symbology, *height, *human_readable, data),
            Element::Bitmap { x, y, frame } => self.bitmap(*x, *y, frame),
        }
    }

    // === Media Control ===

    /// Return the media to the start of the next label
    pub fn home(&mut self) -> &mut Self {
        self.command("HOME".into())
    }

    /// Measure label and gap length with the gap sensor
    pub fn gap_detect(&mut self) -> &mut Self {
        self.command("GAPDETECT".into())
    }

    /// Feed `dots` of media
    pub fn feed(&mut self, dots: u32) -> &mut Self {
        self.command(format!("FEED {}", dots))
    }

    /// Print the buffer
    pub fn print(&mut self, copies: u32, sets: u32) -> &mut Self {
        self.command(format!("PRINT {},{}", copies, sets))
    }

    // === Build ===

    pub fn build(self) -> CommandStream {
        CommandStream {
            segments: self.segments,
        }
    }
}

impl Default for TsplBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a label into a complete job: setup, one CLS, content, one PRINT 1,1
///
/// Everything that can fail (barcode data, bitmap geometry) is checked here,
/// before a single byte is handed to the device.
#[instrument(skip_all, fields(elements = label.elements.len(), mode = ?profile.render_mode))]
pub fn compose_label(profile: &PrinterProfile, label: &Label) -> PrintResult<CommandStream> {
    let mut builder = TsplBuilder::new();
    builder.setup(profile).cls();

    let all_bitmaps = label
        .elements
        .iter()
        .all(|e| matches!(e, Element::Bitmap { .. }));

    if profile.render_mode == RenderMode::Raster && !all_bitmaps {
        let frame = label.rasterize()?.to_bitmap_frame()?;
        builder.bitmap(0, 0, &frame);
    } else {
        for element in &label.elements {
            if let Element::Barcode { symbology, data, .. } = element {
                symbology.modules(data)?;
            }
            builder.element(element);
        }
    }

    builder.print(1, 1);
    Ok(builder.build())
}

/// Negative coordinates clamp to the label edge
fn dot(v: i32) -> u32 {
    v.max(0) as u32
}
