//! Monochrome pixel canvas
//!
//! One byte per dot, addressed by pixel. `1` marks a dot to heat, `0` is the
//! blank (white) default. Dimensions are fixed at construction and every
//! drawing operation is clamped to them.

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::barcode::Symbology;
use crate::bitmap::BitmapFrame;
use crate::error::PrintResult;
use crate::font::{glyph_covers, Font};

/// Grayscale level at or above which a pixel counts as light
const THRESHOLD: u8 = 128;

/// Grayscale-to-1-bit reduction used by [`PixelCanvas::blit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Floyd-Steinberg error diffusion
    Dither,
    /// Fixed threshold at mid-gray
    Threshold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelCanvas {
    /// Create a blank canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the dot at (`x`, `y`) is set; out of range reads as blank
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.pixels[self.index(x, y)] != 0
    }

    /// Set one dot; out of range is ignored
    pub fn set(&mut self, x: i64, y: i64, on: bool) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        self.pixels[idx] = on as u8;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Fill the rectangle [x, x+w) x [y, y+h), clamped to the canvas
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as i64).min(self.width as i64);
        let y1 = (y + h as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.set(px, py, true);
            }
        }
    }

    /// Rectangle outline between two corners (inclusive), `thickness` dots
    /// drawn inward
    pub fn draw_box(&mut self, x1: i64, y1: i64, x2: i64, y2: i64, thickness: u32) {
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));
        let w = (right - left + 1) as u32;
        let h = (bottom - top + 1) as u32;
        let t = thickness.max(1);

        self.fill_rect(left, top, w, t.min(h));
        self.fill_rect(left, bottom - t as i64 + 1, w, t.min(h));
        self.fill_rect(left, top, t.min(w), h);
        self.fill_rect(right - t as i64 + 1, top, t.min(w), h);
    }

    /// Rasterize `text` with its top-left corner at (`x`, `y`)
    ///
    /// Each character occupies one cell of the given font class. Identical
    /// input always produces identical dots.
    pub fn draw_text(&mut self, x: i64, y: i64, font: Font, text: &str) {
        let (cw, ch) = font.cell();
        for (i, c) in text.chars().enumerate() {
            let cx = x + (i as i64) * cw as i64;
            if cx >= self.width as i64 {
                break;
            }
            for dy in 0..ch {
                for dx in 0..cw {
                    if glyph_covers(c, cw, ch, dx, dy) {
                        self.set(cx + dx as i64, y + dy as i64, true);
                    }
                }
            }
        }
    }

    /// Draw a linear barcode; returns its width in dots
    pub fn draw_barcode(
        &mut self,
        x: i64,
        y: i64,
        symbology: Symbology,
        data: &str,
        bar_height: u32,
        narrow: u32,
    ) -> PrintResult<u32> {
        let modules = symbology.modules(data)?;
        let narrow = narrow.max(1);
        let mut cursor = x;
        for (i, &m) in modules.iter().enumerate() {
            let w = m as u32 * narrow;
            if i % 2 == 0 {
                self.fill_rect(cursor, y, w, bar_height);
            }
            cursor += w as i64;
        }
        Ok((cursor - x) as u32)
    }

    /// OR an encoded frame onto the canvas at (`x`, `y`)
    pub fn draw_frame(&mut self, x: i64, y: i64, frame: &BitmapFrame) {
        for row in 0..frame.height() {
            for col in 0..frame.width_bytes() * 8 {
                if frame.bit(col, row) {
                    self.set(x + col as i64, y + row as i64, true);
                }
            }
        }
    }

    /// Fit a grayscale image into the region starting at (`x`, `y`) and
    /// reduce it to 1 bit
    ///
    /// The source is scaled down (never up) to fit the region while keeping
    /// its aspect ratio. Dots keep the source's luminance polarity: light
    /// pixels are set, dark ones cleared, so the result needs one
    /// [`invert`](Self::invert) before it is in print polarity. Nothing is
    /// written outside the fitted extent.
    pub fn blit(&mut self, x: u32, y: u32, source: &GrayImage, reduction: Reduction) {
        let region_w = self.width.saturating_sub(x);
        let region_h = self.height.saturating_sub(y);
        let (w, h) = fit_within(source.width(), source.height(), region_w, region_h);
        if w == 0 || h == 0 {
            return;
        }

        let mut gray = if (w, h) == source.dimensions() {
            source.clone()
        } else {
            imageops::resize(source, w, h, FilterType::Lanczos3)
        };

        if reduction == Reduction::Dither {
            imageops::dither(&mut gray, &imageops::BiLevel);
        }

        for (px, py, pixel) in gray.enumerate_pixels() {
            self.set((x + px) as i64, (y + py) as i64, pixel.0[0] >= THRESHOLD);
        }
    }

    /// Flip every dot. Applying it twice restores the canvas.
    pub fn invert(&mut self) {
        for p in &mut self.pixels {
            *p ^= 1;
        }
    }

    /// Encode into the printer's packed bitmap layout
    pub fn to_bitmap_frame(&self) -> PrintResult<BitmapFrame> {
        BitmapFrame::encode(self)
    }
}

/// Largest size with the source aspect ratio that fits `max_w` x `max_h`,
/// never larger than the source
pub fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 || max_w == 0 || max_h == 0 {
        return (0, 0);
    }
    if src_w <= max_w && src_h <= max_h {
        return (src_w, src_h);
    }
    let ratio = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio).floor() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * ratio).floor() as u32).clamp(1, max_h);
    (w, h)
}
