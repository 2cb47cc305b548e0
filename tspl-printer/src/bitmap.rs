//! BITMAP encoder
//!
//! Packs a [`PixelCanvas`] into the firmware's raster layout:
//! - rows are `ceil(width / 8)` bytes wide, right-padded with blank dots
//! - MSB first: bit 7 of byte 0 is the leftmost dot of the row
//! - `1` = heat, `0` = no heat
//!
//! The header `BITMAP x,y,width_bytes,height,mode,` ends in a comma and the
//! payload follows it directly. Any byte between the two shifts the
//! firmware's byte counter and garbles the label.

use crate::canvas::PixelCanvas;
use crate::error::{PrintError, PrintResult};

/// OR-combine with existing buffer content
pub const BITMAP_MODE_OR: u8 = 0;

/// Packed 1-bit raster, ready for a `BITMAP` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapFrame {
    width_bytes: u32,
    height: u32,
    data: Vec<u8>,
}

impl BitmapFrame {
    /// Encode a canvas
    pub fn encode(canvas: &PixelCanvas) -> PrintResult<Self> {
        let (width, height) = (canvas.width(), canvas.height());
        if width == 0 || height == 0 {
            return Err(PrintError::InvalidGeometry { width, height });
        }

        let width_bytes = width.div_ceil(8);
        let mut data = Vec::with_capacity(width_bytes as usize * height as usize);

        for y in 0..height {
            for x_byte in 0..width_bytes {
                let mut byte = 0u8;
                for bit in 0..8 {
                    let x = x_byte * 8 + bit;
                    // columns past the canvas width stay 0
                    if x < width && canvas.get(x, y) {
                        byte |= 1 << (7 - bit);
                    }
                }
                data.push(byte);
            }
        }

        Ok(Self {
            width_bytes,
            height,
            data,
        })
    }

    pub fn width_bytes(&self) -> u32 {
        self.width_bytes
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed payload, `width_bytes * height` bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bit at column `x`, row `y` of the padded raster
    pub fn bit(&self, x: u32, y: u32) -> bool {
        if x >= self.width_bytes * 8 || y >= self.height {
            return false;
        }
        let byte = self.data[(y * self.width_bytes + x / 8) as usize];
        byte & (0x80 >> (x % 8)) != 0
    }

    /// ASCII header for placing this frame at (`x`, `y`)
    pub fn header(&self, x: u32, y: u32) -> String {
        format!(
            "BITMAP {},{},{},{},{},",
            x, y, self.width_bytes, self.height, BITMAP_MODE_OR
        )
    }

    /// Header and payload as one contiguous segment
    pub fn segment(&self, x: u32, y: u32) -> Vec<u8> {
        let header = self.header(x, y);
        let mut out = Vec::with_capacity(header.len() + self.data.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.data);
        out
    }
}
