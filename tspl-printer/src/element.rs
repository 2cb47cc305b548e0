//! Label elements
//!
//! A label is a list of positioned primitives. The composer turns each one
//! into a firmware directive, or [`Label::rasterize`] draws them all onto a
//! single canvas.

use crate::barcode::Symbology;
use crate::bitmap::BitmapFrame;
use crate::canvas::PixelCanvas;
use crate::error::PrintResult;
use crate::font::Font;

/// Barcode narrow-module width in dots
pub const BARCODE_NARROW: u32 = 2;

/// One positioned primitive; coordinates in dots, offsets already applied
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        x: i32,
        y: i32,
        font: Font,
        text: String,
    },
    /// Filled rectangle
    Bar { x: i32, y: i32, width: u32, height: u32 },
    /// Rectangle outline between two corners
    Box {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        thickness: u32,
    },
    Barcode {
        x: i32,
        y: i32,
        symbology: Symbology,
        height: u32,
        human_readable: bool,
        data: String,
    },
    Bitmap { x: i32, y: i32, frame: BitmapFrame },
}

/// A fully laid out label
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Label {
    pub width: u32,
    pub height: u32,
    pub elements: Vec<Element>,
    /// Lines or items dropped because they did not fit
    pub truncated: usize,
}

impl Label {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
            truncated: 0,
        }
    }

    pub fn push(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    /// Draw every element onto one label-sized canvas
    pub fn rasterize(&self) -> PrintResult<PixelCanvas> {
        let mut canvas = PixelCanvas::new(self.width, self.height);
        for element in &self.elements {
            match element {
                Element::Text { x, y, font, text } => {
                    canvas.draw_text(*x as i64, *y as i64, *font, text);
                }
                Element::Bar {
                    x,
                    y,
                    width,
                    height,
                } => canvas.fill_rect(*x as i64, *y as i64, *width, *height),
                Element::Box {
                    x1,
                    y1,
                    x2,
                    y2,
                    thickness,
                } => canvas.draw_box(*x1 as i64, *y1 as i64, *x2 as i64, *y2 as i64, *thickness),
                Element::Barcode {
                    x,
                    y,
                    symbology,
                    height,
                    human_readable,
                    data,
                } => {
                    let width = canvas.draw_barcode(
                        *x as i64,
                        *y as i64,
                        *symbology,
                        data,
                        *height,
                        BARCODE_NARROW,
                    )?;
                    if *human_readable {
                        // centred under the bars, like the firmware does
                        let font = Font::F1;
                        let text_w = font.text_width(data) as i64;
                        let tx = *x as i64 + (width as i64 - text_w) / 2;
                        canvas.draw_text(tx, *y as i64 + *height as i64 + 4, font, data);
                    }
                }
                Element::Bitmap { x, y, frame } => canvas.draw_frame(*x as i64, *y as i64, frame),
            }
        }
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_places_elements() {
        let mut label = Label::new(200, 120);
        label
            .push(Element::Bar {
                x: 0,
                y: 0,
                width: 200,
                height: 2,
            })
            .push(Element::Barcode {
                x: 10,
                y: 20,
                symbology: Symbology::Code128,
                height: 40,
                human_readable: true,
                data: "A1".into(),
            });
        let canvas = label.rasterize().unwrap();
        assert!(canvas.get(199, 1));
        assert!(canvas.get(10, 20) && canvas.get(10, 59));
        // human readable text sits below the bars
        assert!((64..76).any(|y| (0..200).any(|x| canvas.get(x, y))));
    }

    #[test]
    fn test_rasterize_rejects_bad_barcode() {
        let mut label = Label::new(100, 100);
        label.push(Element::Barcode {
            x: 0,
            y: 0,
            symbology: Symbology::Code128,
            height: 10,
            human_readable: false,
            data: String::new(),
        });
        assert!(label.rasterize().is_err());
    }
}
