//! Label renderer
//!
//! Lays out each job variant as a [`Label`] sized to the printer profile.
//! Offsets from the profile are applied here, once, to every element.
//! Content that does not fit is dropped or clipped and counted in
//! [`Label::truncated`], never wrapped.

use chrono::NaiveDate;
use image::{DynamicImage, GrayImage, Luma};
use tracing::{instrument, warn};
use tspl_printer::{
    Element, Font, Label, PixelCanvas, PrintError, PrintResult, PrinterProfile, Reduction,
    Symbology, BARCODE_NARROW, fit_width, fit_within, module_count,
};

use super::types::{PackingInfo, ShippingInfo};

/// Left/right margin in dots
const MARGIN: u32 = 50;
/// First text row
const TOP: u32 = 30;
/// Space kept free at the bottom edge
const BOTTOM: u32 = 30;

const BODY_FONT: Font = Font::F3;
const BODY_PITCH: u32 = 40;
const TITLE_FONT: Font = Font::F4;
const ITEM_FONT: Font = Font::F2;
const ITEM_PITCH: u32 = 30;

const ADDRESS_PITCH: u32 = 36;
const ADDRESS_MAX_LINES: usize = 4;
const BARCODE_HEIGHT: u32 = 120;

/// Label renderer bound to one profile snapshot
pub struct LabelRenderer<'a> {
    profile: &'a PrinterProfile,
    width: u32,
    height: u32,
}

impl<'a> LabelRenderer<'a> {
    pub fn new(profile: &'a PrinterProfile) -> Self {
        Self {
            profile,
            width: profile.width_dots(),
            height: profile.height_dots(),
        }
    }

    /// Stacked lines from the top margin
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn plain_text(&self, lines: &[String]) -> Label {
        let mut label = Label::new(self.width, self.height);
        let slots = self.rows(TOP, BODY_FONT, BODY_PITCH);

        for (i, line) in lines.iter().take(slots).enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let y = TOP + i as u32 * BODY_PITCH;
            self.text(&mut label, MARGIN, y, BODY_FONT, line);
        }
        label.truncated += lines.len().saturating_sub(slots);

        self.report(&label, "plain_text");
        label
    }

    /// Shipping label for today
    pub fn shipping(&self, info: &ShippingInfo) -> PrintResult<Label> {
        self.shipping_on(info, chrono::Local::now().date_naive())
    }

    /// Header, order id, date, ship-to block, then the tracking barcode
    #[instrument(skip_all, fields(order_id = %info.order_id))]
    pub fn shipping_on(&self, info: &ShippingInfo, date: NaiveDate) -> PrintResult<Label> {
        let mut label = Label::new(self.width, self.height);

        self.text(&mut label, MARGIN, TOP, TITLE_FONT, "SHIP TO");
        self.text(&mut label, MARGIN, 75, BODY_FONT, &format!("Order: {}", info.order_id));
        self.text(&mut label, MARGIN, 115, BODY_FONT, &format!("Date: {}", date.format("%Y-%m-%d")));
        self.rule(&mut label, 155);

        self.text(&mut label, MARGIN, 175, TITLE_FONT, &info.name);
        let address: Vec<&str> = info
            .address
            .split(", ")
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        for (i, line) in address.iter().take(ADDRESS_MAX_LINES).enumerate() {
            let y = 225 + i as u32 * ADDRESS_PITCH;
            self.text(&mut label, MARGIN, y, BODY_FONT, line);
        }
        label.truncated += address.len().saturating_sub(ADDRESS_MAX_LINES);
        self.rule(&mut label, 385);

        let modules = Symbology::Code128.modules(&info.tracking_code)?;
        let barcode_width = module_count(&modules) * BARCODE_NARROW;
        if barcode_width > self.content_width() {
            return Err(PrintError::InvalidBarcode(format!(
                "{} is {} dots wide, label allows {}",
                info.tracking_code,
                barcode_width,
                self.content_width()
            )));
        }
        let (x, y) = self.at(MARGIN, 410);
        label.push(Element::Barcode {
            x,
            y,
            symbology: Symbology::Code128,
            height: BARCODE_HEIGHT,
            human_readable: true,
            data: info.tracking_code.clone(),
        });

        self.report(&label, "shipping");
        Ok(label)
    }

    /// Order id, name, then one line per item
    #[instrument(skip_all, fields(order_id = %info.order_id, items = info.items.len()))]
    pub fn packing(&self, info: &PackingInfo) -> Label {
        let mut label = Label::new(self.width, self.height);

        self.text(&mut label, MARGIN, TOP, TITLE_FONT, "PACKING SLIP");
        self.text(&mut label, MARGIN, 75, BODY_FONT, &format!("Order: {}", info.order_id));
        if !info.name.is_empty() {
            self.text(&mut label, MARGIN, 115, BODY_FONT, &format!("Customer: {}", info.name));
        }
        self.rule(&mut label, 155);

        let first = 175;
        let slots = self.rows(first, ITEM_FONT, ITEM_PITCH);
        let shown = if info.items.len() > slots {
            // last slot carries the overflow notice
            slots.saturating_sub(1)
        } else {
            info.items.len()
        };

        for (i, item) in info.items.iter().take(shown).enumerate() {
            let y = first + i as u32 * ITEM_PITCH;
            self.text(&mut label, MARGIN, y, ITEM_FONT, &format!("{}. {}", i + 1, item));
        }
        let hidden = info.items.len() - shown;
        // no slot at all leaves no room for the notice either
        if hidden > 0 && slots > 0 {
            let y = first + shown as u32 * ITEM_PITCH;
            self.text(&mut label, MARGIN, y, ITEM_FONT, &format!("+ {} more", hidden));
        }
        label.truncated += hidden;

        self.report(&label, "packing");
        label
    }

    /// Decode, fit below/right of the offsets, reduce to 1 bit and invert once
    #[instrument(skip_all, fields(len = bytes.len()))]
    pub fn image(&self, bytes: &[u8]) -> PrintResult<Label> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| PrintError::UnsupportedImageFormat(e.to_string()))?;
        let gray = flatten(&decoded);

        let x = self.profile.x_offset.max(0);
        let y = self.profile.y_offset.max(0);
        let region_w = self.width.saturating_sub(x as u32);
        let region_h = self.height.saturating_sub(y as u32);
        let (w, h) = fit_within(gray.width(), gray.height(), region_w, region_h);

        let reduction = if self.profile.dither {
            Reduction::Dither
        } else {
            Reduction::Threshold
        };
        let mut canvas = PixelCanvas::new(w, h);
        canvas.blit(0, 0, &gray, reduction);
        canvas.invert();
        let frame = canvas.to_bitmap_frame()?;

        let mut label = Label::new(self.width, self.height);
        label.push(Element::Bitmap { x, y, frame });
        Ok(label)
    }

    fn content_width(&self) -> u32 {
        self.width.saturating_sub(2 * MARGIN).max(1)
    }

    /// Number of `font` rows starting at `first` that end above the bottom margin
    fn rows(&self, first: u32, font: Font, pitch: u32) -> usize {
        let limit = self.height.saturating_sub(BOTTOM);
        let cell_h = font.cell().1;
        if first + cell_h > limit {
            return 0;
        }
        ((limit - first - cell_h) / pitch + 1) as usize
    }

    /// Profile offsets applied to a layout position
    fn at(&self, x: u32, y: u32) -> (i32, i32) {
        (
            x as i32 + self.profile.x_offset,
            y as i32 + self.profile.y_offset,
        )
    }

    /// One TEXT element, clipped to the content width
    fn text(&self, label: &mut Label, x: u32, y: u32, font: Font, text: &str) {
        let (text, clipped) = fit_width(text, font, self.content_width());
        if clipped {
            label.truncated += 1;
        }
        let (x, y) = self.at(x, y);
        label.push(Element::Text { x, y, font, text });
    }

    /// Full-width separator
    fn rule(&self, label: &mut Label, y: u32) {
        let (x, y) = self.at(MARGIN, y);
        label.push(Element::Bar {
            x,
            y,
            width: self.content_width(),
            height: 3,
        });
    }

    fn report(&self, label: &Label, template: &str) {
        if label.truncated > 0 {
            warn!(template, truncated = label.truncated, "Label content truncated");
        }
    }
}

/// Grayscale with transparency composited onto white paper
fn flatten(image: &DynamicImage) -> GrayImage {
    if !image.color().has_alpha() {
        return image.to_luma8();
    }
    let la = image.to_luma_alpha8();
    GrayImage::from_fn(la.width(), la.height(), |x, y| {
        let [l, a] = la.get_pixel(x, y).0;
        let (l, a) = (l as u32, a as u32);
        Luma([((l * a + 255 * (255 - a)) / 255) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn texts(label: &Label) -> Vec<&str> {
        label
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn shipping_info() -> ShippingInfo {
        ShippingInfo {
            order_id: "54321".into(),
            name: "Jane Doe".into(),
            address: "123 Oak Ave, Detroit".into(),
            tracking_code: "ORDER54321".into(),
        }
    }

    #[test]
    fn test_plain_text_in_order_with_offsets() {
        let profile = PrinterProfile::default();
        let lines: Vec<String> = vec!["Line 1".into(), "Line 2".into(), "Line 3".into()];
        let label = LabelRenderer::new(&profile).plain_text(&lines);

        assert_eq!(texts(&label), vec!["Line 1", "Line 2", "Line 3"]);
        assert_eq!(label.truncated, 0);
        let Element::Text { x, y, .. } = &label.elements[0] else {
            panic!("expected text");
        };
        assert_eq!((*x, *y), (50 + 32, 30));
    }

    #[test]
    fn test_plain_text_truncates_overflow() {
        let profile = PrinterProfile {
            label_height_mm: 21.0,
            ..Default::default()
        };
        // 168 dots tall: rows at 30, 70, 110 end above 138
        let lines: Vec<String> = (0..6).map(|i| format!("row {}", i)).collect();
        let label = LabelRenderer::new(&profile).plain_text(&lines);
        assert_eq!(texts(&label).len(), 3);
        assert_eq!(label.truncated, 3);
    }

    #[test]
    fn test_long_line_is_clipped() {
        let profile = PrinterProfile::default();
        let lines = vec!["x".repeat(100)];
        let label = LabelRenderer::new(&profile).plain_text(&lines);
        // 713 dots / 16 per char
        assert_eq!(texts(&label)[0].len(), 44);
        assert_eq!(label.truncated, 1);
    }

    #[test]
    fn test_shipping_layout() {
        let profile = PrinterProfile::default();
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let label = LabelRenderer::new(&profile)
            .shipping_on(&shipping_info(), date)
            .unwrap();

        let t = texts(&label);
        assert_eq!(t.iter().filter(|s| s.contains("54321")).count(), 1);
        assert!(t.contains(&"Date: 2026-10-17"));
        assert!(t.contains(&"123 Oak Ave") && t.contains(&"Detroit"));

        let barcodes: Vec<_> = label
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Barcode { data, .. } => Some(data.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(barcodes, vec!["ORDER54321"]);
    }

    #[test]
    fn test_shipping_rejects_unscannable_width() {
        let profile = PrinterProfile::default();
        let info = ShippingInfo {
            tracking_code: "X".repeat(40),
            ..shipping_info()
        };
        assert!(matches!(
            LabelRenderer::new(&profile).shipping(&info),
            Err(PrintError::InvalidBarcode(_))
        ));
    }

    #[test]
    fn test_packing_overflow_notice() {
        let profile = PrinterProfile {
            label_height_mm: 36.0,
            ..Default::default()
        };
        // 288 dots: item rows at 175, 205, 235 end above 258
        let info = PackingInfo {
            order_id: "9".into(),
            name: "Sam".into(),
            items: (1..=5).map(|i| format!("part {}", i)).collect(),
        };
        let label = LabelRenderer::new(&profile).packing(&info);
        let t = texts(&label);
        assert!(t.contains(&"1. part 1") && t.contains(&"2. part 2"));
        assert!(!t.iter().any(|s| s.contains("part 3")));
        assert!(t.contains(&"+ 3 more"));
        assert_eq!(label.truncated, 3);
    }

    #[test]
    fn test_packing_without_item_rows() {
        // 25 mm = 200 dots: item rows start at 175, past the 170 limit
        let profile = PrinterProfile {
            label_height_mm: 25.0,
            ..Default::default()
        };
        let info = PackingInfo {
            order_id: "9".into(),
            name: "Sam".into(),
            items: vec!["bolt".into(), "nut".into()],
        };
        let label = LabelRenderer::new(&profile).packing(&info);
        let t = texts(&label);
        assert!(!t.iter().any(|s| s.contains("more") || s.contains("bolt")));
        assert_eq!(label.truncated, 2);
    }

    #[test]
    fn test_image_fits_and_inverts() {
        // 16x8 image: left half black, right half fully transparent
        let img = RgbaImage::from_fn(16, 8, |x, _| {
            if x < 8 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 0, 0])
            }
        });
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let profile = PrinterProfile {
            dither: false,
            ..Default::default()
        };
        let label = LabelRenderer::new(&profile).image(&png).unwrap();
        let [Element::Bitmap { x, y, frame }] = label.elements.as_slice() else {
            panic!("expected one bitmap");
        };
        assert_eq!((*x, *y), (32, 0));
        assert_eq!(frame.width_bytes(), 2);
        assert_eq!(frame.height(), 8);
        // black prints, transparent stays blank
        assert_eq!(&frame.data()[..2], &[0xFF, 0x00]);
    }

    #[test]
    fn test_image_decode_failure() {
        let profile = PrinterProfile::default();
        assert!(matches!(
            LabelRenderer::new(&profile).image(b"\x89PNG\r\n\x1a\nbroken"),
            Err(PrintError::UnsupportedImageFormat(_))
        ));
    }
}
