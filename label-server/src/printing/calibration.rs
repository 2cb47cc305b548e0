//! Calibration patterns and media control
//!
//! Test patterns are ordinary labels so they honour the render mode and the
//! offsets exactly like customer jobs. Media control streams carry no CLS or
//! label content, except `reset` which ends with an empty print.

use serde::Deserialize;
use tspl_printer::{
    CommandStream, Element, Font, Label, PrintResult, PrinterProfile, TsplBuilder, compose_label,
};

/// Calibration print kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPattern {
    /// Outline of the full label
    Border,
    /// Crosshair with two concentric boxes at the label centre
    Center,
    /// Edge labels and rules on every side
    Direction,
}

impl TestPattern {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "border" => Some(TestPattern::Border),
            "center" => Some(TestPattern::Center),
            "direction" => Some(TestPattern::Direction),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TestPattern::Border => "border",
            TestPattern::Center => "center",
            TestPattern::Direction => "direction",
        }
    }

    /// Lay out the pattern; offsets are applied like any other label
    pub fn label(self, profile: &PrinterProfile) -> Label {
        let (w, h) = (profile.width_dots() as i32, profile.height_dots() as i32);
        let (ox, oy) = (profile.x_offset, profile.y_offset);
        let mut label = Label::new(w as u32, h as u32);

        match self {
            TestPattern::Border => {
                label
                    .push(Element::Box {
                        x1: ox,
                        y1: oy,
                        x2: ox + w - 1,
                        y2: oy + h - 1,
                        thickness: 2,
                    })
                    .push(Element::Text {
                        x: ox + 10,
                        y: oy + 10,
                        font: Font::F2,
                        text: "BORDER TEST".into(),
                    });
            }
            TestPattern::Center => {
                let (cx, cy) = (ox + w / 2, oy + h / 2);
                label
                    .push(Element::Bar {
                        x: cx - 20,
                        y: cy - 1,
                        width: 40,
                        height: 2,
                    })
                    .push(Element::Bar {
                        x: cx - 1,
                        y: cy - 20,
                        width: 2,
                        height: 40,
                    });
                for r in [32, 16] {
                    label.push(Element::Box {
                        x1: cx - r,
                        y1: cy - r,
                        x2: cx + r,
                        y2: cy + r,
                        thickness: 1,
                    });
                }
                label.push(Element::Text {
                    x: ox + 10,
                    y: oy + 10,
                    font: Font::F2,
                    text: "CENTER CAL".into(),
                });
            }
            TestPattern::Direction => {
                let right = "RIGHT EDGE >>>";
                let right_x = ox + w - 10 - Font::F2.text_width(right) as i32;
                for y in [oy + 10, oy + h - 60] {
                    label
                        .push(Element::Text {
                            x: ox + 10,
                            y,
                            font: Font::F2,
                            text: "<<< LEFT EDGE".into(),
                        })
                        .push(Element::Text {
                            x: right_x,
                            y,
                            font: Font::F2,
                            text: right.into(),
                        });
                }
                label.push(Element::Text {
                    x: ox + w / 2 - 56,
                    y: oy + h / 2 - 40,
                    font: Font::F3,
                    text: "^ TOP ^".into(),
                });
                // edge rules need 10 dots of margin on each side
                let rule_width = (w - 20).max(0) as u32;
                if rule_width > 0 {
                    for y in [oy + 40, oy + h - 20] {
                        label.push(Element::Bar {
                            x: ox + 10,
                            y,
                            width: rule_width,
                            height: 2,
                        });
                    }
                }
            }
        }
        label
    }

    pub fn stream(self, profile: &PrinterProfile) -> PrintResult<CommandStream> {
        compose_label(profile, &self.label(profile))
    }
}

/// Media control actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedAction {
    /// Advance one label length
    #[default]
    Feed,
    /// Return to the start of the next label
    Reset,
    /// Measure label and gap length
    Calibrate,
}

impl FeedAction {
    pub fn name(self) -> &'static str {
        match self {
            FeedAction::Feed => "feed",
            FeedAction::Reset => "reset",
            FeedAction::Calibrate => "calibrate",
        }
    }

    pub fn stream(self, profile: &PrinterProfile) -> CommandStream {
        let mut b = TsplBuilder::new();
        b.size(profile.label_width_mm, profile.label_height_mm)
            .gap(profile.gap);
        match self {
            FeedAction::Feed => {
                b.feed(profile.height_dots());
            }
            FeedAction::Reset => {
                b.home().cls().print(1, 1);
            }
            FeedAction::Calibrate => {
                b.gap_detect();
            }
        }
        b.build()
    }
}
