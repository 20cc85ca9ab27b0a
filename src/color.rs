use std::collections::BTreeMap;

use palette::{FromColor, Hsl, IntoColor, Lab, Mix, Srgb};
use serde::{Deserialize, Serialize};

/// An 8-bit sRGB colour.
pub type Color = Srgb<u8>;

/// Colour for nodes when neither groups nor a target are given.
pub const DEFAULT_NODE_COLOR: Color = Srgb::new(31, 119, 180);

/// Colour for nodes whose value is undefined.
pub const UNDEFINED_COLOR: Color = Srgb::new(160, 160, 160);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Node markers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
}

impl Marker {
    const CYCLE: [Marker; 4] = [Marker::Circle, Marker::Square, Marker::Triangle, Marker::Diamond];

    /// The i-th marker, wrapping around.
    pub fn nth(i: usize) -> Marker {
        Self::CYCLE[i % Self::CYCLE.len()]
    }
}

// ---------------------------------------------------------------------------
// Group styling: group label → colour / marker
// ---------------------------------------------------------------------------

/// Maps the distinct group labels to distinct colours and markers.
#[derive(Debug, Clone)]
pub struct GroupStyle {
    mapping: BTreeMap<String, (Color, Marker)>,
    default_color: Color,
}

impl GroupStyle {
    /// Build the style from the distinct group labels (sorted order).
    pub fn new<'a>(groups: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = groups.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .enumerate()
            .map(|(i, (label, color))| (label.to_string(), (color, Marker::nth(i))))
            .collect();

        GroupStyle {
            mapping,
            default_color: UNDEFINED_COLOR,
        }
    }

    pub fn color_for(&self, group: &str) -> Color {
        self.mapping
            .get(group)
            .map(|(c, _)| *c)
            .unwrap_or(self.default_color)
    }

    pub fn marker_for(&self, group: &str) -> Marker {
        self.mapping
            .get(group)
            .map(|(_, m)| *m)
            .unwrap_or_default()
    }

    /// Return the legend entries (group label → colour, marker).
    pub fn legend_entries(&self) -> Vec<(String, Color, Marker)> {
        self.mapping
            .iter()
            .map(|(label, (c, m))| (label.clone(), *c, *m))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Diverging colour map for signed values
// ---------------------------------------------------------------------------

/// Blue → light grey → red, interpolated in Lab, centred at 0.
///
/// `halfrange` is the absolute value mapped to the ends of the scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergingMap {
    pub halfrange: f64,
}

const COOL: (u8, u8, u8) = (59, 76, 192);
const NEUTRAL: (u8, u8, u8) = (221, 221, 221);
const WARM: (u8, u8, u8) = (180, 4, 38);

impl DivergingMap {
    /// A map whose half range covers the largest absolute finite value.
    pub fn centered(values: impl IntoIterator<Item = f64>) -> Self {
        let halfrange = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        DivergingMap {
            halfrange: if halfrange > 0.0 { halfrange } else { 1.0 },
        }
    }

    /// Position of `value` on the scale, in [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        (0.5 + value / (2.0 * self.halfrange)).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> Color {
        if value.is_nan() {
            return UNDEFINED_COLOR;
        }
        Self::at(self.normalize(value) as f32)
    }

    /// Colour at scale position `t` in [0, 1].
    pub fn at(t: f32) -> Color {
        let lab = |(r, g, b): (u8, u8, u8)| -> Lab {
            Lab::from_color(Srgb::new(r, g, b).into_format::<f32>())
        };
        let t = t.clamp(0.0, 1.0);
        let mixed = if t < 0.5 {
            lab(COOL).mix(lab(NEUTRAL), t * 2.0)
        } else {
            lab(NEUTRAL).mix(lab(WARM), (t - 0.5) * 2.0)
        };
        Srgb::<f32>::from_color(mixed).into_format()
    }
}

/// `#rrggbb` for SVG output.
pub fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}
