//! Text for the PNG back end.
//!
//! Glyphs come from egui's bundled proportional font and are rasterised with
//! `ab_glyph`, the same rasteriser the viewer uses.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use eframe::egui::{FontDefinitions, FontFamily};

use crate::error::{CorrelNetError, Result};

/// Horizontal placement of a run relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Lays out and rasterises single lines of text.
#[derive(Clone)]
pub struct TextPainter {
    font: FontArc,
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPainter").finish_non_exhaustive()
    }
}

impl TextPainter {
    /// Load the first proportional font of egui's default font set.
    pub fn new() -> Result<Self> {
        let defs = FontDefinitions::default();
        let data = defs
            .families
            .get(&FontFamily::Proportional)
            .and_then(|names| names.first())
            .and_then(|name| defs.font_data.get(name))
            .ok_or_else(|| CorrelNetError::Render("no proportional font available".into()))?;
        let font = FontArc::try_from_vec(data.font.to_vec())
            .map_err(|e| CorrelNetError::Render(format!("font: {e}")))?;
        Ok(Self { font })
    }

    /// Advance width of `text` in pixels.
    pub fn width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    /// Rasterise `text` with its baseline at `y`.
    ///
    /// `plot` receives pixel coordinates and a coverage in `[0, 1]`.
    pub fn draw(
        &self,
        text: &str,
        (x, y): (f64, f64),
        size: f32,
        align: Align,
        mut plot: impl FnMut(i64, i64, f64),
    ) {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);
        let mut caret = match align {
            Align::Left => x as f32,
            Align::Center => x as f32 - self.width(text, size) / 2.0,
        };
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, y as f32));
            caret += scaled.h_advance(id);
            prev = Some(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let min = outlined.px_bounds().min;
                outlined.draw(|gx, gy, coverage| {
                    plot(
                        min.x as i64 + gx as i64,
                        min.y as i64 + gy as i64,
                        coverage as f64,
                    );
                });
            }
        }
    }

    /// Baseline that vertically centres a line of `size` pixels on `y`.
    pub fn middle_baseline(&self, y: f64, size: f32) -> f64 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        // ascent is positive, descent negative
        y + ((scaled.ascent() + scaled.descent()) / 2.0) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_strings_measure_wider() {
        let painter = TextPainter::new().unwrap();
        let short = painter.width("ab", 12.0);
        let long = painter.width("abcdef", 12.0);
        assert!(short > 0.0);
        assert!(long > short);
        assert!(painter.width("ab", 24.0) > short);
    }

    #[test]
    fn glyphs_cover_pixels_near_the_baseline() {
        let painter = TextPainter::new().unwrap();
        let mut hits = Vec::new();
        painter.draw("Hx", (10.0, 30.0), 16.0, Align::Left, |x, y, c| {
            if c > 0.5 {
                hits.push((x, y));
            }
        });
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|&(x, y)| (10..40).contains(&x) && (14..=31).contains(&y)));
    }

    #[test]
    fn centred_text_straddles_the_anchor() {
        let painter = TextPainter::new().unwrap();
        let (mut lo, mut hi) = (i64::MAX, i64::MIN);
        painter.draw("network", (100.0, 50.0), 14.0, Align::Center, |x, _, c| {
            if c > 0.0 {
                lo = lo.min(x);
                hi = hi.max(x);
            }
        });
        assert!(lo < 100 && hi > 100);
    }
}
