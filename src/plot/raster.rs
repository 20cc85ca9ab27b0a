//! Anti-aliased PNG rasteriser for a [`Scene`].
//!
//! Shapes are drawn by coverage: each pixel near a shape gets the shape's
//! colour blended in proportion to how far inside the edge its centre lies.
//! Text goes through [`TextPainter`] and is laid out like the SVG output.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::color::{Color, DivergingMap, Marker};
use crate::error::{CorrelNetError, Result};

use super::scene::{ColorBar, Scene, Viewport, MARGIN, SIDE_PANEL};
use super::text::{Align, TextPainter};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Color = Color::new(60, 60, 60);
const TEXT: Color = Color::new(30, 30, 30);
const BAR_WIDTH: f64 = 16.0;

/// Rasterise `scene` into an RGBA image.
pub fn rasterize(scene: &Scene) -> Result<RgbaImage> {
    let text = TextPainter::new()?;
    let mut img = RgbaImage::from_pixel(scene.width.max(1), scene.height.max(1), BACKGROUND);
    let vp = Viewport::fit(scene);

    if let Some(title) = &scene.title {
        let anchor = ((scene.width as f64 - SIDE_PANEL) / 2.0, MARGIN * 0.75);
        draw_text(&mut img, &text, title, anchor, 18.0, Align::Center);
    }

    for seg in &scene.segments {
        let a = vp.to_pixel(seg.from);
        let b = vp.to_pixel(seg.to);
        draw_segment(&mut img, a, b, seg.width as f64, seg.color, seg.opacity);
    }

    for node in &scene.nodes {
        let c = vp.to_pixel(node.pos);
        let r = node.radius as f64;
        draw_marker(&mut img, c, r + 1.0, node.marker, OUTLINE, 1.0);
        draw_marker(&mut img, c, r, node.marker, node.color, 1.0);
    }

    if scene.annotate_labels {
        for node in &scene.nodes {
            let (x, y) = vp.to_pixel(node.pos);
            let r = node.radius as f64;
            draw_text(&mut img, &text, &node.label, (x + r + 2.0, y - r), 11.0, Align::Left);
        }
    }

    let x = scene.width as f64 - SIDE_PANEL - MARGIN / 2.0 + 20.0;
    let mut y = MARGIN;
    let bar_height = (scene.height as f64 - 2.0 * MARGIN).min(240.0) / 2.0;
    for bar in [&scene.edge_colorbar, &scene.node_colorbar].into_iter().flatten() {
        draw_colorbar(&mut img, &text, bar, (x, y + 12.0), bar_height);
        y += bar_height + MARGIN;
    }

    for entry in &scene.legend {
        if y > scene.height as f64 - MARGIN {
            break;
        }
        draw_marker(&mut img, (x + BAR_WIDTH / 2.0, y), 7.0, entry.marker, OUTLINE, 1.0);
        draw_marker(&mut img, (x + BAR_WIDTH / 2.0, y), 6.0, entry.marker, entry.color, 1.0);
        let baseline = text.middle_baseline(y, 11.0);
        draw_text(&mut img, &text, &entry.label, (x + BAR_WIDTH + 6.0, baseline), 11.0, Align::Left);
        y += 22.0;
    }
    Ok(img)
}

/// Rasterise `scene` and write it as PNG.
pub fn save_png(scene: &Scene, path: &Path) -> Result<()> {
    rasterize(scene)?
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| CorrelNetError::Render(format!("{}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

fn blend(img: &mut RgbaImage, x: i64, y: i64, color: Color, alpha: f64) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 || alpha <= 0.0 {
        return;
    }
    let alpha = alpha.min(1.0);
    let px = img.get_pixel_mut(x as u32, y as u32);
    let mix = |bg: u8, fg: u8| (bg as f64 * (1.0 - alpha) + fg as f64 * alpha).round() as u8;
    px.0 = [
        mix(px.0[0], color.red),
        mix(px.0[1], color.green),
        mix(px.0[2], color.blue),
        255,
    ];
}

/// Visit every pixel centre in the box `[x0, x1] x [y0, y1]`.
fn for_pixels(
    img: &mut RgbaImage,
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    mut f: impl FnMut(&mut RgbaImage, i64, i64, f64, f64),
) {
    let (w, h) = (img.width() as f64, img.height() as f64);
    let xs = x0.floor().max(0.0) as i64..=x1.ceil().min(w - 1.0) as i64;
    let ys = y0.floor().max(0.0) as i64..=y1.ceil().min(h - 1.0) as i64;
    for py in ys {
        for px in xs.clone() {
            f(img, px, py, px as f64 + 0.5, py as f64 + 0.5);
        }
    }
}

fn draw_text(img: &mut RgbaImage, text: &TextPainter, s: &str, at: (f64, f64), size: f32, align: Align) {
    text.draw(s, at, size, align, |x, y, coverage| blend(img, x, y, TEXT, coverage));
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

fn draw_segment(img: &mut RgbaImage, a: (f64, f64), b: (f64, f64), width: f64, color: Color, opacity: f32) {
    let half = width.max(0.5) / 2.0;
    let pad = half + 1.0;
    for_pixels(
        img,
        a.0.min(b.0) - pad,
        a.0.max(b.0) + pad,
        a.1.min(b.1) - pad,
        a.1.max(b.1) + pad,
        |img, px, py, cx, cy| {
            let coverage = (half + 0.5 - distance_to_segment((cx, cy), a, b)).clamp(0.0, 1.0);
            blend(img, px, py, color, coverage * opacity as f64);
        },
    );
}

/// Signed distance from `p` to the marker outline (negative inside).
fn marker_distance(marker: Marker, p: (f64, f64), c: (f64, f64), r: f64) -> f64 {
    let (dx, dy) = (p.0 - c.0, p.1 - c.1);
    match marker {
        Marker::Circle => (dx * dx + dy * dy).sqrt() - r,
        Marker::Square => dx.abs().max(dy.abs()) - r * 0.9,
        Marker::Diamond => (dx.abs() + dy.abs()) / std::f64::consts::SQRT_2 - r * 0.9,
        Marker::Triangle => {
            // Upward equilateral triangle with circumradius 1.2 r; y grows downward.
            let inradius = 0.6 * r;
            let normals = [(0.0, 1.0), (0.866_025_403_784_438_6, -0.5), (-0.866_025_403_784_438_6, -0.5)];
            normals
                .iter()
                .map(|(nx, ny)| dx * nx + dy * ny - inradius)
                .fold(f64::NEG_INFINITY, f64::max)
        }
    }
}

fn draw_marker(img: &mut RgbaImage, c: (f64, f64), r: f64, marker: Marker, color: Color, opacity: f64) {
    let pad = r * 1.3 + 1.0;
    for_pixels(img, c.0 - pad, c.0 + pad, c.1 - pad, c.1 + pad, |img, px, py, x, y| {
        let coverage = (0.5 - marker_distance(marker, (x, y), c, r)).clamp(0.0, 1.0);
        blend(img, px, py, color, coverage * opacity);
    });
}

/// Vertical gradient, warm end on top, with a tick at zero, its label above
/// and the range printed alongside.
fn draw_colorbar(img: &mut RgbaImage, text: &TextPainter, bar: &ColorBar, (x, y): (f64, f64), height: f64) {
    let rows = height.max(1.0) as i64;
    for k in 0..rows {
        let t = 1.0 - k as f64 / (rows - 1).max(1) as f64;
        let color = DivergingMap::at(t as f32);
        for dx in 0..BAR_WIDTH as i64 {
            blend(img, x as i64 + dx, y as i64 + k, color, 1.0);
        }
    }
    let zero = y + height * (1.0 - bar.map.normalize(0.0));
    for dx in -3..(BAR_WIDTH as i64 + 3) {
        blend(img, x as i64 + dx, zero as i64, OUTLINE, 1.0);
    }

    draw_text(img, text, &bar.label, (x, y - 6.0), 12.0, Align::Left);
    let h = bar.map.halfrange;
    for (value, ty) in [(h, y), (0.0, y + height / 2.0), (-h, y + height)] {
        let baseline = text.middle_baseline(ty, 10.0);
        let tick = format!("{value:.2}");
        draw_text(img, text, &tick, (x + BAR_WIDTH + 4.0, baseline), 10.0, Align::Left);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::scene::{SceneNode, SceneSegment};

    fn scene() -> Scene {
        let node = |name: &str, pos| SceneNode {
            name: name.to_string(),
            label: name.to_string(),
            pos,
            color: Color::new(200, 0, 0),
            marker: Marker::Square,
            radius: 6.0,
        };
        Scene {
            title: None,
            width: 300,
            height: 200,
            annotate_labels: false,
            nodes: vec![node("a", [0.0, 0.0]), node("b", [1.0, 1.0])],
            segments: vec![SceneSegment {
                from: [0.0, 0.0],
                to: [1.0, 1.0],
                statistic: 0.9,
                color: Color::new(0, 0, 200),
                width: 3.0,
                opacity: 1.0,
            }],
            legend: Vec::new(),
            edge_colorbar: Some(ColorBar {
                label: "pearson".into(),
                map: DivergingMap { halfrange: 1.0 },
            }),
            node_colorbar: None,
        }
    }

    #[test]
    fn nodes_and_edges_are_painted() {
        let scene = scene();
        let img = rasterize(&scene).unwrap();
        assert_eq!(img.dimensions(), (300, 200));

        let vp = Viewport::fit(&scene);
        let (x, y) = vp.to_pixel([0.0, 0.0]);
        assert_eq!(img.get_pixel(x as u32, y as u32).0, [200, 0, 0, 255]);

        let (x, y) = vp.to_pixel([0.5, 0.5]);
        let mid = img.get_pixel(x as u32, y as u32).0;
        assert!(mid[2] > mid[0], "edge pixel {mid:?}");

        assert_eq!(img.get_pixel(0, 0).0, BACKGROUND.0);
    }

    fn inked(img: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0 != BACKGROUND.0)
            .count()
    }

    #[test]
    fn title_is_drawn_above_the_network() {
        let mut scene = scene();
        assert_eq!(inked(&rasterize(&scene).unwrap(), 20..140, 8..32), 0);

        scene.title = Some("Network".into());
        assert!(inked(&rasterize(&scene).unwrap(), 20..140, 8..32) > 20);
    }

    #[test]
    fn labels_and_colorbar_text_are_drawn() {
        let mut scene = scene();
        let plain = rasterize(&scene).unwrap();
        scene.annotate_labels = true;
        let labelled = rasterize(&scene).unwrap();
        assert!(plain.pixels().zip(labelled.pixels()).any(|(a, b)| a != b));

        // the colour bar label sits above the gradient
        let x = (300.0 - SIDE_PANEL - MARGIN / 2.0 + 20.0) as u32;
        let y = MARGIN as u32;
        assert!(inked(&plain, x..x + 40, y - 4..y + 6) > 0);
    }

    #[test]
    fn marker_shapes_differ() {
        let c = (0.0, 0.0);
        // corner of the bounding square
        let p = (4.0, 4.0);
        assert!(marker_distance(Marker::Square, p, c, 5.0) < 0.0);
        assert!(marker_distance(Marker::Circle, p, c, 5.0) > 0.0);
        assert!(marker_distance(Marker::Diamond, p, c, 5.0) > 0.0);
        assert!(marker_distance(Marker::Triangle, (0.0, 0.0), c, 5.0) < 0.0);
    }

    #[test]
    fn png_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.png");
        save_png(&scene(), &path).unwrap();
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.width(), 300);
    }
}
