//! SVG back end: the same scene as the PNG, as a vector document.

use std::fmt::Write as _;
use std::path::Path;

use crate::color::{hex, Color, DivergingMap, Marker};
use crate::error::Result;

use super::scene::{ColorBar, Scene, Viewport, MARGIN, SIDE_PANEL};

const OUTLINE: &str = "#3c3c3c";
const BAR_WIDTH: f64 = 16.0;
const GRADIENT_STOPS: usize = 11;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn marker_element(out: &mut String, marker: Marker, (x, y): (f64, f64), r: f64, color: Color) {
    let fill = hex(color);
    let style = format!(r#"fill="{fill}" stroke="{OUTLINE}" stroke-width="1""#);
    let _ = match marker {
        Marker::Circle => writeln!(out, r#"<circle cx="{x:.2}" cy="{y:.2}" r="{r:.2}" {style}/>"#),
        Marker::Square => {
            let s = r * 0.9;
            writeln!(
                out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {style}/>"#,
                x - s,
                y - s,
                2.0 * s,
                2.0 * s
            )
        }
        Marker::Diamond => {
            let s = r * 0.9 * std::f64::consts::SQRT_2;
            writeln!(
                out,
                r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" {style}/>"#,
                x, y - s, x + s, y, x, y + s, x - s, y
            )
        }
        Marker::Triangle => {
            let c = 1.2 * r;
            let half = c * 0.866_025_403_784_438_6;
            writeln!(
                out,
                r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" {style}/>"#,
                x, y - c, x + half, y + c / 2.0, x - half, y + c / 2.0
            )
        }
    };
}

fn colorbar(out: &mut String, id: &str, bar: &ColorBar, (x, y): (f64, f64), height: f64) {
    let _ = writeln!(
        out,
        r#"<defs><linearGradient id="{id}" x1="0" y1="1" x2="0" y2="0">"#
    );
    for k in 0..GRADIENT_STOPS {
        let t = k as f64 / (GRADIENT_STOPS - 1) as f64;
        let _ = writeln!(
            out,
            r#"<stop offset="{t:.2}" stop-color="{}"/>"#,
            hex(DivergingMap::at(t as f32))
        );
    }
    let _ = writeln!(out, "</linearGradient></defs>");
    let _ = writeln!(
        out,
        r#"<rect x="{x:.2}" y="{y:.2}" width="{BAR_WIDTH}" height="{height:.2}" fill="url(#{id})" stroke="{OUTLINE}" stroke-width="0.5"/>"#
    );
    let _ = writeln!(
        out,
        r#"<text x="{x:.2}" y="{:.2}" font-size="12">{}</text>"#,
        y - 6.0,
        escape(&bar.label)
    );
    let h = bar.map.halfrange;
    for (value, ty) in [(h, y), (0.0, y + height / 2.0), (-h, y + height)] {
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" font-size="10" dominant-baseline="middle">{value:.2}</text>"#,
            x + BAR_WIDTH + 4.0,
            ty
        );
    }
}

/// Serialise `scene` as a standalone SVG document.
pub fn to_svg(scene: &Scene) -> String {
    let vp = Viewport::fit(scene);
    let (w, h) = (scene.width, scene.height);
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#
    );
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);

    if let Some(title) = &scene.title {
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" font-size="18" text-anchor="middle">{}</text>"#,
            (w as f64 - SIDE_PANEL) / 2.0,
            MARGIN * 0.75,
            escape(title)
        );
    }

    let _ = writeln!(out, r#"<g stroke-linecap="round">"#);
    for seg in &scene.segments {
        let (x1, y1) = vp.to_pixel(seg.from);
        let (x2, y2) = vp.to_pixel(seg.to);
        let _ = writeln!(
            out,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}" stroke-width="{:.2}" stroke-opacity="{:.3}"/>"#,
            hex(seg.color),
            seg.width,
            seg.opacity
        );
    }
    let _ = writeln!(out, "</g>");

    for node in &scene.nodes {
        let p = vp.to_pixel(node.pos);
        let _ = writeln!(out, "<g><title>{}</title>", escape(&node.name));
        marker_element(&mut out, node.marker, p, node.radius as f64, node.color);
        let _ = writeln!(out, "</g>");
    }

    if scene.annotate_labels {
        for node in &scene.nodes {
            let (x, y) = vp.to_pixel(node.pos);
            let r = node.radius as f64;
            let _ = writeln!(
                out,
                r#"<text x="{:.2}" y="{:.2}" font-size="11">{}</text>"#,
                x + r + 2.0,
                y - r,
                escape(&node.label)
            );
        }
    }

    let x = w as f64 - SIDE_PANEL - MARGIN / 2.0 + 20.0;
    let mut y = MARGIN;
    let bar_height = (h as f64 - 2.0 * MARGIN).min(240.0) / 2.0;
    for (id, bar) in [("edge-scale", &scene.edge_colorbar), ("node-scale", &scene.node_colorbar)] {
        if let Some(bar) = bar {
            colorbar(&mut out, id, bar, (x, y + 12.0), bar_height);
            y += bar_height + MARGIN;
        }
    }

    for entry in &scene.legend {
        marker_element(&mut out, entry.marker, (x + BAR_WIDTH / 2.0, y), 6.0, entry.color);
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{y:.2}" font-size="11" dominant-baseline="middle">{}</text>"#,
            x + BAR_WIDTH + 6.0,
            escape(&entry.label)
        );
        y += 22.0;
    }

    out.push_str("</svg>\n");
    out
}

pub fn save_svg(scene: &Scene, path: &Path) -> Result<()> {
    std::fs::write(path, to_svg(scene))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::scene::{LegendEntry, SceneNode};

    fn scene() -> Scene {
        Scene {
            title: Some("Liver & <kidney>".into()),
            width: 400,
            height: 300,
            annotate_labels: true,
            nodes: vec![SceneNode {
                name: "albumin".into(),
                label: "album.".into(),
                pos: [0.0, 0.0],
                color: Color::new(10, 20, 30),
                marker: Marker::Triangle,
                radius: 6.0,
            }],
            segments: Vec::new(),
            legend: vec![LegendEntry {
                label: "blood".into(),
                color: Color::new(1, 2, 3),
                marker: Marker::Diamond,
            }],
            edge_colorbar: None,
            node_colorbar: Some(ColorBar {
                label: "target correlation".into(),
                map: DivergingMap { halfrange: 0.5 },
            }),
        }
    }

    #[test]
    fn text_is_escaped_and_present() {
        let svg = to_svg(&scene());
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Liver &amp; &lt;kidney&gt;"));
        assert!(svg.contains(">album.</text>"));
        assert!(svg.contains("<title>albumin</title>"));
        assert!(svg.contains(">blood</text>"));
        assert!(svg.contains("#0a141e"));
        assert!(svg.contains("url(#node-scale)"));
        assert!(!svg.contains("edge-scale"));
    }

    #[test]
    fn labels_can_be_hidden() {
        let mut scene = scene();
        scene.annotate_labels = false;
        assert!(!to_svg(&scene).contains(">album.</text>"));
    }
}
