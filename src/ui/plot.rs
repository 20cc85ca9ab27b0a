use eframe::egui::{Align2, Color32, Ui};
use egui_plot::{Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Text};

use correlnet::color::{Color, Marker};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Network plot (central panel)
// ---------------------------------------------------------------------------

fn color32(c: Color) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

fn marker_shape(marker: Marker) -> MarkerShape {
    match marker {
        Marker::Circle => MarkerShape::Circle,
        Marker::Square => MarkerShape::Square,
        Marker::Triangle => MarkerShape::Up,
        Marker::Diamond => MarkerShape::Diamond,
    }
}

/// Render the network in the central panel.
pub fn network_plot(ui: &mut Ui, state: &AppState) {
    let Some(net) = &state.network else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to draw its correlation network  (File → Open…)");
        });
        return;
    };

    let scene = match net.scene() {
        Ok(scene) => scene,
        Err(e) => {
            ui.label(format!("Error: {e}"));
            return;
        }
    };

    if let Some(title) = &scene.title {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.heading(title);
        });
    }

    Plot::new("network_plot")
        .legend(egui_plot::Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for seg in &scene.segments {
                let c = seg.color;
                let alpha = (seg.opacity * 255.0).round() as u8;
                let line = Line::new(PlotPoints::from(vec![seg.from, seg.to]))
                    .color(Color32::from_rgba_unmultiplied(c.red, c.green, c.blue, alpha))
                    .width(seg.width);
                plot_ui.line(line);
            }

            for node in &scene.nodes {
                // Points sharing a group name share one legend entry.
                let name = net
                    .groups()
                    .and_then(|g| g.group_of(&node.name))
                    .unwrap_or_default();
                let points = Points::new(vec![node.pos])
                    .name(name)
                    .shape(marker_shape(node.marker))
                    .radius(node.radius)
                    .filled(true)
                    .color(color32(node.color));
                plot_ui.points(points);

                if scene.annotate_labels {
                    let text = Text::new(PlotPoint::new(node.pos[0], node.pos[1]), &node.label)
                        .anchor(Align2::LEFT_BOTTOM)
                        .color(Color32::DARK_GRAY);
                    plot_ui.text(text);
                }
            }
        });
}
