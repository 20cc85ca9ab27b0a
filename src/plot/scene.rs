use serde::{Deserialize, Serialize};

use crate::color::{Color, DivergingMap, GroupStyle, Marker, DEFAULT_NODE_COLOR};
use crate::data::VariableGroups;
use crate::embed::EmbeddingPositions;
use crate::error::{CorrelNetError, Result};
use crate::network::AdjacencyGraph;
use crate::stats::TargetCorrelation;

/// Rendering options shared by all back ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    /// Draw node labels (vector and interactive output).
    pub annotate_labels: bool,
    /// Shorten labels to this many characters plus "."; `None` keeps them whole.
    pub max_label_len: Option<usize>,
    pub node_radius: f32,
    pub min_edge_width: f32,
    pub max_edge_width: f32,
    /// Show the colour bar for edge coefficients.
    pub edge_colorbar: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            width: 1000,
            height: 800,
            title: Some("Correlation Network".to_string()),
            annotate_labels: true,
            max_label_len: Some(5),
            node_radius: 7.0,
            min_edge_width: 0.5,
            max_edge_width: 4.0,
            edge_colorbar: true,
        }
    }
}

/// A positioned, styled variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub label: String,
    pub pos: [f64; 2],
    pub color: Color,
    pub marker: Marker,
    pub radius: f32,
}

/// A drawn edge; width and opacity grow with |coefficient|.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSegment {
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub statistic: f64,
    pub color: Color,
    pub width: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    pub label: String,
    pub map: DivergingMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub marker: Marker,
}

/// Everything needed to draw the network, in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub annotate_labels: bool,
    pub nodes: Vec<SceneNode>,
    pub segments: Vec<SceneSegment>,
    pub legend: Vec<LegendEntry>,
    pub edge_colorbar: Option<ColorBar>,
    pub node_colorbar: Option<ColorBar>,
}

/// Shorten `label` to `max` characters followed by ".".
pub fn shorten_label(label: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if label.chars().count() > max => {
            let head: String = label.chars().take(max).collect();
            format!("{head}.")
        }
        _ => label.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Plotter
// ---------------------------------------------------------------------------

/// Turns a graph and its positions into a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct NetworkPlotter {
    pub options: PlotOptions,
}

impl NetworkPlotter {
    pub fn new(options: PlotOptions) -> Self {
        NetworkPlotter { options }
    }

    /// Style nodes by target correlation (colour) and/or group (colour or
    /// marker), and edges by coefficient.
    pub fn scene(
        &self,
        graph: &AdjacencyGraph,
        positions: &EmbeddingPositions,
        groups: Option<&VariableGroups>,
        target: Option<&TargetCorrelation>,
        colorbar_label: &str,
    ) -> Result<Scene> {
        let opts = &self.options;
        let nodes_pos = graph
            .nodes()
            .iter()
            .map(|name| positions.get(name))
            .collect::<Option<Vec<[f64; 2]>>>()
            .ok_or_else(|| {
                CorrelNetError::mismatch(
                    "positioned graph nodes",
                    graph.n_nodes(),
                    graph.nodes().iter().filter(|n| positions.get(n).is_some()).count(),
                )
            })?;

        if let Some(groups) = groups {
            groups.ensure_covers(graph.nodes())?;
        }
        if let Some(target) = target {
            target.ensure_covers(graph.nodes())?;
        }

        let group_style = groups.map(|g| GroupStyle::new(g.unique_groups()));
        let target_map = target.map(|t| DivergingMap::centered(t.values().iter().copied()));

        let nodes = graph
            .nodes()
            .iter()
            .zip(&nodes_pos)
            .map(|(name, &pos)| {
                let group = groups.and_then(|g| g.group_of(name));
                let (mut color, marker) = match (group, &group_style) {
                    (Some(group), Some(style)) => (style.color_for(group), style.marker_for(group)),
                    _ => (DEFAULT_NODE_COLOR, Marker::Circle),
                };
                // With a target, groups only pick the marker.
                if let (Some(map), Some(target)) = (&target_map, target) {
                    color = map.color(target.get(name).unwrap_or(f64::NAN));
                }
                SceneNode {
                    name: name.clone(),
                    label: shorten_label(name, opts.max_label_len),
                    pos,
                    color,
                    marker,
                    radius: opts.node_radius,
                }
            })
            .collect();

        let edge_map = DivergingMap::centered(graph.edges().iter().map(|e| e.statistic));
        let segments = graph
            .edges()
            .iter()
            .map(|e| {
                let strength = e.statistic.abs().min(1.0) as f32;
                SceneSegment {
                    from: nodes_pos[e.i],
                    to: nodes_pos[e.j],
                    statistic: e.statistic,
                    color: edge_map.color(e.statistic),
                    width: opts.min_edge_width + strength * (opts.max_edge_width - opts.min_edge_width),
                    opacity: 0.2 + 0.8 * strength,
                }
            })
            .collect();

        let legend = match (&group_style, target) {
            (Some(style), None) => style
                .legend_entries()
                .into_iter()
                .map(|(label, color, marker)| LegendEntry { label, color, marker })
                .collect(),
            (Some(style), Some(_)) => style
                .legend_entries()
                .into_iter()
                .map(|(label, _, marker)| LegendEntry {
                    label,
                    color: DEFAULT_NODE_COLOR,
                    marker,
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Scene {
            title: opts.title.clone(),
            width: opts.width,
            height: opts.height,
            annotate_labels: opts.annotate_labels,
            nodes,
            segments,
            legend,
            edge_colorbar: (opts.edge_colorbar && graph.n_edges() > 0).then(|| ColorBar {
                label: colorbar_label.to_string(),
                map: edge_map,
            }),
            node_colorbar: target_map.map(|map| ColorBar {
                label: "target correlation".to_string(),
                map,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Viewport: data coordinates → pixels
// ---------------------------------------------------------------------------

/// Fits the node bounding box into the drawable area, y pointing up.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    min: [f64; 2],
    scale: f64,
    offset: [f64; 2],
    height: f64,
}

/// Pixels reserved on the right for colour bars and the legend.
pub const SIDE_PANEL: f64 = 140.0;
/// Margin around the plotting area.
pub const MARGIN: f64 = 40.0;

impl Viewport {
    pub fn fit(scene: &Scene) -> Self {
        let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
        for node in &scene.nodes {
            for d in 0..2 {
                min[d] = min[d].min(node.pos[d]);
                max[d] = max[d].max(node.pos[d]);
            }
        }
        if scene.nodes.is_empty() {
            min = [0.0; 2];
            max = [1.0; 2];
        }
        let span = [(max[0] - min[0]).max(1e-9), (max[1] - min[1]).max(1e-9)];

        let top = if scene.title.is_some() { MARGIN * 1.5 } else { MARGIN };
        let avail_w = (scene.width as f64 - 2.0 * MARGIN - SIDE_PANEL).max(1.0);
        let avail_h = (scene.height as f64 - top - MARGIN).max(1.0);
        let scale = (avail_w / span[0]).min(avail_h / span[1]);

        // Centre the drawing in the available area.
        let used = [span[0] * scale, span[1] * scale];
        let offset = [
            MARGIN + (avail_w - used[0]) / 2.0,
            MARGIN + (avail_h - used[1]) / 2.0,
        ];
        Viewport {
            min,
            scale,
            offset,
            height: scene.height as f64,
        }
    }

    pub fn to_pixel(&self, p: [f64; 2]) -> (f64, f64) {
        let x = self.offset[0] + (p[0] - self.min[0]) * self.scale;
        let y = self.height - (self.offset[1] + (p[1] - self.min[1]) * self.scale);
        (x, y)
    }
}
