//! Drawing the network.
//!
//! ```text
//!   AdjacencyGraph + EmbeddingPositions (+ groups, target)
//!        │
//!        ▼
//!   NetworkPlotter::scene ──► Scene ──┬─► raster (.png)
//!                                     └─► svg    (.svg)
//! ```
//!
//! The interactive viewer draws the same [`Scene`] with egui_plot.

pub mod raster;
pub mod scene;
pub mod svg;
pub mod text;

use std::path::Path;

use crate::error::{CorrelNetError, Result};

pub use scene::{shorten_label, NetworkPlotter, PlotOptions, Scene, SceneNode, SceneSegment};

/// Write `scene` to `path`; the extension (`png` or `svg`) picks the format.
pub fn render(scene: &Scene, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => raster::save_png(scene, path)?,
        "svg" => svg::save_svg(scene, path)?,
        other => {
            return Err(CorrelNetError::InvalidParameter {
                name: "output",
                reason: format!("unsupported image format '{other}' (expected png or svg)"),
            })
        }
    }
    log::info!(
        "wrote {} nodes and {} edges to {}",
        scene.nodes.len(),
        scene.segments.len(),
        path.display()
    );
    Ok(())
}
