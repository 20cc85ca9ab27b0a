use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use correlnet::data::loader::{load_file, load_groups, LoadOptions};
use correlnet::{Correction, CorrelationMethod, EmbeddingKind};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – pipeline settings
// ---------------------------------------------------------------------------

/// Render the left settings panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Network");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            correlation_settings(ui, state);
            ui.separator();
            layout_settings(ui, state);
            ui.separator();
            style_settings(ui, state);
            ui.separator();
            summary(ui, state);
        });
}

fn correlation_settings(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Correlation");

    let mut rebuild = false;
    egui::ComboBox::from_label("method")
        .selected_text(state.config.method.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for method in CorrelationMethod::ALL {
                rebuild |= ui
                    .selectable_value(&mut state.config.method, method, method.as_str())
                    .changed();
            }
        });
    egui::ComboBox::from_label("correction")
        .selected_text(state.config.correction.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for correction in Correction::ALL {
                rebuild |= ui
                    .selectable_value(&mut state.config.correction, correction, correction.as_str())
                    .changed();
            }
        });

    let columns = state.column_names();
    let current = state.target_column.clone();
    let mut target_choice = current.clone();
    egui::ComboBox::from_label("target")
        .selected_text(current.as_deref().unwrap_or("(none)"))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut target_choice, None, "(none)");
            for col in &columns {
                ui.selectable_value(&mut target_choice, Some(col.clone()), col);
            }
        });

    if target_choice != current {
        state.set_target_column(target_choice);
    } else if rebuild {
        state.rebuild();
    }

    let mut alpha = state.config.alpha;
    if ui
        .add(
            egui::Slider::new(&mut alpha, 1e-6..=1.0)
                .logarithmic(true)
                .text("alpha"),
        )
        .changed()
    {
        state.set_alpha(alpha);
    }
}

fn layout_settings(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Layout");

    let mut reembed = false;
    egui::ComboBox::from_label("positions")
        .selected_text(state.config.embedding.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in EmbeddingKind::ALL {
                reembed |= ui
                    .selectable_value(&mut state.config.embedding, kind, kind.as_str())
                    .changed();
            }
        });

    if state.config.embedding != EmbeddingKind::Random {
        reembed |= ui
            .add(
                egui::DragValue::new(&mut state.config.tsne.perplexity)
                    .range(1.0..=100.0)
                    .speed(0.5)
                    .prefix("perplexity "),
            )
            .changed();
    }
    match state.config.embedding {
        EmbeddingKind::VarTsne => {
            reembed |= ui.checkbox(&mut state.config.standardize, "standardize").changed();
        }
        EmbeddingKind::CorrelTsne => {
            reembed |= ui.checkbox(&mut state.config.use_abs, "absolute correlations").changed();
        }
        EmbeddingKind::Random => {}
    }

    ui.horizontal(|ui: &mut Ui| {
        let mut fixed = state.config.seed.is_some();
        if ui.checkbox(&mut fixed, "seed").changed() {
            state.config.seed = fixed.then_some(19);
            reembed = true;
        }
        if let Some(seed) = &mut state.config.seed {
            reembed |= ui.add(egui::DragValue::new(seed)).changed();
        }
    });
    if ui.button("Shuffle layout").clicked() {
        state.config.seed = state.config.seed.map(|s| s.wrapping_add(1));
        reembed = true;
    }

    if reembed {
        state.reembed();
    }
}

fn style_settings(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Style");

    let plot = &mut state.config.plot;
    let mut changed = ui.checkbox(&mut plot.annotate_labels, "labels").changed();

    let mut shorten = plot.max_label_len.is_some();
    if ui.checkbox(&mut shorten, "shorten labels").changed() {
        plot.max_label_len = shorten.then_some(5);
        changed = true;
    }
    if let Some(len) = &mut plot.max_label_len {
        changed |= ui
            .add(egui::DragValue::new(len).range(1..=40).prefix("max length "))
            .changed();
    }
    changed |= ui
        .add(egui::Slider::new(&mut plot.node_radius, 2.0..=20.0).text("node size"))
        .changed();

    if changed {
        state.restyle();
    }
}

fn summary(ui: &mut Ui, state: &AppState) {
    let Some(net) = &state.network else {
        return;
    };
    let graph = net.graph();
    ui.label(format!(
        "{} variables, {} edges",
        graph.n_nodes(),
        graph.n_edges()
    ));
    let undefined = net.correlations().undefined_pairs().len();
    if undefined > 0 {
        ui.label(
            RichText::new(format!("{undefined} undefined correlation(s)"))
                .color(Color32::from_rgb(200, 120, 0)),
        );
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Load groups…").clicked() {
                open_groups_dialog(state);
                ui.close_menu();
            }
            if state.groups.is_some() && ui.button("Clear groups").clicked() {
                state.set_groups(None);
                ui.close_menu();
            }
            ui.separator();
            let has_network = state.network.is_some();
            if ui
                .add_enabled(has_network, egui::Button::new("Export image…"))
                .clicked()
            {
                export_dialog(state, Export::Image);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_network, egui::Button::new("Export edges…"))
                .clicked()
            {
                export_dialog(state, Export::Edges);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_network, egui::Button::new("Export JSON…"))
                .clicked()
            {
                export_dialog(state, Export::Json);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(path)) = (&state.dataset, &state.source) {
            ui.label(format!(
                "{}: {} variables × {} observations",
                path.display(),
                ds.n_vars(),
                ds.n_obs()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match load_file(&path, &LoadOptions::default()) {
            Ok(dataset) => state.set_dataset(dataset, Some(path)),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn open_groups_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open variable groups")
        .add_filter("Groups", &["csv", "json"])
        .pick_file();

    if let Some(path) = file {
        match load_groups(&path) {
            Ok(groups) => state.set_groups(Some(groups)),
            Err(e) => {
                log::error!("Failed to load groups: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Export {
    Image,
    Edges,
    Json,
}

fn export_dialog(state: &mut AppState, kind: Export) {
    let Some(net) = &state.network else {
        return;
    };
    let dialog = rfd::FileDialog::new().set_title("Export");
    let dialog = match kind {
        Export::Image => dialog
            .add_filter("PNG", &["png"])
            .add_filter("SVG", &["svg"])
            .set_file_name("correlnet.png"),
        Export::Edges => dialog.add_filter("CSV", &["csv"]).set_file_name("edges.csv"),
        Export::Json => dialog.add_filter("JSON", &["json"]).set_file_name("network.json"),
    };
    let Some(path): Option<PathBuf> = dialog.save_file() else {
        return;
    };

    let result = match kind {
        Export::Image => net.plot(&path),
        Export::Edges => net.save_edge_list(&path),
        Export::Json => net.save_json(&path),
    };
    state.status_message = result.err().map(|e| {
        log::error!("Export failed: {e}");
        format!("Error: {e}")
    });
}
