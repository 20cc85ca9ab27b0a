use std::path::PathBuf;

use correlnet::data::filter::split_target;
use correlnet::{correlnet, CorrelNet, Dataset, NetworkConfig, VariableGroups};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset, target column included (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Where the dataset came from, shown in the top bar.
    pub source: Option<PathBuf>,

    /// Optional variable → group labels.
    pub groups: Option<VariableGroups>,

    /// Column split off as the target and used to colour nodes.
    pub target_column: Option<String>,

    /// Pipeline settings edited by the side panel.
    pub config: NetworkConfig,

    /// The computed network for the current settings.
    pub network: Option<CorrelNet>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

}

impl Default for AppState {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

impl AppState {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            dataset: None,
            source: None,
            groups: None,
            target_column: None,
            config,
            network: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and compute its network.
    pub fn set_dataset(&mut self, dataset: Dataset, source: Option<PathBuf>) {
        if let Some(col) = &self.target_column {
            if dataset.index_of(col).is_none() {
                self.target_column = None;
            }
        }
        self.dataset = Some(dataset);
        self.source = source;
        self.rebuild();
    }

    pub fn set_groups(&mut self, groups: Option<VariableGroups>) {
        self.groups = groups;
        self.rebuild();
    }

    pub fn set_target_column(&mut self, column: Option<String>) {
        self.target_column = column;
        self.rebuild();
    }

    /// Recompute correlations, filter and layout from scratch.
    pub fn rebuild(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.network = None;
            return;
        };
        let result = match &self.target_column {
            Some(col) => split_target(dataset.clone(), col).and_then(|(ds, target)| {
                correlnet(ds, Some(&target), self.groups.clone(), &self.config)
            }),
            None => correlnet(dataset.clone(), None, self.groups.clone(), &self.config),
        };
        match result {
            Ok(net) => {
                self.network = Some(net);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to build network: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.network = None;
            }
        }
    }

    /// Re-run only the significance filter.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.config.alpha = alpha;
        if let Some(net) = &mut self.network {
            if let Err(e) = net.set_alpha(alpha) {
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Recompute only the layout.
    pub fn reembed(&mut self) {
        let embedder = self.config.embedder();
        if let Some(net) = &mut self.network {
            match net.set_embedder(embedder) {
                Ok(()) => self.status_message = None,
                Err(e) => self.status_message = Some(format!("Error: {e}")),
            }
        }
    }

    /// Push the plot options into the current network.
    pub fn restyle(&mut self) {
        if let Some(net) = self.network.take() {
            self.network = Some(net.with_plot_options(self.config.plot.clone()));
        }
    }

    /// Variables available as target: all loaded columns.
    pub fn column_names(&self) -> Vec<String> {
        self.dataset
            .as_ref()
            .map(|ds| ds.names().to_vec())
            .unwrap_or_default()
    }
}
