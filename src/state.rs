use std::path::{Path, PathBuf};

use crate::data::model::Table;
use crate::session::{self, LoadSettings};
use crate::views::View;
use crate::views::output::ViewOutput;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Session table; replaced wholesale when another file is opened.
    pub dataset: Option<Table>,

    /// File the dataset came from.
    pub source: Option<PathBuf>,

    /// How newly opened files are prepared.
    pub settings: LoadSettings,

    /// Analysis picked in the side panel.
    pub selected: View,

    /// Output of the selected view, or the error that stopped it.
    pub output: Option<Result<ViewOutput, String>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: LoadSettings) -> Self {
        Self {
            dataset: None,
            source: None,
            settings,
            selected: View::default(),
            output: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and render the selected view over it.
    pub fn set_dataset(&mut self, source: PathBuf, dataset: Table) {
        self.dataset = Some(dataset);
        self.source = Some(source);
        self.status_message = None;
        self.refresh();
    }

    /// Switch to another view. Re-selecting the current view is a no-op.
    pub fn select_view(&mut self, view: View) {
        if view == self.selected && self.output.is_some() {
            return;
        }
        self.selected = view;
        self.refresh();
    }

    /// Recompute the selected view from scratch.
    pub fn refresh(&mut self) {
        self.output = self.dataset.as_ref().map(|table| {
            self.selected.render(table).map_err(|e| {
                log::error!("{} failed: {e}", self.selected.header());
                format!("{}: {e}", e.kind())
            })
        });
    }

    /// Load and prepare a file with the session settings.
    pub fn open(&mut self, path: &Path) {
        match session::open_dataset(path, &self.settings) {
            Ok(table) => self.set_dataset(path.to_path_buf(), table),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
