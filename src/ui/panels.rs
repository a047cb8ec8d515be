use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::AppState;
use crate::views::View;

// ---------------------------------------------------------------------------
// Left side panel – analysis picker
// ---------------------------------------------------------------------------

/// Render the left panel: one radio button per view.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("EDA Options");
    ui.separator();

    ui.strong("Choose analysis:");
    let mut selected = state.selected;
    for view in View::ALL {
        ui.radio_value(&mut selected, view, view.label());
    }
    if selected != state.selected {
        state.select_view(selected);
    }

    ui.separator();
    let mode = if state.settings.preprocess {
        "derived columns on"
    } else {
        "raw columns"
    };
    ui.label(RichText::new(mode).small().weak());
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
        });

        ui.separator();

        if let (Some(ds), Some(src)) = (&state.dataset, &state.source) {
            ui.label(format!(
                "{}: {} rows, {} columns",
                src.display(),
                ds.len(),
                ds.width()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open transaction data")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
