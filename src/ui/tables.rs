use eframe::egui::Ui;
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::Value;
use crate::views::output::StatTable;

/// Draw a statistics table with a header row.
pub fn stat_table(ui: &mut Ui, id: usize, table: &StatTable) {
    ui.strong(&table.title);
    ui.push_id(("stat_table", id), |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(TableColumn::auto().at_least(80.0), table.columns.len())
            .header(20.0, |mut header| {
                for name in &table.columns {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|mut body| {
                for row in &table.rows {
                    body.row(18.0, |mut cells| {
                        for value in row {
                            cells.col(|ui| {
                                ui.label(cell_text(value));
                            });
                        }
                    });
                }
            });
    });
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Float(v) => format!("{v:.4}"),
        Value::Null => "NaN".to_string(),
        other => other.to_string(),
    }
}
