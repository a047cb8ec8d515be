use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::ReportFormat;
use crate::data::model::Table;
use crate::views::View;
use crate::views::output::ViewOutput;

#[derive(Serialize)]
struct JsonReport<'a> {
    view: &'a str,
    header: String,
    output: &'a ViewOutput,
}

/// Render one view for stdout.
pub fn render(view: View, table: &Table, format: ReportFormat) -> Result<String> {
    let output = view.render(table).map_err(|e| {
        let kind = e.kind();
        anyhow::Error::new(e).context(format!("{kind} while rendering '{}'", view.label()))
    })?;

    match format {
        ReportFormat::Text => Ok(format!("{}\n\n{output}", view.header())),
        ReportFormat::Json => serde_json::to_string_pretty(&JsonReport {
            view: view.label(),
            header: view.header(),
            output: &output,
        })
        .context("encoding report"),
    }
}
