use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::data::derive::{self, DeriveOptions};
use crate::data::model::Table;
use crate::data::{loader, writer};

/// How a dataset is prepared before the views see it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSettings {
    /// Run the derivation and persist its result.
    pub preprocess: bool,
    pub output_path: PathBuf,
    pub derive: DeriveOptions,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            preprocess: false,
            output_path: PathBuf::from("updated_data.csv"),
            derive: DeriveOptions::default(),
        }
    }
}

/// Load a dataset and, when preprocessing is on, derive the extra columns
/// and write the augmented table before returning it.
pub fn open_dataset(path: &Path, settings: &LoadSettings) -> Result<Table> {
    let raw = loader::load_file(path)?;
    if !settings.preprocess {
        return Ok(raw);
    }

    let table = derive::derive(&raw, settings.derive).map_err(|e| {
        let kind = e.kind();
        anyhow::Error::new(e).context(format!("{kind} while deriving columns for {}", path.display()))
    })?;
    writer::write_file(&table, &settings.output_path)?;
    Ok(table)
}
