use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::data::derive::{DeriveOptions, MarkupPolicy};
use crate::session::LoadSettings;
use crate::views::View;

/// Output layout of a headless report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// EDA Dashboard for payment transactions.
#[derive(Parser, Debug, Clone)]
#[command(name = "payment-eda", version, about)]
pub struct Args {
    /// Path to the transaction data file (.csv, .tsv, .json or .parquet)
    #[arg(long, alias = "data_path", env = "EDA_DATA_PATH")]
    pub data_path: PathBuf,

    /// Derive the calendar, FX and first-visit columns and save the result
    #[arg(long)]
    pub preprocess: bool,

    /// Where the preprocessed table is written
    #[arg(
        long,
        alias = "output_path",
        env = "EDA_OUTPUT_PATH",
        default_value = "updated_data.csv"
    )]
    pub output_path: PathBuf,

    /// Fail instead of leaving fx_rate_markup missing when mid_market_fx_rate is zero
    #[arg(long)]
    pub strict_fx: bool,

    /// Print one view to stdout and exit instead of opening the dashboard
    #[arg(long, value_enum)]
    pub view: Option<View>,

    /// Layout of the printed view
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl Args {
    pub fn load_settings(&self) -> LoadSettings {
        LoadSettings {
            preprocess: self.preprocess,
            output_path: self.output_path.clone(),
            derive: DeriveOptions {
                markup_policy: if self.strict_fx {
                    MarkupPolicy::Reject
                } else {
                    MarkupPolicy::Propagate
                },
            },
        }
    }
}
