use anyhow::{Result, anyhow};
use clap::Parser;
use eframe::egui;

use payment_eda::app::EdaApp;
use payment_eda::config::Args;
use payment_eda::state::AppState;
use payment_eda::{report, session};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = args.load_settings();

    let table = session::open_dataset(&args.data_path, &settings).inspect_err(|e| {
        log::error!("Failed to prepare {}: {e:#}", args.data_path.display());
    })?;

    if let Some(view) = args.view {
        println!("{}", report::render(view, &table, args.format)?);
        return Ok(());
    }

    let mut state = AppState::new(settings);
    state.set_dataset(args.data_path.clone(), table);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EDA Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(EdaApp::new(state)))),
    )
    .map_err(|e| anyhow!("dashboard exited with an error: {e}"))
}
