mod app;
mod color;
mod config;
mod data;
mod export;
mod state;
mod ui;

use anyhow::{anyhow, Context};
use app::DashboardApp;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env().context("reading dashboard configuration")?;
    log::info!("Using dataset {}", config.dataset_path.display());

    let dataset = match data::loader::load_dataset(
        &config.dataset_path,
        config.indicator_columns.as_deref(),
    ) {
        Ok(dataset) => dataset,
        Err(e) => {
            log::error!("Cannot start without a dataset: {e:#}");
            return Err(e);
        }
    };

    if dataset.is_empty() {
        log::warn!("{} has a header but no rows", config.dataset_path.display());
    }

    let state = AppState::new(dataset, config);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dépenses publiques – Tableau de bord",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("UI terminated with an error: {e}"))
}
