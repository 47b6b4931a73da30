mod app;
mod color;
mod state;
mod ui;

use std::sync::Arc;

use anyhow::Context;
use app::NutriPandaApp;
use eframe::egui;
use nutri_panda::{AppConfig, ResourceCache};
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    let cache = Arc::new(ResourceCache::new(
        config.protected_columns.clone(),
        config.empty_column_policy,
    ));

    // Load failures abort startup; later reloads from the File menu only
    // report into the status line.
    let service = cache
        .service(&config.dataset_path, &config.pipeline_path)
        .context("loading dataset and pipeline")?;
    let state = AppState::new(config, cache, service);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Nutri Panda – Nutrition Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(NutriPandaApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard: {e}"))
}
