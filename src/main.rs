mod app;
mod charts;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use app::MortalityAtlasApp;
use clap::Parser;
use eframe::egui;

use config::Cli;
use data::etl::load_table;
use data::source::Fetcher;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // Loaded once; every widget event works on this shared table.
    let fetcher = Fetcher::new(cli.timeout()).context("building HTTP client")?;
    let table = match load_table(&fetcher, &cli.mortality, &cli.population) {
        Ok(table) => {
            if table.is_empty() {
                log::warn!("Merged table is empty; every selection will report no data");
            }
            Arc::new(table)
        }
        Err(e) => {
            log::error!("Failed to load data: {e}");
            return Err(e).context("loading mortality and population tables");
        }
    };
    let filters = cli.initial_filters(&table);
    let state = AppState::new(table, filters);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cancer Mortality Atlas",
        options,
        Box::new(|_cc| Ok(Box::new(MortalityAtlasApp::new(state)))),
    )
    .map_err(|e| anyhow!("window error: {e}"))
}
