mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;
mod workdir;

use anyhow::Result;
use app::TranStackApp;
use clap::Parser;
use config::{Cli, Config};
use eframe::egui;
use env_logger::Env;
use state::Session;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_filter())).init();

    let workdir = workdir::resolve(&cli, &config)?;
    let mut session = Session::new(config.grid()?, config.fallback_value, workdir.clone());
    if let Err(e) = session.load_directory(&workdir) {
        log::error!("{e}");
        session.status_message = Some(format!("Error: {e}"));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "TranStack – Transmission Stacker",
        options,
        Box::new(|_cc| Ok(Box::new(TranStackApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("running the GUI: {e}"))
}
