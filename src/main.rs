mod app;
mod color;
mod state;
mod ui;

use app::SuperSaleApp;
use eframe::egui;
use state::AppState;
use supersale_insights::AppConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            (AppConfig::default(), Some(format!("Config error: {e:#}")))
        }
    };

    // The dataset is read once here; every later interaction reuses it.
    let mut state = AppState::new(config.source);
    state.load();
    if let Some(msg) = config_error {
        state.status_message = Some(msg);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SuperSale Insights",
        options,
        Box::new(|_cc| Ok(Box::new(SuperSaleApp::new(state)))),
    )
}
