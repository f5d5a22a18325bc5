mod app;

use crate::app::{
    DeskApp, APP_NAME, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH, WINDOW_HEIGHT, WINDOW_WIDTH,
};
use eframe::egui;
use netdesk::AppConfig;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    let startup_size = startup_window_size(&config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_inner_size(startup_size)
            .with_min_inner_size([MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(DeskApp::new(cc, config)))
        }),
    )
}

fn startup_window_size(config: &AppConfig) -> [f32; 2] {
    if let Some((w, h)) = config.last_size {
        [
            sanitize_dimension(w, WINDOW_WIDTH, MIN_WINDOW_WIDTH),
            sanitize_dimension(h, WINDOW_HEIGHT, MIN_WINDOW_HEIGHT),
        ]
    } else {
        [WINDOW_WIDTH, WINDOW_HEIGHT]
    }
}

fn sanitize_dimension(value: f32, fallback: f32, min: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, 4096.0)
}
