mod app;
mod upload;
mod utils;

use app::DropUploader;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("drop_uploader=info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([520.0, 640.0])
            .with_min_inner_size([400.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Batch File Uploader",
        options,
        Box::new(|cc| Box::new(DropUploader::new(cc))),
    )
}
