//! Vulnerability Scanner GUI — eframe/egui desktop application.

mod app;
mod ui;

use app::ScannerApp;

fn main() -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Vulnerability Scanner")
            .with_inner_size([960.0, 660.0])
            .with_min_inner_size([720.0, 460.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vulnerability Scanner",
        options,
        Box::new(|cc| {
            ui::theme::apply_theme(&cc.egui_ctx);
            Ok(Box::new(ScannerApp::new()))
        }),
    )
}
