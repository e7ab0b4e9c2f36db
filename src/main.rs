#![warn(clippy::all, rust_2018_idioms)]

use batik_paint::{EditorConfig, PaintApp};

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    // Optional JSON config file as the first argument.
    let config = std::env::args().nth(1).and_then(|path| {
        let loaded = std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|json| EditorConfig::from_json(&json).map_err(|err| err.to_string()));
        match loaded {
            Ok(config) => {
                log::info!("Loaded config from {path}");
                Some(config)
            }
            Err(err) => {
                log::error!("Ignoring config {path}: {err}");
                None
            }
        }
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Batik")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "batik_paint",
        native_options,
        Box::new(|cc| Ok(Box::new(PaintApp::new(cc, config)))),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {}
