//! StreamLab - Main Entry Point
//!
//! Desktop lab for writing stream pipeline configs, running sample input
//! through them and sharing the result.

use std::sync::Arc;

use streamlab_rs::config::{
    app_data_dir, AppConfig, FileSettingStore, MemorySettingStore, SettingStore, APP_ID,
};
use streamlab_rs::frontend::LabApp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = init_tracing();

    tracing::info!("Starting StreamLab v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default();

    let store: Arc<dyn SettingStore> = match FileSettingStore::open_default() {
        Ok(store) => {
            tracing::info!("Settings stored at {:?}", store.path());
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!("Settings will not persist: {}", e);
            Arc::new(MemorySettingStore::new())
        }
    };

    let [width, height] = config.ui.window_size;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([640.0, 480.0])
            .with_title("StreamLab"),
        ..Default::default()
    };

    let result = eframe::run_native(
        APP_ID,
        native_options,
        Box::new(move |cc| {
            let mut style = (*cc.egui_ctx.style()).clone();
            style.visuals.window_shadow.offset = [0, 0];
            cc.egui_ctx.set_style(style);

            Ok(Box::new(LabApp::new(cc, config, store)?))
        }),
    );

    tracing::info!("Shutting down...");
    result
}

fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,streamlab_rs=debug"));

    let (file_layer, guard) = match app_data_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "streamlab.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}
