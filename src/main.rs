#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Context;
use elearn_lib::commands::{self, AppState};
use elearn_lib::logging::init_logging;
use elearn_lib::{AppConfig, ElearnApp};
use tokio::sync::Mutex;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();
    init_logging(&config).context("failed to initialize logging")?;
    log::info!(
        "elearn {} starting on {}, data dir {}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        config.data_dir.display()
    );

    // 初始化存储，首次启动写入种子数据
    let app = ElearnApp::open(config).context("failed to open storage")?;

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(AppState(Mutex::new(app)))
        .invoke_handler(tauri::generate_handler![
            commands::navigate,
            commands::dispatch,
            commands::open_material,
        ])
        .run(tauri::generate_context!())
        .context("error while running tauri application")?;

    Ok(())
}
