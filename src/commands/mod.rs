// Tauri 命令模块
// 提供供前端调用的命令接口

pub mod app;

pub use app::{dispatch, navigate, open_material, AppState};
