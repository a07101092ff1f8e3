// 页面命令
// WebView 只负责显示，导航与操作都交给 ElearnApp 处理

use tauri::{AppHandle, State};
use tauri_plugin_opener::OpenerExt;
use tokio::sync::Mutex;

use crate::app::{ActionRequest, ElearnApp, Page};
use crate::error::AppError;
use crate::utils::is_web_url;

/// 应用状态，单写者
pub struct AppState(pub Mutex<ElearnApp>);

/// 导航到片段路径
#[tauri::command]
pub async fn navigate(path: String, state: State<'_, AppState>) -> Result<Page, AppError> {
    let app = state.0.lock().await;
    app.navigate(&path)
}

/// 执行页面操作
#[tauri::command]
pub async fn dispatch(request: ActionRequest, state: State<'_, AppState>) -> Result<Page, AppError> {
    let app = state.0.lock().await;
    app.dispatch(request).await
}

/// 用系统浏览器打开课程资料
#[tauri::command]
pub async fn open_material(url: String, app_handle: AppHandle) -> Result<(), AppError> {
    if !is_web_url(&url) {
        return Err(AppError::Internal(format!("refusing to open {}", url)));
    }
    app_handle
        .opener()
        .open_url(url, None::<&str>)
        .map_err(|e| AppError::Internal(format!("failed to open link: {}", e)))
}
