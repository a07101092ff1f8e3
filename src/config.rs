//! 应用配置
//! 数据目录下的 config.json，缺失或无法解析时使用默认值；环境变量优先

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::get_app_data_dir;

pub const CONFIG_FILE: &str = "config.json";
pub const ENV_DATA_DIR: &str = "ELEARN_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "ELEARN_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub log_level: String,
    pub leaderboard_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: get_app_data_dir(),
            database_file: "elearn.db".to_string(),
            log_level: "info".to_string(),
            leaderboard_size: 10,
        }
    }
}

impl AppConfig {
    /// 按 默认值 -> config.json -> 环境变量 的顺序加载
    pub fn load() -> Self {
        let data_dir = std::env::var_os(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(get_app_data_dir);

        let mut config = Self::from_file(&data_dir.join(CONFIG_FILE)).unwrap_or_default();
        config.data_dir = data_dir;

        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config
    }

    fn from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("elearn.log")
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
