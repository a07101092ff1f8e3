// 存储适配模块
// 以 SQLite 单表作为本地键值存储，保存数据集与当前会话两个条目

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{AppError, Result};
use crate::models::{Dataset, Session};

/// 数据集条目键
pub const DB_KEY: &str = "elearn_db_v1";
/// 会话条目键
pub const AUTH_KEY: &str = "elearn_auth_v1";

/// 存储适配器
#[derive(Clone)]
pub struct StorageAdapter {
    pool: Arc<Mutex<Connection>>,
}

impl StorageAdapter {
    /// 打开（必要时创建）数据库文件
    pub fn open(db_path: &Path) -> Result<Self> {
        // 确保数据目录存在
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        let storage = Self {
            pool: Arc::new(Mutex::new(conn)),
        };
        storage.initialize()?;
        log::info!("storage opened at {}", db_path.display());
        Ok(storage)
    }

    /// 内存数据库，用于测试
    pub fn open_in_memory() -> Result<Self> {
        let storage = Self {
            pool: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        storage.initialize()?;
        Ok(storage)
    }

    /// 初始化键值表
    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.pool
            .lock()
            .map_err(|e| AppError::Internal(format!("storage lock poisoned: {}", e)))
    }

    // ==================== 键值操作 ====================

    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?", rusqlite::params![key])?;
        Ok(())
    }

    // ==================== 数据集 ====================

    /// 读取数据集，缺失或无法解析时返回 None
    pub fn load(&self) -> Result<Option<Dataset>> {
        let Some(raw) = self.get_raw(DB_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(dataset) => Ok(Some(dataset)),
            Err(e) => {
                log::warn!("stored dataset is unparseable, treating as absent: {}", e);
                Ok(None)
            }
        }
    }

    /// 整体写回数据集
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        let raw = serde_json::to_string(dataset)?;
        self.set_raw(DB_KEY, &raw)
    }

    /// 读取数据集，不存在时写入初始数据
    pub fn load_or_seed(&self) -> Result<Dataset> {
        if let Some(dataset) = self.load()? {
            return Ok(dataset);
        }
        log::info!("seeding initial dataset");
        let seed = Dataset::seed();
        self.save(&seed)?;
        Ok(seed)
    }

    // ==================== 会话 ====================

    pub fn load_session(&self) -> Result<Option<Session>> {
        let Some(raw) = self.get_raw(AUTH_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                log::warn!("stored session is unparseable, treating as absent: {}", e);
                Ok(None)
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        self.set_raw(AUTH_KEY, &raw)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.remove_raw(AUTH_KEY)
    }

    #[cfg(test)]
    pub(crate) fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.set_raw(key, value)
    }
}
