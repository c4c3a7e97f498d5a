//! 偏好持久化
//!
//! 扁平的字符串键值存储，同步读写：`history` 存 JSON 数组（最新在前），`theme` 存 "light" / "dark"。
//! 启动时读取；存储值损坏时回退到默认值并记录告警，不阻止启动。

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::core::Theme;
use crate::memory::HistoryItem;

pub const HISTORY_KEY: &str = "history";
pub const THEME_KEY: &str = "theme";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 字符串键值存储
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// SQLite 单表存储：preferences(key, value)
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// 打开（或创建）数据库文件；父目录不存在时自动创建
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    /// 内存数据库，进程退出即丢弃
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// 纯内存存储（测试与无数据目录时使用）
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 启动时读出的偏好
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredPreferences {
    pub history: Vec<HistoryItem>,
    pub theme: Theme,
}

/// 偏好读写：在 KeyValueStore 之上做 history / theme 的编解码
pub struct Preferences {
    store: Box<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// 读取 history 与 theme；缺失或损坏的值回退为默认（空历史、dark）
    pub fn load(&self) -> StoredPreferences {
        let history = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<HistoryItem>>(&raw).unwrap_or_else(|e| {
                tracing::warn!("Stored history is malformed ({}), starting empty", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("History read failed ({}), starting empty", e);
                Vec::new()
            }
        };

        let theme = match self.store.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse::<Theme>().unwrap_or_else(|e| {
                tracing::warn!("{}, using default theme", e);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("Theme read failed ({}), using default theme", e);
                Theme::default()
            }
        };

        StoredPreferences { history, theme }
    }

    pub fn save_history(&mut self, history: &[HistoryItem]) -> Result<(), StoreError> {
        let json = serde_json::to_string(history)?;
        self.store.set(HISTORY_KEY, &json)
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, theme.as_str())
    }
}
