//! 记忆层：计算历史与偏好持久化

pub mod history;
pub mod persistence;

pub use history::{HistoryItem, HistoryLog, DEFAULT_HISTORY_LIMIT};
pub use persistence::{
    KeyValueStore, MemoryStore, Preferences, SqliteStore, StoreError, StoredPreferences,
};
