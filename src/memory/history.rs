//! 计算历史
//!
//! 最新在前，最多保留 limit 条（默认 20），超出时淘汰最旧的记录。条目创建后不可修改。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 默认保留条数
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// 单条历史：表达式、结果、创建时间（epoch 毫秒）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub expression: String,
    pub result: String,
    pub timestamp: i64,
}

impl HistoryItem {
    pub fn new(expression: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            expression: expression.into(),
            result: result.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HistoryLog {
    items: Vec<HistoryItem>,
    limit: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLog {
    /// limit 至少为 1
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// 从持久化数据恢复；超过上限的旧条目直接丢弃
    pub fn from_items(mut items: Vec<HistoryItem>, limit: usize) -> Self {
        let limit = limit.max(1);
        items.truncate(limit);
        Self { items, limit }
    }

    /// 记录一次成功求值，插到最前
    pub fn record(&mut self, expression: impl Into<String>, result: impl Into<String>) -> &HistoryItem {
        self.items.insert(0, HistoryItem::new(expression, result));
        self.items.truncate(self.limit);
        &self.items[0]
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
