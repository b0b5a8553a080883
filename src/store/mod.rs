//! 键值存储抽象层
//!
//! 定义统一的持久化接口，支持内存与文件两种实现。三个操作（get / set / remove）
//! 幂等，单键原子；跨键没有事务保证（设置合并是读-改-写，见 merge_settings）。
//!
//! 键按用途命名：`settings` 存 UserSettings，`conversation_<problemId>` 存某题的
//! 消息序列。会话只通过后台路由的处理器访问，其他组件不直接改写。

mod file;
mod memory;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::{ChatMessage, SettingsPatch, UserSettings};

pub use file::FileStore;
pub use memory::MemoryStore;

/// 持久化操作失败
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StorageError(pub String);

/// 键值存储接口：调用方提供 JSON 可序列化的值
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 读取键；不存在时返回 None
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// 写入键（覆盖旧值）
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// 删除键；键不存在时也成功
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// 设置的存储键
pub const SETTINGS_KEY: &str = "settings";

/// 某题会话的存储键
pub fn conversation_key(problem_id: &str) -> String {
    format!("conversation_{}", problem_id)
}

/// 创建存储：配置了 data_dir 时用文件存储，否则用内存存储
pub fn create_store(data_dir: Option<&Path>) -> Arc<dyn KvStore> {
    match data_dir {
        Some(dir) => {
            tracing::info!("Using file-backed store: {:?}", dir);
            Arc::new(FileStore::new(dir))
        }
        None => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// 读取设置；未持久化时物化默认记录
pub async fn load_settings(store: &dyn KvStore) -> Result<UserSettings, StorageError> {
    match store.get(SETTINGS_KEY).await? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| StorageError(format!("corrupt settings record: {}", e))),
        None => Ok(UserSettings::default()),
    }
}

/// 合并一个设置补丁（读-改-写）
///
/// 单键原子性不覆盖读与写之间的窗口：两个并发合并可能丢失其中一个补丁的字段。
/// 设置变更是人操作 UI 的节奏，接受该竞争。
pub async fn merge_settings(
    store: &dyn KvStore,
    patch: &SettingsPatch,
) -> Result<(), StorageError> {
    let mut settings = load_settings(store).await?;
    patch.apply_to(&mut settings);
    let value = serde_json::to_value(&settings)
        .map_err(|e| StorageError(format!("serialize settings: {}", e)))?;
    store.set(SETTINGS_KEY, value).await
}

/// 读取某题的消息序列；未存储时返回空序列
pub async fn load_conversation(
    store: &dyn KvStore,
    problem_id: &str,
) -> Result<Vec<ChatMessage>, StorageError> {
    match store.get(&conversation_key(problem_id)).await? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| StorageError(format!("corrupt conversation record: {}", e))),
        None => Ok(Vec::new()),
    }
}

/// 整体写入某题的消息序列
pub async fn save_conversation(
    store: &dyn KvStore,
    problem_id: &str,
    messages: &[ChatMessage],
) -> Result<(), StorageError> {
    let value = serde_json::to_value(messages)
        .map_err(|e| StorageError(format!("serialize conversation: {}", e)))?;
    store.set(&conversation_key(problem_id), value).await
}

/// 清空某题的会话（删除键，而不是写入空数组）
pub async fn clear_conversation(
    store: &dyn KvStore,
    problem_id: &str,
) -> Result<(), StorageError> {
    store.remove(&conversation_key(problem_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SkillLevel;

    #[tokio::test]
    async fn test_load_settings_defaults_on_miss() {
        let store = MemoryStore::new();
        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings, UserSettings::default());
    }

    #[tokio::test]
    async fn test_merge_settings_preserves_unset_fields() {
        let store = MemoryStore::new();
        merge_settings(
            &store,
            &SettingsPatch {
                skill_level: Some(SkillLevel::Advanced),
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        merge_settings(
            &store,
            &SettingsPatch {
                auto_sync: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let settings = load_settings(&store).await.unwrap();
        assert!(!settings.auto_sync);
        assert_eq!(settings.skill_level, SkillLevel::Advanced);
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert!(settings.show_toggle_button);
    }

    #[tokio::test]
    async fn test_conversation_roundtrip() {
        let store = MemoryStore::new();
        assert!(load_conversation(&store, "two-sum").await.unwrap().is_empty());

        let messages = vec![ChatMessage::user("hint?"), ChatMessage::assistant("think")];
        save_conversation(&store, "two-sum", &messages).await.unwrap();
        assert_eq!(load_conversation(&store, "two-sum").await.unwrap(), messages);

        // 不同题目互不影响
        assert!(load_conversation(&store, "lru-cache").await.unwrap().is_empty());

        clear_conversation(&store, "two-sum").await.unwrap();
        assert!(load_conversation(&store, "two-sum").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_missing_conversation_is_ok() {
        let store = MemoryStore::new();
        clear_conversation(&store, "nonexistent").await.unwrap();
    }
}
