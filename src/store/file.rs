//! 文件存储：每个键一个 JSON 文件
//!
//! 键先做文件名清洗（非 `[A-Za-z0-9_-]` 字符替换为 `_`，长度截断），写入时
//! 自动创建父目录，读取不存在的文件视为键缺失。

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use super::{KvStore, StorageError};

/// 文件键值存储
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// 清洗键用作文件名
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(128)
        .collect()
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError(format!("read {:?}: {}", path, e))),
        };
        let value = serde_json::from_str(&data)
            .map_err(|e| StorageError(format!("parse {:?}: {}", path, e)))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError(format!("create {:?}: {}", self.dir, e)))?;
        let path = self.path_for(key);
        let data = serde_json::to_string_pretty(&value)
            .map_err(|e| StorageError(format!("serialize {}: {}", key, e)))?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| StorageError(format!("write {:?}: {}", path, e)))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError(format!("remove {:?}: {}", path, e))),
        }
    }
}
