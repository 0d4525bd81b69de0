//! Sled Preference Store Implementation
//!
//! 音色偏好是唯一跨会话存活的状态，落在一个小 sled 库里。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{PreferenceError, PreferenceStorePort};

/// 偏好记录（bincode 编码入库）
#[derive(Debug, Serialize, Deserialize)]
struct PreferenceRecord {
    value: String,
    updated_at: DateTime<Utc>,
}

/// Sled 偏好存储配置
#[derive(Debug, Clone)]
pub struct SledPreferenceStoreConfig {
    /// sled 数据库路径
    pub db_path: PathBuf,
}

/// Sled 偏好存储
pub struct SledPreferenceStore {
    db: sled::Db,
}

impl SledPreferenceStore {
    pub fn new(config: &SledPreferenceStoreConfig) -> Result<Self, PreferenceError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| PreferenceError::StorageError(e.to_string()))?;
        tracing::info!(path = %config.db_path.display(), "Preference store opened");
        Ok(Self { db })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl PreferenceStorePort for SledPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let Some(bytes) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| PreferenceError::StorageError(e.to_string()))?
        else {
            return Ok(None);
        };

        let record: PreferenceRecord = bincode::deserialize(&bytes)
            .map_err(|e| PreferenceError::EncodingError(e.to_string()))?;
        Ok(Some(record.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let record = PreferenceRecord {
            value: value.to_string(),
            updated_at: Utc::now(),
        };
        let bytes = bincode::serialize(&record)
            .map_err(|e| PreferenceError::EncodingError(e.to_string()))?;
        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| PreferenceError::StorageError(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| PreferenceError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store(dir: &tempfile::TempDir) -> SledPreferenceStore {
        SledPreferenceStore::new(&SledPreferenceStoreConfig {
            db_path: dir.path().join("preferences.sled"),
        })
        .unwrap()
    }

    #[test]
    fn test_get_set_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert_eq!(store.get("voice").unwrap(), None);
        store.set("voice", "活泼童声").unwrap();
        assert_eq!(store.get("voice").unwrap().as_deref(), Some("活泼童声"));
    }

    #[test]
    fn test_value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(&dir);
            store.set("voice", "慈祥奶奶").unwrap();
        }
        let store = open_store(&dir);
        assert_eq!(store.get("voice").unwrap().as_deref(), Some("慈祥奶奶"));
    }

    #[test]
    fn test_corrupt_record_reports_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store.db.insert(b"voice", b"not bincode".as_slice()).unwrap();
        assert!(matches!(
            store.get("voice"),
            Err(PreferenceError::EncodingError(_))
        ));
    }
}
