//! In-Memory Preference Store Implementation

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{PreferenceError, PreferenceStorePort};

/// 内存偏好存储（测试与无持久化场景）
pub struct InMemoryPreferenceStore {
    entries: DashMap<String, String>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStorePort for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
