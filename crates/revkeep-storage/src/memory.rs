//! In-memory storage implementation for testing.

use crate::{decode_list, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing.
///
/// Values are kept as JSON text so decoding behaves exactly like the file
/// backend, including the lenient list decoding.
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Store raw JSON text under a key, bypassing serialization.
    pub fn insert_raw(&self, key: &[&str], json: impl Into<String>) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.insert(Self::key_to_string(key), json.into());
        Ok(())
    }

    /// Convert a key slice to a storage key string.
    fn key_to_string(key: &[&str]) -> String {
        key.join("/")
    }

    fn get(&self, key: &[&str]) -> StorageResult<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.get(&Self::key_to_string(key)).cloned())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        match self.get(key)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StorageError::decode(key, e)),
            None => Ok(None),
        }
    }

    async fn read_list<T: DeserializeOwned + Send>(
        &self,
        key: &[&str],
    ) -> StorageResult<Option<Vec<T>>> {
        match self.get(key)? {
            Some(json) => decode_list(key, &json).map(Some),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + Send + Sync>(
        &self,
        key: &[&str],
        value: &T,
    ) -> StorageResult<()> {
        let json = serde_json::to_string(value)?;
        self.insert_raw(key, json)
    }
}
