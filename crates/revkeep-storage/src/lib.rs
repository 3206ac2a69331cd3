//! Storage layer for revkeep.
//!
//! This crate provides a document storage abstraction with two backends:
//! - JSON file storage (default)
//! - In-memory storage (for testing)
//!
//! Documents are addressed by key segments. List documents are decoded
//! leniently: a stored JSON array is read as-is, and a single bare object is
//! read as a one-element list, so files written by older tools still load.

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// A trait for document storage backends.
///
/// Keys are represented as path segments, e.g., `["versions", "<hash>", "version"]`.
/// Values are serialized/deserialized as JSON.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a value from storage.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn read<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>>;

    /// Read a list document, accepting either an array or a single object.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn read_list<T: DeserializeOwned + Send>(
        &self,
        key: &[&str],
    ) -> StorageResult<Option<Vec<T>>>;

    /// Write a value to storage, replacing whatever was stored under the key.
    async fn write<T: Serialize + Send + Sync>(&self, key: &[&str], value: &T)
        -> StorageResult<()>;

    /// Read-modify-write a list document.
    ///
    /// The editor is called with the current list (empty if the key doesn't
    /// exist); the whole list is written back afterwards. Callers are
    /// responsible for serializing concurrent updates to the same key.
    async fn update_list<T, F, R>(&self, key: &[&str], editor: F) -> StorageResult<R>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
        F: FnOnce(&mut Vec<T>) -> R + Send,
        R: Send,
    {
        let mut list: Vec<T> = self.read_list(key).await?.unwrap_or_default();
        let result = editor(&mut list);
        self.write(key, &list).await?;
        Ok(result)
    }
}

/// Decode a list document that may be stored as an array or a single object.
///
/// When neither shape matches, the error from the array attempt is returned.
pub fn decode_list<T: DeserializeOwned>(key: &[&str], content: &str) -> StorageResult<Vec<T>> {
    match serde_json::from_str::<Vec<T>>(content) {
        Ok(list) => Ok(list),
        Err(list_err) => match serde_json::from_str::<T>(content) {
            Ok(single) => Ok(vec![single]),
            Err(_) => Err(StorageError::decode(key, list_err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Item {
        id: String,
    }

    #[test]
    fn decode_list_reads_arrays() {
        let items: Vec<Item> = decode_list(&["k"], r#"[{"id":"v1"},{"id":"v2"}]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "v2");
    }

    #[test]
    fn decode_list_reads_single_object() {
        let items: Vec<Item> = decode_list(&["k"], r#"{"id":"v1"}"#).unwrap();
        assert_eq!(items, vec![Item { id: "v1".into() }]);
    }

    #[test]
    fn decode_list_rejects_garbage() {
        let result: StorageResult<Vec<Item>> = decode_list(&["meta"], "not json");
        assert!(matches!(result, Err(StorageError::Decode { key, .. }) if key == "meta"));
    }
}
