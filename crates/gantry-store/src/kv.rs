use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Key-value backing for flow persistence.
///
/// Values are opaque strings (JSON documents in practice). The trait is async
/// so file and networked backings fit behind the same seam.
#[async_trait]
pub trait KvStore: Send + Sync {
  /// Get a value by key.
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

  /// Set a value.
  async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

  /// Delete a value. Deleting a missing key is not an error.
  async fn delete(&self, key: &str) -> Result<(), StoreError>;

  /// Remove every key.
  async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory KV store implementation.
///
/// Serves as the ephemeral backing and as the test double.
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
  data: RwLock<HashMap<String, String>>,
}

impl InMemoryKvStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of stored keys.
  pub async fn len(&self) -> usize {
    self.data.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.data.read().await.is_empty()
  }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.data.read().await.get(key).cloned())
  }

  async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
    self.data.write().await.insert(key.to_string(), value);
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    self.data.write().await.remove(key);
    Ok(())
  }

  async fn clear(&self) -> Result<(), StoreError> {
    self.data.write().await.clear();
    Ok(())
  }
}

#[async_trait]
impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    (**self).get(key).await
  }

  async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
    (**self).set(key, value).await
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    (**self).delete(key).await
  }

  async fn clear(&self) -> Result<(), StoreError> {
    (**self).clear().await
  }
}
