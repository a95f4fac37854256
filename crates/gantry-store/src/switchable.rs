use std::sync::Arc;

use async_trait::async_trait;
use gantry_config::PersistenceMode;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::StoreError;
use crate::kv::{InMemoryKvStore, KvStore};

/// Routes every call to the durable or the ephemeral backing, according to
/// the persistence toggle.
///
/// Switching persistence off (durable -> ephemeral) starts from an empty
/// ephemeral backing. The durable backing is never cleared by the toggle.
pub struct SwitchableStore {
  durable: Arc<dyn KvStore>,
  ephemeral: InMemoryKvStore,
  mode: RwLock<PersistenceMode>,
}

impl SwitchableStore {
  pub fn new(durable: Arc<dyn KvStore>, mode: PersistenceMode) -> Self {
    Self {
      durable,
      ephemeral: InMemoryKvStore::new(),
      mode: RwLock::new(mode),
    }
  }

  /// The currently selected backing.
  pub async fn mode(&self) -> PersistenceMode {
    *self.mode.read().await
  }

  /// Flip the persistence toggle.
  pub async fn set_mode(&self, mode: PersistenceMode) -> Result<(), StoreError> {
    let mut current = self.mode.write().await;
    if *current == mode {
      return Ok(());
    }

    if mode == PersistenceMode::Ephemeral {
      self.ephemeral.clear().await?;
    }

    info!(from = ?*current, to = ?mode, "persistence mode changed");
    *current = mode;
    Ok(())
  }

  async fn backing(&self) -> &dyn KvStore {
    match *self.mode.read().await {
      PersistenceMode::Durable => self.durable.as_ref(),
      PersistenceMode::Ephemeral => &self.ephemeral,
    }
  }
}

#[async_trait]
impl KvStore for SwitchableStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    self.backing().await.get(key).await
  }

  async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
    self.backing().await.set(key, value).await
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    self.backing().await.delete(key).await
  }

  async fn clear(&self) -> Result<(), StoreError> {
    self.backing().await.clear().await
  }
}
