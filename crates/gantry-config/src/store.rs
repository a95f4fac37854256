use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which backing the persistence layer writes to.
///
/// This is the global persistence toggle. It is owned by whoever embeds the
/// editor; the store only reads it to pick a backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
  /// Survives process restarts.
  #[default]
  Durable,
  /// Lives in memory and is cleared whenever persistence is switched off.
  Ephemeral,
}

/// Where and how flows are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
  /// Root directory for the durable backing.
  pub data_dir: PathBuf,
  #[serde(default)]
  pub mode: PersistenceMode,
}

impl StoreConfig {
  pub fn new(data_dir: impl Into<PathBuf>) -> Self {
    Self {
      data_dir: data_dir.into(),
      mode: PersistenceMode::default(),
    }
  }

  /// Directory holding one file per stored key.
  pub fn flows_dir(&self) -> PathBuf {
    self.data_dir.join("flows")
  }
}
