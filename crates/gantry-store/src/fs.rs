use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::StoreError;
use crate::kv::KvStore;

/// Filesystem-backed KV store. The durable backing.
///
/// Each key is stored as one file, with `:` separators turned into `--`:
/// ```text
/// {root}/
/// ├── flows--index.json
/// ├── flow--flow-5c1e....json
/// └── flow--flow-5c1e...--history.json
/// ```
pub struct FsKvStore {
  root: PathBuf,
}

impl FsKvStore {
  /// Create a new filesystem store at the given root path.
  /// The directory is created lazily on first write.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Map a key to its file.
  /// Example: "flow:abc:history" -> "{root}/flow--abc--history.json"
  fn path_for(&self, key: &str) -> PathBuf {
    let name: String = key
      .replace(':', "--")
      .chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
          c
        } else {
          '_'
        }
      })
      .collect();
    self.root.join(format!("{name}.json"))
  }
}

#[async_trait]
impl KvStore for FsKvStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(self.path_for(key)).await {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
    fs::create_dir_all(&self.root).await?;

    // Write to a sibling temp file and rename so readers never see a partial document
    let path = self.path_for(key);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, value).await?;
    fs::rename(&tmp, &path).await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    match fs::remove_file(self.path_for(key)).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }

  async fn clear(&self) -> Result<(), StoreError> {
    if !fs::try_exists(&self.root).await? {
      return Ok(());
    }

    let mut entries = fs::read_dir(&self.root).await?;
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if path.extension().is_some_and(|ext| ext == "json") {
        fs::remove_file(&path).await?;
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_path_for_replaces_separators() {
    let store = FsKvStore::new("/data");
    assert_eq!(
      store.path_for("flow:abc:history"),
      PathBuf::from("/data/flow--abc--history.json")
    );
  }

  #[test]
  fn test_path_for_sanitizes_path_characters() {
    let store = FsKvStore::new("/data");
    assert_eq!(
      store.path_for("flow:../etc"),
      PathBuf::from("/data/flow--.._etc.json")
    );
  }

  #[tokio::test]
  async fn test_values_survive_a_new_instance() {
    let dir = tempfile::tempdir().unwrap();

    let store = FsKvStore::new(dir.path());
    assert_eq!(store.get("flow:a").await.unwrap(), None);
    store.set("flow:a", "{}".to_string()).await.unwrap();

    let reopened = FsKvStore::new(dir.path());
    assert_eq!(reopened.get("flow:a").await.unwrap(), Some("{}".to_string()));

    reopened.delete("flow:a").await.unwrap();
    reopened.delete("flow:a").await.unwrap();
    assert_eq!(store.get("flow:a").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_clear_removes_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsKvStore::new(dir.path().join("flows"));

    store.clear().await.unwrap();
    store.set("a", "1".to_string()).await.unwrap();
    store.set("b", "2".to_string()).await.unwrap();
    store.clear().await.unwrap();

    assert_eq!(store.get("a").await.unwrap(), None);
    assert_eq!(store.get("b").await.unwrap(), None);
  }
}
