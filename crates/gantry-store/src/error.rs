/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The backing could not be read or written.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A stored document could not be encoded or decoded.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// The backing refused the operation (quota, unavailable, ...).
  #[error("store unavailable: {0}")]
  Unavailable(String),
}

impl StoreError {
  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::Unavailable(message.into())
  }
}
