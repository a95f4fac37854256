use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed category of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Trigger,
  Endpoint,
  Transform,
  Auth,
  RateLimit,
  Cache,
  Mock,
  Validator,
  Output,
}

impl NodeKind {
  /// Every kind, in catalog order.
  pub const ALL: [NodeKind; 9] = [
    NodeKind::Trigger,
    NodeKind::Endpoint,
    NodeKind::Transform,
    NodeKind::Auth,
    NodeKind::RateLimit,
    NodeKind::Cache,
    NodeKind::Mock,
    NodeKind::Validator,
    NodeKind::Output,
  ];

  /// Stable identifier used in stored documents and on the command line.
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeKind::Trigger => "trigger",
      NodeKind::Endpoint => "endpoint",
      NodeKind::Transform => "transform",
      NodeKind::Auth => "auth",
      NodeKind::RateLimit => "rate_limit",
      NodeKind::Cache => "cache",
      NodeKind::Mock => "mock",
      NodeKind::Validator => "validator",
      NodeKind::Output => "output",
    }
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when a string does not name a known node kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown node kind: {0}")]
pub struct ParseNodeKindError(pub String);

impl FromStr for NodeKind {
  type Err = ParseNodeKindError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    // Accept both "rate_limit" and "ratelimit"/"rate-limit" from the command line
    let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
    NodeKind::ALL
      .into_iter()
      .find(|k| k.as_str() == normalized || k.as_str().replace('_', "") == normalized)
      .ok_or_else(|| ParseNodeKindError(s.to_string()))
  }
}
