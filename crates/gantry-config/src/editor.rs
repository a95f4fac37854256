use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::position::Position;

/// Rules applied on top of the kind allow-lists when connecting nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionPolicy {
  /// Reject edges that would close a cycle. Off by default: allow-lists alone
  /// decide legality, and they do permit loops such as transform -> transform.
  #[serde(default)]
  pub forbid_cycles: bool,
}

/// Tunables for an editor session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
  /// Interval between publish progress steps.
  #[serde(with = "duration_ms")]
  pub publish_tick: Duration,
  /// Progress added per tick, in percent.
  pub publish_step: u8,
  /// Maximum history snapshots retained per flow.
  pub history_limit: usize,
  /// Offset applied to a duplicated node's position.
  pub duplicate_offset: Position,
  #[serde(default)]
  pub connection_policy: ConnectionPolicy,
}

impl Default for EditorConfig {
  fn default() -> Self {
    Self {
      publish_tick: Duration::from_millis(250),
      publish_step: 10,
      history_limit: 10,
      duplicate_offset: Position::new(50.0, 50.0),
      connection_policy: ConnectionPolicy::default(),
    }
  }
}

mod duration_ms {
  use std::time::Duration;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_match_publish_cadence() {
    let config = EditorConfig::default();
    assert_eq!(config.publish_tick, Duration::from_millis(250));
    assert_eq!(config.publish_step, 10);
    assert_eq!(config.history_limit, 10);
    assert_eq!(config.duplicate_offset, Position::new(50.0, 50.0));
    assert!(!config.connection_policy.forbid_cycles);
  }

  #[test]
  fn test_publish_tick_serializes_as_millis() {
    let json = serde_json::to_value(EditorConfig::default()).unwrap();
    assert_eq!(json["publish_tick"], 250);

    let parsed: EditorConfig = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, EditorConfig::default());
  }

  #[test]
  fn test_partial_config_fills_defaults() {
    let parsed: EditorConfig = serde_json::from_value(serde_json::json!({
      "publish_step": 25,
      "connection_policy": { "forbid_cycles": true }
    }))
    .unwrap();

    assert_eq!(parsed.publish_step, 25);
    assert!(parsed.connection_policy.forbid_cycles);
    assert_eq!(parsed.publish_tick, Duration::from_millis(250));
    assert_eq!(parsed.history_limit, 10);
  }
}
