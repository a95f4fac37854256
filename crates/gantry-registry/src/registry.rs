use std::collections::BTreeMap;

use gantry_config::{NodeData, NodeKind};
use serde_json::{Value, json};

use crate::error::RegistryError;

/// Catalog entry for one node kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindSpec {
  pub kind: NodeKind,
  /// Display label shown on the palette and as the default node label.
  pub label: String,
  /// Configuration document a new node of this kind starts with.
  pub defaults: NodeData,
  /// Kinds this kind may connect to, in palette order.
  pub allowed: Vec<NodeKind>,
}

impl KindSpec {
  fn new(kind: NodeKind, label: &str, defaults: Value, allowed: &[NodeKind]) -> Self {
    let defaults = match defaults {
      Value::Object(map) => map,
      _ => NodeData::new(),
    };
    Self {
      kind,
      label: label.to_string(),
      defaults,
      allowed: allowed.to_vec(),
    }
  }
}

/// Read-only lookup table of node kinds.
#[derive(Debug, Clone)]
pub struct NodeKindRegistry {
  kinds: BTreeMap<NodeKind, KindSpec>,
}

impl NodeKindRegistry {
  /// Start an empty registry.
  pub fn builder() -> RegistryBuilder {
    RegistryBuilder::default()
  }

  /// The built-in catalog of all nine kinds.
  pub fn standard() -> Self {
    use NodeKind::*;

    let specs = [
      KindSpec::new(
        Trigger,
        "API Request",
        json!({ "label": "API Request", "method": "GET", "path": "/api/v1" }),
        &[Endpoint, Transform, Auth, RateLimit, Cache, Mock, Validator, Output],
      ),
      KindSpec::new(
        Endpoint,
        "HTTP Endpoint",
        json!({
          "label": "HTTP Endpoint",
          "url": "https://api.example.com",
          "method": "GET",
          "headers": {}
        }),
        &[Transform, Cache, Validator, Output],
      ),
      KindSpec::new(
        Transform,
        "Transform",
        json!({ "label": "Transform", "target": "body", "template": "" }),
        &[Endpoint, Transform, Cache, Validator, Output],
      ),
      KindSpec::new(
        Auth,
        "Authentication",
        json!({ "label": "Authentication", "authType": "apiKey", "header": "Authorization" }),
        &[RateLimit, Endpoint, Transform, Validator, Mock, Cache, Output],
      ),
      KindSpec::new(
        RateLimit,
        "Rate Limit",
        json!({ "label": "Rate Limit", "rate": 100, "per": 60 }),
        &[Auth, Endpoint, Transform, Cache, Mock, Output],
      ),
      KindSpec::new(
        Cache,
        "Cache",
        json!({ "label": "Cache", "ttl": 300, "cacheKey": "path" }),
        &[Endpoint, Transform, Output],
      ),
      KindSpec::new(
        Mock,
        "Mock Response",
        json!({ "label": "Mock Response", "statusCode": 200, "body": "{}", "headers": {} }),
        &[Transform, Validator, Output],
      ),
      KindSpec::new(
        Validator,
        "Validator",
        json!({ "label": "Validator", "schema": {}, "strict": false }),
        &[Endpoint, Transform, Auth, RateLimit, Mock, Output],
      ),
      KindSpec::new(
        Output,
        "Response",
        json!({ "label": "Response", "statusCode": 200, "format": "json" }),
        &[],
      ),
    ];

    let kinds = specs.into_iter().map(|spec| (spec.kind, spec)).collect();
    Self { kinds }
  }

  /// Get the catalog entry for a kind.
  pub fn get(&self, kind: NodeKind) -> Option<&KindSpec> {
    self.kinds.get(&kind)
  }

  /// Whether the kind is registered.
  pub fn contains(&self, kind: NodeKind) -> bool {
    self.kinds.contains_key(&kind)
  }

  /// Default configuration document for a kind.
  pub fn defaults_for(&self, kind: NodeKind) -> Option<&NodeData> {
    self.get(kind).map(|spec| &spec.defaults)
  }

  /// Kinds the given kind may connect to. Empty for unregistered kinds.
  pub fn allow_list_for(&self, kind: NodeKind) -> &[NodeKind] {
    self
      .get(kind)
      .map(|spec| spec.allowed.as_slice())
      .unwrap_or(&[])
  }

  /// Display label for a kind, falling back to its identifier.
  pub fn label_for(&self, kind: NodeKind) -> &str {
    self
      .get(kind)
      .map(|spec| spec.label.as_str())
      .unwrap_or(kind.as_str())
  }

  /// All registered entries, in kind order.
  pub fn iter(&self) -> impl Iterator<Item = &KindSpec> {
    self.kinds.values()
  }
}

impl Default for NodeKindRegistry {
  fn default() -> Self {
    Self::standard()
  }
}

/// Assembles a custom registry, checking the catalog invariants.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
  pending: Vec<(NodeKind, String, Value, Vec<NodeKind>)>,
}

impl RegistryBuilder {
  /// Register a kind.
  pub fn kind(
    mut self,
    kind: NodeKind,
    label: impl Into<String>,
    defaults: Value,
    allowed: &[NodeKind],
  ) -> Self {
    self
      .pending
      .push((kind, label.into(), defaults, allowed.to_vec()));
    self
  }

  /// Validate and freeze the catalog.
  pub fn build(self) -> Result<NodeKindRegistry, RegistryError> {
    let mut kinds = BTreeMap::new();

    for (kind, label, defaults, allowed) in self.pending {
      let Value::Object(defaults) = defaults else {
        return Err(RegistryError::InvalidDefaults { kind });
      };
      if allowed.contains(&NodeKind::Trigger) {
        return Err(RegistryError::TriggerAsTarget { kind });
      }
      if kind == NodeKind::Output && !allowed.is_empty() {
        return Err(RegistryError::OutputNotTerminal);
      }
      if kinds.contains_key(&kind) {
        return Err(RegistryError::DuplicateKind { kind });
      }
      kinds.insert(
        kind,
        KindSpec {
          kind,
          label,
          defaults,
          allowed,
        },
      );
    }

    Ok(NodeKindRegistry { kinds })
  }
}
