use gantry_config::NodeKind;

use crate::registry::NodeKindRegistry;

/// Decides whether an edge between two kinds is legal.
///
/// A pure predicate over the registry's allow-lists. It knows nothing about
/// the graph, so it cannot see cycles; see `gantry_flow` for the optional
/// cycle policy.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionValidator<'a> {
  registry: &'a NodeKindRegistry,
}

impl<'a> ConnectionValidator<'a> {
  pub fn new(registry: &'a NodeKindRegistry) -> Self {
    Self { registry }
  }

  /// True when `target` is in the allow-list of `source`.
  /// False whenever either kind is missing from the registry.
  pub fn is_valid(&self, source: NodeKind, target: NodeKind) -> bool {
    if !self.registry.contains(source) || !self.registry.contains(target) {
      return false;
    }
    self.registry.allow_list_for(source).contains(&target)
  }

  /// Kinds a node of `source` kind could currently connect to.
  pub fn valid_targets(&self, source: NodeKind) -> impl Iterator<Item = NodeKind> + '_ {
    self
      .registry
      .allow_list_for(source)
      .iter()
      .copied()
      .filter(|target| self.registry.contains(*target))
  }
}
