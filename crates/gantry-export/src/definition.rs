use gantry_config::{NodeData, NodeKind};
use gantry_flow::FlowGraph;
use serde::{Deserialize, Serialize};

/// Listen path used when the flow has no trigger path.
pub const DEFAULT_LISTEN_PATH: &str = "/api/v1";

/// Upstream used when the flow has no endpoint node.
pub const DEFAULT_TARGET_URL: &str = "http://httpbin.org";

/// Auth type used when the flow has no auth node.
pub const DEFAULT_AUTH_TYPE: &str = "none";

/// Gateway API definition derived from a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
  pub api_id: String,
  pub name: String,
  pub listen_path: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,
  pub target_url: String,
  pub auth_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rate_limit: Option<RateLimitConfig>,
  /// Mirrors the flow's published flag.
  pub active: bool,
}

/// Requests allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
  pub rate: u64,
  /// Window length in seconds.
  pub per: u64,
  pub enabled: bool,
}

/// Derive the gateway definition a flow describes.
///
/// Only the first node of each relevant kind, in insertion order, is read:
/// - trigger `path` (and `method`) -> listen path
/// - endpoint `url` -> target URL
/// - auth `authType` -> auth type
/// - rate limit `rate`/`per` -> rate limit block
pub fn to_api_definition(flow: &FlowGraph) -> ApiDefinition {
  let trigger = flow.first_of_kind(NodeKind::Trigger).map(|n| &n.data);
  let endpoint = flow.first_of_kind(NodeKind::Endpoint).map(|n| &n.data);
  let auth = flow.first_of_kind(NodeKind::Auth).map(|n| &n.data);
  let rate_limit = flow.first_of_kind(NodeKind::RateLimit).map(|n| &n.data);

  ApiDefinition {
    api_id: flow.id.clone(),
    name: flow.name.clone(),
    listen_path: text_field(trigger, "path").unwrap_or(DEFAULT_LISTEN_PATH).to_string(),
    method: text_field(trigger, "method").map(str::to_string),
    target_url: text_field(endpoint, "url").unwrap_or(DEFAULT_TARGET_URL).to_string(),
    auth_type: text_field(auth, "authType").unwrap_or(DEFAULT_AUTH_TYPE).to_string(),
    rate_limit: rate_limit.map(|data| RateLimitConfig {
      rate: number_field(data, "rate").unwrap_or(100),
      per: number_field(data, "per").unwrap_or(60),
      enabled: true,
    }),
    active: flow.published,
  }
}

/// Non-empty string field of an optional node document.
fn text_field<'a>(data: Option<&'a NodeData>, key: &str) -> Option<&'a str> {
  data?
    .get(key)?
    .as_str()
    .map(str::trim)
    .filter(|s| !s.is_empty())
}

/// Numeric field, accepting numbers or numeric strings from form inputs.
fn number_field(data: &NodeData, key: &str) -> Option<u64> {
  let value = data.get(key)?;
  value
    .as_u64()
    .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    .or_else(|| value.as_str()?.trim().parse().ok())
}
