use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The deserialized `batchfmt.json` file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
  #[serde(default)]
  pub batch_size: Option<usize>,
  #[serde(default)]
  pub targets: Vec<TargetConfig>,
  #[serde(default)]
  pub formatters: Vec<FormatterConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetConfig {
  pub name: String,
  /// Glob patterns of the files owned by the target.
  pub sources: Vec<String>,
  #[serde(default)]
  pub fields: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormatterConfig {
  pub name: String,
  pub command: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  /// Selects targets that have all these fields.
  #[serde(default)]
  pub required_fields: Option<Vec<String>>,
  #[serde(default)]
  pub skip_field: Option<String>,
  /// Selects files matching these patterns instead of targets.
  #[serde(default)]
  pub files: Option<Vec<String>>,
  #[serde(default)]
  pub partition_by: Option<String>,
  /// Set to `false` to register a tool that doesn't take part in formatting.
  #[serde(default = "default_true")]
  pub formatter: bool,
}

fn default_true() -> bool {
  true
}
