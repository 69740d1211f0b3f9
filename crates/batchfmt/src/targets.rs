use indexmap::IndexMap;
use serde_json::Value;

use crate::utils::FileMatcher;

/// An owning unit of source files along with the fields declared on it.
#[derive(Debug, Clone, PartialEq)]
pub struct FmtTarget {
  pub address: String,
  pub fields: IndexMap<String, Value>,
  pub sources: Vec<String>,
}

impl FmtTarget {
  pub fn has_field(&self, name: &str) -> bool {
    self.fields.contains_key(name)
  }

  pub fn is_flag_set(&self, name: &str) -> bool {
    matches!(self.fields.get(name), Some(Value::Bool(true)))
  }

  /// The field's value as text. Strings are returned without quotes.
  pub fn field_text(&self, name: &str) -> Option<String> {
    match self.fields.get(name)? {
      Value::Null => None,
      Value::String(text) => Some(text.clone()),
      value => Some(value.to_string()),
    }
  }
}

/// Selects the targets a formatter applies to.
#[derive(Debug, Clone, Default)]
pub struct TargetSelector {
  pub required_fields: Vec<String>,
  /// A boolean field that opts a target out of the formatter when `true`.
  pub skip_field: Option<String>,
}

impl TargetSelector {
  pub fn is_applicable(&self, target: &FmtTarget) -> bool {
    self.required_fields.iter().all(|field| target.has_field(field))
  }

  pub fn opt_out(&self, target: &FmtTarget) -> bool {
    match &self.skip_field {
      Some(skip_field) => target.is_flag_set(skip_field),
      None => false,
    }
  }
}

/// How a formatter picks the files it handles.
pub enum FileSelection {
  /// Files owned by the targets that have the required fields.
  Targets(TargetSelector),
  /// Any requested file matching the globs.
  Files(FileMatcher),
}

impl FileSelection {
  pub fn is_file_based(&self) -> bool {
    matches!(self, FileSelection::Files(_))
  }
}
