use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

use super::Formatter;
use super::PartitionerType;

/// A formatter configuration that can't be used. Reported before any file is processed.
#[derive(Debug, Error)]
pub enum RegistrationError {
  #[error("Formatter '{0}' is registered more than once.")]
  DuplicateName(String),
  #[error("Formatter '{0}' selects files by pattern, so it must declare a partitioner.")]
  MissingFilePartitioner(String),
  #[error("Invalid formatter '{name}': {message}")]
  InvalidFormatter { name: String, message: String },
  #[error("Unknown formatter '{0}'. Run `batchfmt list` to see the registered formatters.")]
  UnknownOnly(String),
}

/// The closed, ordered list of registered formatters.
///
/// Registration order is the order tools run in when more than one handles a file.
pub struct FormatterRegistry {
  formatters: Vec<Rc<dyn Formatter>>,
}

impl FormatterRegistry {
  pub fn new(formatters: Vec<Rc<dyn Formatter>>) -> Result<Self, RegistrationError> {
    let mut names = HashSet::new();
    for formatter in formatters.iter() {
      if !names.insert(formatter.name().to_string()) {
        return Err(RegistrationError::DuplicateName(formatter.name().to_string()));
      }
      if formatter.selection().is_file_based() && formatter.partitioner_type() == PartitionerType::Default {
        return Err(RegistrationError::MissingFilePartitioner(formatter.name().to_string()));
      }
    }
    Ok(FormatterRegistry { formatters })
  }

  pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn Formatter>> {
    self.formatters.iter()
  }

  pub fn len(&self) -> usize {
    self.formatters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.formatters.is_empty()
  }

  /// The formatters that take part in the fmt goal, optionally restricted to the provided names.
  pub fn fmt_formatters(&self, only: &[String]) -> Result<Vec<Rc<dyn Formatter>>, RegistrationError> {
    let formatters = self.formatters.iter().filter(|f| f.is_formatter()).cloned().collect::<Vec<_>>();
    if only.is_empty() {
      return Ok(formatters);
    }
    for name in only {
      if !formatters.iter().any(|f| f.name() == name) {
        return Err(RegistrationError::UnknownOnly(name.to_string()));
      }
    }
    Ok(formatters.into_iter().filter(|f| only.iter().any(|name| name == f.name())).collect())
  }
}
