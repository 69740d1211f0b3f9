use thiserror::Error;

use crate::snapshot::MergeConflictError;

/// A broken internal guarantee. These point at a bug in a formatter or in batchfmt,
/// not at a configuration problem.
#[derive(Debug, Error)]
pub enum InvariantViolation {
  #[error("Internal error: {tool} returned a different set of files than it was given. Expected {expected:?}, but got {actual:?}.")]
  FileSetChanged { tool: String, expected: Vec<String>, actual: Vec<String> },
  #[error("Internal error: two batches changed the same file. {0}")]
  MergeConflict(#[from] MergeConflictError),
}
