use std::collections::BTreeMap;
use thiserror::Error;

use super::FileSnapshot;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Cannot merge snapshots: {file_path} has conflicting content.")]
pub struct MergeConflictError {
  pub file_path: String,
}

/// Merges the snapshots into one. Two snapshots may hold the same path only
/// when they agree on its content.
pub fn merge_snapshots<'a>(snapshots: impl IntoIterator<Item = &'a FileSnapshot>) -> Result<FileSnapshot, MergeConflictError> {
  let mut files: BTreeMap<&str, &[u8]> = BTreeMap::new();
  for snapshot in snapshots {
    for (path, content) in snapshot.files() {
      match files.get(path) {
        Some(existing) if *existing != content => {
          return Err(MergeConflictError { file_path: path.to_string() });
        }
        Some(_) => {}
        None => {
          files.insert(path, content);
        }
      }
    }
  }
  Ok(FileSnapshot::new(files.into_iter().map(|(path, content)| (path.to_string(), content.to_vec()))))
}
