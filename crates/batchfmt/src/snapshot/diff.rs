use super::FileSnapshot;

/// Difference between two snapshots. There is no rename detection, so a renamed
/// file shows up as one removed and one added file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
  /// Files in both snapshots with different content.
  pub changed_files: Vec<String>,
  /// Files only in the new snapshot.
  pub added_files: Vec<String>,
  /// Files only in the old snapshot.
  pub removed_files: Vec<String>,
}

impl SnapshotDiff {
  pub fn from_snapshots(old: &FileSnapshot, new: &FileSnapshot) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();
    if old == new {
      return diff;
    }
    for (path, old_content) in old.files() {
      match new.get(path) {
        Some(new_content) => {
          if new_content != old_content {
            diff.changed_files.push(path.to_string());
          }
        }
        None => diff.removed_files.push(path.to_string()),
      }
    }
    diff.added_files = new.paths().filter(|path| !old.contains(path)).map(ToOwned::to_owned).collect();
    diff
  }

  pub fn is_empty(&self) -> bool {
    self.changed_files.is_empty() && self.added_files.is_empty() && self.removed_files.is_empty()
  }

  /// Changed, then added, then removed files.
  pub fn all_files(&self) -> impl Iterator<Item = &String> {
    self.changed_files.iter().chain(self.added_files.iter()).chain(self.removed_files.iter())
  }
}
