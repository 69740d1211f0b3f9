use anyhow::Result;

use crate::environment::Environment;
use crate::executor::BatchResult;
use crate::invariant::InvariantViolation;
use crate::snapshot::FileSnapshot;
use crate::snapshot::merge_snapshots;

/// The merged final content of every batch that changed.
#[derive(Debug, Clone)]
pub struct ChangeSet {
  /// Files with content different from what is in the workspace.
  pub changed_files: Vec<String>,
  pub snapshot: FileSnapshot,
}

impl ChangeSet {
  pub fn is_empty(&self) -> bool {
    self.changed_files.is_empty()
  }
}

/// Merges the final output of every changed batch. Fails when two batches
/// disagree on the content of a file.
pub fn merge_changes(batch_results: &[BatchResult]) -> Result<ChangeSet, InvariantViolation> {
  let changed = batch_results.iter().filter(|r| r.did_change()).collect::<Vec<_>>();
  if changed.is_empty() {
    return Ok(ChangeSet {
      changed_files: Vec::new(),
      snapshot: FileSnapshot::empty(),
    });
  }
  let snapshot = merge_snapshots(changed.iter().filter_map(|r| r.final_output()))?;
  let initial = merge_snapshots(changed.iter().filter_map(|r| r.initial_input()))?;
  let changed_files = snapshot
    .files()
    .filter(|(path, content)| initial.get(path) != Some(*content))
    .map(|(path, _)| path.to_string())
    .collect();
  Ok(ChangeSet { changed_files, snapshot })
}

/// Writes the changed files to the workspace, returning the written paths.
pub async fn write_changes<TEnvironment: Environment>(changes: &ChangeSet, environment: &TEnvironment) -> Result<Vec<String>> {
  if changes.is_empty() {
    return Ok(Vec::new());
  }
  let environment = environment.clone();
  let changes = changes.clone();
  tokio::task::spawn_blocking(move || {
    for file_path in changes.changed_files.iter() {
      if let Some(content) = changes.snapshot.get(file_path) {
        environment.atomic_write_file_bytes(file_path, content)?;
        log_debug!(environment, "Wrote {}", file_path);
      }
    }
    Ok::<_, anyhow::Error>(changes.changed_files)
  })
  .await?
}
