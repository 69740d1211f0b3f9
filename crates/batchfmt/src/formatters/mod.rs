mod command;
mod registry;

pub use command::*;
pub use registry::*;

use anyhow::Result;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::partition::PartitionInput;
use crate::partition::PartitionMetadata;
use crate::partition::Partitions;
use crate::partition::default_partitions;
use crate::process::ProcessOutput;
use crate::snapshot::FileSnapshot;
use crate::snapshot::SnapshotDiff;
use crate::targets::FileSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionerType {
  /// Every selected file in one partition without metadata.
  Default,
  /// The formatter partitions the files itself.
  Custom,
}

/// A pluggable formatter. Registered at startup and never mutated afterwards.
pub trait Formatter {
  fn name(&self) -> &str;

  /// Request types that aren't formatters are registered, but skipped by the fmt goal.
  fn is_formatter(&self) -> bool {
    true
  }

  fn selection(&self) -> &FileSelection;

  fn partitioner_type(&self) -> PartitionerType {
    PartitionerType::Default
  }

  fn partition(&self, input: PartitionInput) -> LocalBoxFuture<'_, Result<Partitions>> {
    let partitions = default_partitions(&input);
    async move { Ok(partitions) }.boxed_local()
  }

  /// Formats the batch's snapshot. The output must hold exactly the batch's files.
  fn format(&self, batch: FmtBatch) -> LocalBoxFuture<'_, Result<FmtResult>>;
}

/// One invocation of a formatter.
#[derive(Debug, Clone)]
pub struct FmtBatch {
  pub files: Vec<String>,
  pub metadata: PartitionMetadata,
  pub snapshot: FileSnapshot,
}

#[derive(Debug, Clone)]
pub struct FmtResult {
  pub input: FileSnapshot,
  pub output: FileSnapshot,
  pub stdout: String,
  pub stderr: String,
  pub formatter_name: String,
}

impl FmtResult {
  pub fn from_process(formatter_name: &str, input: FileSnapshot, output: ProcessOutput) -> Self {
    FmtResult {
      input,
      output: output.output,
      stdout: output.stdout,
      stderr: output.stderr,
      formatter_name: formatter_name.to_string(),
    }
  }

  pub fn did_change(&self) -> bool {
    self.output != self.input
  }

  pub fn diff(&self) -> SnapshotDiff {
    SnapshotDiff::from_snapshots(&self.input, &self.output)
  }
}
