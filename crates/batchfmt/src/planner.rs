use anyhow::Result;
use anyhow::bail;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::formatters::Formatter;
use crate::partition::PartitionMetadata;
use crate::partition::Partitions;
use crate::utils::partition_sequentially;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize {
  target: usize,
  max: usize,
}

impl Default for BatchSize {
  fn default() -> Self {
    Self {
      target: Self::DEFAULT_TARGET,
      max: Self::DEFAULT_TARGET * 4,
    }
  }
}

impl BatchSize {
  pub const DEFAULT_TARGET: usize = 128;

  pub fn new(target: usize) -> Result<Self> {
    if target == 0 {
      bail!("The batch size must be greater than 0.");
    }
    Ok(BatchSize {
      target,
      max: target.saturating_mul(4),
    })
  }

  pub fn target(&self) -> usize {
    self.target
  }

  pub fn max(&self) -> usize {
    self.max
  }
}

/// The unit of work handed to one formatter invocation.
#[derive(Clone)]
pub struct BatchElement {
  pub formatter: Rc<dyn Formatter>,
  pub files: Vec<String>,
  pub metadata: PartitionMetadata,
}

impl fmt::Debug for BatchElement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BatchElement")
      .field("formatter", &self.formatter.name())
      .field("files", &self.files)
      .field("metadata", &self.metadata)
      .finish()
  }
}

/// Elements that run one after the other on the same files.
#[derive(Debug, Clone)]
pub struct BatchRequest {
  pub files: Vec<String>,
  pub elements: Vec<BatchElement>,
}

/// Splits the partitions of every formatter into disjoint batches.
///
/// Files are grouped by the exact ordered list of `(formatter, metadata)` pairs that
/// handle them, so every file of a group goes through the same chain of tools. Groups
/// are then split into size bounded batches. The provided list must be in registration
/// order, which becomes the execution order within a batch.
pub fn make_disjoint_batch_requests(partitions_by_formatter: &[(Rc<dyn Formatter>, Partitions)], batch_size: BatchSize) -> Vec<BatchRequest> {
  let mut tools_by_file: BTreeMap<&str, Vec<(usize, &PartitionMetadata)>> = BTreeMap::new();
  for (index, (_, partitions)) in partitions_by_formatter.iter().enumerate() {
    for partition in partitions {
      for file in partition.files.iter() {
        tools_by_file.entry(file.as_str()).or_default().push((index, &partition.metadata));
      }
    }
  }

  let mut files_by_tools: IndexMap<Vec<(usize, &PartitionMetadata)>, Vec<&str>> = IndexMap::new();
  for (file, tools) in tools_by_file {
    files_by_tools.entry(tools).or_default().push(file);
  }

  let mut requests = Vec::new();
  for (tools, files) in files_by_tools {
    for batch in partition_sequentially(files, |file| file.to_string(), batch_size.target(), batch_size.max()) {
      let files = batch.into_iter().map(ToOwned::to_owned).collect::<Vec<_>>();
      let elements = tools
        .iter()
        .map(|(index, metadata)| BatchElement {
          formatter: partitions_by_formatter[*index].0.clone(),
          files: files.clone(),
          metadata: (*metadata).clone(),
        })
        .collect();
      requests.push(BatchRequest { files, elements });
    }
  }
  requests
}
