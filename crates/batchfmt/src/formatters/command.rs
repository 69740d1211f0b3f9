use anyhow::Result;
use anyhow::bail;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::FmtBatch;
use super::FmtResult;
use super::Formatter;
use super::PartitionerType;
use super::RegistrationError;
use crate::partition::Partition;
use crate::partition::PartitionInput;
use crate::partition::PartitionMetadata;
use crate::partition::Partitions;
use crate::process::ProcessRequest;
use crate::process::ProcessRunner;
use crate::process::run_successful_process;
use crate::targets::FileSelection;
use crate::utils::pluralize;

const PARTITION_PLACEHOLDER: &str = "{partition}";

/// How a command formatter splits its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionBy {
  /// All files in one partition.
  None,
  /// By file extension.
  Extension,
  /// By parent directory.
  Directory,
  /// By the value of a target field.
  Field(String),
}

impl PartitionBy {
  pub fn parse(text: &str) -> Option<PartitionBy> {
    match text {
      "none" => Some(PartitionBy::None),
      "extension" => Some(PartitionBy::Extension),
      "directory" => Some(PartitionBy::Directory),
      _ => match text.strip_prefix("field:") {
        Some(field) if !field.is_empty() => Some(PartitionBy::Field(field.to_string())),
        _ => None,
      },
    }
  }
}

pub struct CommandFormatterOptions {
  pub name: String,
  pub command: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub selection: FileSelection,
  pub partition_by: Option<PartitionBy>,
  pub is_formatter: bool,
}

/// Runs an external command with the batch's files appended to its arguments.
pub struct CommandFormatter {
  name: String,
  command: Vec<String>,
  env: BTreeMap<String, String>,
  selection: FileSelection,
  partition_by: Option<PartitionBy>,
  is_formatter: bool,
  runner: Rc<dyn ProcessRunner>,
}

impl CommandFormatter {
  pub fn new(options: CommandFormatterOptions, runner: Rc<dyn ProcessRunner>) -> Result<Self, RegistrationError> {
    let invalid = |message: &str| RegistrationError::InvalidFormatter {
      name: options.name.clone(),
      message: message.to_string(),
    };
    if options.command.is_empty() || options.command[0].trim().is_empty() {
      return Err(invalid("The command must not be empty."));
    }
    if options.selection.is_file_based() && matches!(options.partition_by, Some(PartitionBy::Field(_))) {
      return Err(invalid("Partitioning by a field requires selecting targets, not files."));
    }
    Ok(CommandFormatter {
      name: options.name,
      command: options.command,
      env: options.env,
      selection: options.selection,
      partition_by: options.partition_by,
      is_formatter: options.is_formatter,
      runner,
    })
  }

  fn partition_files(&self, partition_by: &PartitionBy, input: PartitionInput) -> Result<Partitions> {
    let mut groups: BTreeMap<PartitionMetadata, Vec<String>> = BTreeMap::new();
    match partition_by {
      PartitionBy::Field(field) => {
        let PartitionInput::Targets(targets) = input else {
          bail!("Formatter '{}' partitions by field '{}', but received files instead of targets.", self.name, field);
        };
        for selected in targets {
          let metadata = match selected.target.field_text(field) {
            Some(value) => PartitionMetadata::new(value),
            None => PartitionMetadata::none(),
          };
          groups.entry(metadata).or_default().extend(selected.files);
        }
      }
      _ => {
        for file in input.all_files() {
          let metadata = match partition_by {
            PartitionBy::Extension => file_extension(&file).map(PartitionMetadata::new).unwrap_or_default(),
            PartitionBy::Directory => PartitionMetadata::new(parent_dir(&file)),
            _ => PartitionMetadata::none(),
          };
          groups.entry(metadata).or_default().push(file);
        }
      }
    }
    Ok(
      groups
        .into_iter()
        .map(|(metadata, mut files)| {
          files.sort();
          files.dedup();
          Partition { files, metadata }
        })
        .collect(),
    )
  }
}

impl Formatter for CommandFormatter {
  fn name(&self) -> &str {
    &self.name
  }

  fn is_formatter(&self) -> bool {
    self.is_formatter
  }

  fn selection(&self) -> &FileSelection {
    &self.selection
  }

  fn partitioner_type(&self) -> PartitionerType {
    match self.partition_by {
      Some(_) => PartitionerType::Custom,
      None => PartitionerType::Default,
    }
  }

  fn partition(&self, input: PartitionInput) -> LocalBoxFuture<'_, Result<Partitions>> {
    async move {
      match &self.partition_by {
        Some(partition_by) => self.partition_files(partition_by, input),
        None => Ok(crate::partition::default_partitions(&input)),
      }
    }
    .boxed_local()
  }

  fn format(&self, batch: FmtBatch) -> LocalBoxFuture<'_, Result<FmtResult>> {
    async move {
      let partition = batch.metadata.to_string();
      let mut argv = self.command.iter().map(|arg| arg.replace(PARTITION_PLACEHOLDER, &partition)).collect::<Vec<_>>();
      argv.extend(batch.files.iter().cloned());
      let env = self
        .env
        .iter()
        .map(|(key, value)| (key.clone(), value.replace(PARTITION_PLACEHOLDER, &partition)))
        .collect();
      let request = ProcessRequest {
        argv,
        env,
        input: batch.snapshot.clone(),
        output_files: batch.files.clone(),
        description: format!("Run {}{} on {}", self.name, batch.metadata.description(), pluralize(batch.files.len(), "file")),
      };
      let output = run_successful_process(self.runner.as_ref(), request).await?;
      Ok(FmtResult::from_process(&self.name, batch.snapshot, output))
    }
    .boxed_local()
  }
}

fn file_extension(file_path: &str) -> Option<String> {
  let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
  match file_name.rfind('.') {
    Some(index) if index > 0 => Some(file_name[index + 1..].to_lowercase()),
    _ => None,
  }
}

fn parent_dir(file_path: &str) -> String {
  match file_path.rfind('/') {
    Some(index) => file_path[..index].to_string(),
    None => ".".to_string(),
  }
}
