use anyhow::Result;
use thiserror::Error;

use crate::arg_parser::FmtSubCommand;
use crate::configuration::ResolvedConfig;
use crate::environment::Environment;
use crate::fmt::FmtRequest;
use crate::fmt::WriteMode;
use crate::fmt::run_fmt;
use crate::formatters::FormatterRegistry;
use crate::planner::BatchSize;
use crate::reporter::print_results;
use crate::utils::FileMatcher;
use crate::utils::pluralize;

#[derive(Debug, Error)]
#[error("Found {} that would make changes: {}.", format_count(.names), format_names(.names))]
pub struct FormattersWouldChangeError {
  pub names: Vec<String>,
}

pub async fn format<TEnvironment: Environment>(
  cmd: &FmtSubCommand,
  write_mode: WriteMode,
  config: &ResolvedConfig,
  registry: &FormatterRegistry,
  workspace_files: &[String],
  environment: &TEnvironment,
) -> Result<()> {
  let files = resolve_requested_files(&cmd.file_patterns, workspace_files)?;
  if files.is_empty() {
    log_warn!(environment, "No files found to format.");
    return Ok(());
  }
  let batch_size = match cmd.batch_size {
    Some(target) => BatchSize::new(target)?,
    None => config.batch_size,
  };

  let outcome = run_fmt(
    FmtRequest {
      targets: config.targets.clone(),
      files,
      only: cmd.only.clone(),
      batch_size,
      write_mode,
    },
    registry,
    environment,
  )
  .await?;
  print_results(&outcome.results, environment);
  log_debug!(environment, "Wrote {}.", pluralize(outcome.written_files.len(), "file"));

  if write_mode == WriteMode::Check {
    let names = outcome.changed_formatter_names();
    if !names.is_empty() {
      return Err(FormattersWouldChangeError { names }.into());
    }
  }
  Ok(())
}

fn format_count(names: &[String]) -> String {
  pluralize(names.len(), "formatter")
}

fn format_names(names: &[String]) -> String {
  names.join(", ")
}

/// The workspace files matching the patterns, or every workspace file when there are none.
fn resolve_requested_files(file_patterns: &[String], workspace_files: &[String]) -> Result<Vec<String>> {
  if file_patterns.is_empty() {
    return Ok(workspace_files.to_vec());
  }
  let matcher = FileMatcher::new(file_patterns)?;
  Ok(workspace_files.iter().filter(|file| matcher.matches(file)).cloned().collect())
}
