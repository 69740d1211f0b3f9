use anyhow::Result;
use futures::future::join_all;
use std::rc::Rc;
use tokio::sync::Semaphore;

use crate::environment::Environment;
use crate::executor::BatchResult;
use crate::executor::run_batch;
use crate::formatters::FmtResult;
use crate::formatters::FormatterRegistry;
use crate::partition::get_partitions_by_formatter;
use crate::planner::BatchSize;
use crate::planner::make_disjoint_batch_requests;
use crate::targets::FmtTarget;
use crate::utils::pluralize;
use crate::writer::merge_changes;
use crate::writer::write_changes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
  /// Write the changes to the workspace.
  Write,
  /// Only report what would change.
  Check,
}

pub struct FmtRequest {
  pub targets: Vec<Rc<FmtTarget>>,
  /// Workspace relative paths of the files to format.
  pub files: Vec<String>,
  /// Restricts the run to these formatters when not empty.
  pub only: Vec<String>,
  pub batch_size: BatchSize,
  pub write_mode: WriteMode,
}

#[derive(Debug)]
pub struct FmtOutcome {
  /// Every formatter invocation, batch by batch.
  pub results: Vec<FmtResult>,
  pub written_files: Vec<String>,
}

impl FmtOutcome {
  pub fn did_change(&self) -> bool {
    self.results.iter().any(|r| r.did_change())
  }

  /// Sorted names of the formatters that made changes.
  pub fn changed_formatter_names(&self) -> Vec<String> {
    let mut names = self.results.iter().filter(|r| r.did_change()).map(|r| r.formatter_name.clone()).collect::<Vec<_>>();
    names.sort();
    names.dedup();
    names
  }
}

/// Partitions the requested files, runs every batch and writes the net changes.
///
/// Nothing is written unless every batch succeeds.
pub async fn run_fmt<TEnvironment: Environment>(request: FmtRequest, registry: &FormatterRegistry, environment: &TEnvironment) -> Result<FmtOutcome> {
  let formatters = registry.fmt_formatters(&request.only)?;
  let partitions = get_partitions_by_formatter(&formatters, &request.targets, &request.files, environment).await?;
  let batch_requests = make_disjoint_batch_requests(&partitions, request.batch_size);
  log_debug!(
    environment,
    "Running {} batch(es) over {}.",
    batch_requests.len(),
    pluralize(request.files.len(), "requested file")
  );

  let semaphore = Rc::new(Semaphore::new(environment.max_threads().max(1)));
  let futures = batch_requests.iter().map(|batch_request| {
    let semaphore = semaphore.clone();
    async move {
      // closed after a failure, so batches that haven't started yet are skipped
      let Ok(_permit) = semaphore.acquire().await else {
        return None;
      };
      let result = run_batch(batch_request, environment).await;
      if result.is_err() {
        semaphore.close();
      }
      Some(result)
    }
  });
  let batch_results = join_all(futures).await;

  let mut successes: Vec<BatchResult> = Vec::with_capacity(batch_results.len());
  let mut errors = Vec::new();
  for result in batch_results.into_iter().flatten() {
    match result {
      Ok(result) => successes.push(result),
      Err(err) => errors.push(err),
    }
  }
  let mut errors = errors.into_iter();
  if let Some(first) = errors.next() {
    for err in errors {
      log_error!(environment, "{:#}", err);
    }
    return Err(first);
  }

  let changes = merge_changes(&successes)?;
  let written_files = match request.write_mode {
    WriteMode::Write => write_changes(&changes, environment).await?,
    WriteMode::Check => Vec::new(),
  };
  Ok(FmtOutcome {
    results: successes.into_iter().flat_map(|r| r.results).collect(),
    written_files,
  })
}
