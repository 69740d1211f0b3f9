use anyhow::Result;

use crate::environment::Environment;
use crate::formatters::FmtBatch;
use crate::formatters::FmtResult;
use crate::invariant::InvariantViolation;
use crate::planner::BatchRequest;
use crate::snapshot::FileSnapshot;

/// The results of each formatter of a batch, in execution order.
#[derive(Debug, Clone)]
pub struct BatchResult {
  pub results: Vec<FmtResult>,
}

impl BatchResult {
  pub fn initial_input(&self) -> Option<&FileSnapshot> {
    self.results.first().map(|r| &r.input)
  }

  pub fn final_output(&self) -> Option<&FileSnapshot> {
    self.results.last().map(|r| &r.output)
  }

  /// If the batch's files differ after every formatter ran.
  pub fn did_change(&self) -> bool {
    match (self.initial_input(), self.final_output()) {
      (Some(input), Some(output)) => input != output,
      _ => false,
    }
  }
}

/// Runs the formatters of a batch one after the other, feeding the output
/// of each formatter to the next one.
pub async fn run_batch<TEnvironment: Environment>(request: &BatchRequest, environment: &TEnvironment) -> Result<BatchResult> {
  let mut snapshot = FileSnapshot::from_workspace(environment, &request.files).await?;
  let mut results = Vec::with_capacity(request.elements.len());
  for element in request.elements.iter() {
    let tool = element.formatter.name();
    let input = snapshot.subset(element.files.iter().map(String::as_str));
    log_debug!(environment, "Running {}{} on {} file(s).", tool, element.metadata.description(), input.len());
    let result = element
      .formatter
      .format(FmtBatch {
        files: element.files.clone(),
        metadata: element.metadata.clone(),
        snapshot: input,
      })
      .await?;

    if !result.output.has_exact_paths(&request.files) {
      return Err(
        InvariantViolation::FileSetChanged {
          tool: tool.to_string(),
          expected: request.files.clone(),
          actual: result.output.paths().map(ToOwned::to_owned).collect(),
        }
        .into(),
      );
    }
    log_result_output(&result, environment);

    snapshot = result.output.clone();
    results.push(result);
  }
  Ok(BatchResult { results })
}

fn log_result_output<TEnvironment: Environment>(result: &FmtResult, environment: &TEnvironment) {
  if result.stdout.trim().is_empty() && result.stderr.trim().is_empty() {
    return;
  }
  log_debug!(
    environment,
    "Output from {}\n{}{}",
    result.formatter_name,
    result.stdout.trim_end(),
    if result.stderr.trim().is_empty() {
      String::new()
    } else {
      format!("\n{}", result.stderr.trim_end())
    }
  );
}
