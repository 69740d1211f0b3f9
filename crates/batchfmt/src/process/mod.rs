mod caching_runner;
mod sandboxed_runner;

pub use caching_runner::*;
pub use sandboxed_runner::*;

use anyhow::Result;
use futures::future::LocalBoxFuture;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::snapshot::Digest;
use crate::snapshot::DigestBuilder;
use crate::snapshot::FileSnapshot;

/// An external command to run against an input snapshot.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
  pub argv: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub input: FileSnapshot,
  /// Files to capture into the output snapshot after the process exits.
  pub output_files: Vec<String>,
  pub description: String,
}

impl ProcessRequest {
  /// Identifies everything that could affect the outcome of running the process.
  pub fn cache_key(&self) -> Digest {
    let mut builder = DigestBuilder::new();
    builder.add_str("argv");
    for arg in self.argv.iter() {
      builder.add_str(arg);
    }
    builder.add_str("env");
    for (key, value) in self.env.iter() {
      builder.add_str(key).add_str(value);
    }
    builder.add_str("input").add_digest(&self.input.digest());
    builder.add_str("outputs");
    for output_file in self.output_files.iter() {
      builder.add_str(output_file);
    }
    builder.finish()
  }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
  pub exit_code: i32,
  pub stdout: String,
  pub stderr: String,
  pub output: FileSnapshot,
}

#[derive(Debug, Error)]
#[error("{description} failed with exit code {exit_code}.{}", format_output(.stdout, .stderr))]
pub struct ProcessFailedError {
  pub description: String,
  pub exit_code: i32,
  pub stdout: String,
  pub stderr: String,
}

fn format_output(stdout: &str, stderr: &str) -> String {
  let mut text = String::new();
  if !stdout.trim().is_empty() {
    text.push_str("\nstdout:\n");
    text.push_str(stdout.trim_end());
  }
  if !stderr.trim().is_empty() {
    text.push_str("\nstderr:\n");
    text.push_str(stderr.trim_end());
  }
  text
}

pub trait ProcessRunner {
  /// Runs the process. A non-zero exit code is not an error at this level.
  fn run(&self, request: ProcessRequest) -> LocalBoxFuture<'_, Result<ProcessOutput>>;
}

/// Runs the process and fails when it exits with a non-zero exit code.
pub async fn run_successful_process(runner: &dyn ProcessRunner, request: ProcessRequest) -> Result<ProcessOutput> {
  let description = request.description.clone();
  let output = runner.run(request).await?;
  if output.exit_code != 0 {
    return Err(
      ProcessFailedError {
        description,
        exit_code: output.exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
      }
      .into(),
    );
  }
  Ok(output)
}
