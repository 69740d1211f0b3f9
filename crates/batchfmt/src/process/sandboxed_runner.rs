use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;

use super::ProcessOutput;
use super::ProcessRequest;
use super::ProcessRunner;
use crate::snapshot::FileSnapshot;

/// Environment variables passed through from the host to every sandboxed process.
const PASSTHROUGH_ENV_VARS: &[&str] = &["PATH", "HOME"];

/// Runs each process in a fresh temporary directory that only holds its input snapshot.
pub struct SandboxedProcessRunner {
  workspace_dir: PathBuf,
  temp_dir: PathBuf,
  passthrough_env: Vec<(String, String)>,
}

impl SandboxedProcessRunner {
  pub fn new(workspace_dir: PathBuf) -> Self {
    let passthrough_env = PASSTHROUGH_ENV_VARS
      .iter()
      .filter_map(|name| std::env::var(name).ok().map(|value| (name.to_string(), value)))
      .collect();
    SandboxedProcessRunner {
      workspace_dir,
      temp_dir: std::env::temp_dir(),
      passthrough_env,
    }
  }

  #[cfg(test)]
  fn with_temp_dir(mut self, temp_dir: PathBuf) -> Self {
    self.temp_dir = temp_dir;
    self
  }

  /// Relative executable paths (ex. `./bin/tool`) are relative to the workspace
  /// rather than the sandbox. Bare names are looked up on the `PATH`.
  fn resolve_program(&self, program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
      self.workspace_dir.join(path)
    } else {
      path.to_path_buf()
    }
  }
}

impl ProcessRunner for SandboxedProcessRunner {
  fn run(&self, request: ProcessRequest) -> LocalBoxFuture<'_, Result<ProcessOutput>> {
    async move {
      let Some(program) = request.argv.first() else {
        bail!("{}: the command is empty.", request.description);
      };
      let sandbox = tempfile::Builder::new().prefix("batchfmt-sandbox-").tempdir_in(&self.temp_dir)?;
      // the temp dir may be behind a symlink (ex. /var on macOS)
      let sandbox_dir = sandbox.path().canonicalize()?;
      materialize_snapshot(&sandbox_dir, &request.input)?;

      let mut command = tokio::process::Command::new(self.resolve_program(program));
      command
        .args(&request.argv[1..])
        .current_dir(&sandbox_dir)
        .env_clear()
        .envs(self.passthrough_env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .envs(request.env.iter())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
      let output = command.output().await.with_context(|| format!("Error starting `{}` ({})", program, request.description))?;

      let output_snapshot = capture_snapshot(&sandbox_dir, &request.output_files)?;
      let sandbox_prefixes = [format!("{}/", sandbox_dir.display()), format!("{}/", sandbox.path().display())];
      Ok(ProcessOutput {
        // killed by a signal when there's no code
        exit_code: output.status.code().unwrap_or(-1),
        stdout: strip_sandbox_paths(&output.stdout, &sandbox_prefixes),
        stderr: strip_sandbox_paths(&output.stderr, &sandbox_prefixes),
        output: output_snapshot,
      })
    }
    .boxed_local()
  }
}

fn materialize_snapshot(dir: &Path, snapshot: &FileSnapshot) -> Result<()> {
  for (file_path, content) in snapshot.files() {
    let target_path = dir.join(file_path);
    if let Some(parent) = target_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target_path, content).with_context(|| format!("Error writing {} to the sandbox", file_path))?;
  }
  Ok(())
}

/// Missing files are left out of the snapshot.
fn capture_snapshot(dir: &Path, file_paths: &[String]) -> Result<FileSnapshot> {
  let mut files = Vec::with_capacity(file_paths.len());
  for file_path in file_paths {
    let source_path = dir.join(file_path);
    if source_path.is_file() {
      let content = std::fs::read(&source_path).with_context(|| format!("Error reading {} from the sandbox", file_path))?;
      files.push((file_path.clone(), content));
    }
  }
  Ok(FileSnapshot::new(files))
}

fn strip_sandbox_paths(bytes: &[u8], sandbox_prefixes: &[String]) -> String {
  let mut text = String::from_utf8_lossy(bytes).into_owned();
  for prefix in sandbox_prefixes {
    text = text.replace(prefix.as_str(), "");
  }
  text
}
