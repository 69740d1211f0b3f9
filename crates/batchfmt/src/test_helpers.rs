use anyhow::Result;
use anyhow::bail;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::arg_parser::parse_args;
use crate::environment::TestEnvironment;
use crate::formatters::FmtBatch;
use crate::formatters::FmtResult;
use crate::formatters::Formatter;
use crate::formatters::PartitionerType;
use crate::process::ProcessOutput;
use crate::process::ProcessRequest;
use crate::process::ProcessRunner;
use crate::run_cli::AppError;
use crate::run_cli::run_cli;
use crate::snapshot::FileSnapshot;
use crate::targets::FileSelection;
use crate::targets::FmtTarget;
use crate::targets::TargetSelector;
use crate::utils::FileMatcher;

pub fn test_target(address: &str, fields: serde_json::Value, sources: &[&str]) -> FmtTarget {
  FmtTarget {
    address: address.to_string(),
    fields: serde_json::from_value(fields).unwrap(),
    sources: sources.iter().map(|s| s.to_string()).collect(),
  }
}

/// An in-process formatter that transforms the text of every file it's given.
pub struct TestFormatter {
  name: String,
  transform: fn(&str) -> String,
  selection: FileSelection,
  partitioner_type: PartitionerType,
  is_formatter: bool,
  fails: bool,
  fail_on_file: Option<String>,
  added_file: Option<String>,
  removed_file: Option<String>,
  stdout: String,
  invocations: RefCell<Vec<Vec<String>>>,
  inputs: RefCell<Vec<FileSnapshot>>,
  active: Cell<usize>,
  max_active: Cell<usize>,
}

impl TestFormatter {
  fn new(name: &str, transform: fn(&str) -> String) -> Self {
    TestFormatter {
      name: name.to_string(),
      transform,
      selection: FileSelection::Targets(TargetSelector::default()),
      partitioner_type: PartitionerType::Default,
      is_formatter: true,
      fails: false,
      fail_on_file: None,
      added_file: None,
      removed_file: None,
      stdout: String::new(),
      invocations: Default::default(),
      inputs: Default::default(),
      active: Default::default(),
      max_active: Default::default(),
    }
  }

  pub fn upper_case(name: &str) -> Self {
    Self::new(name, |text| text.to_uppercase())
  }

  pub fn lower_case(name: &str) -> Self {
    Self::new(name, |text| text.to_lowercase())
  }

  /// Indents the lines between a `def` and its `end` by two spaces per level.
  pub fn indent(name: &str) -> Self {
    Self::new(name, |text| {
      let mut depth = 0usize;
      let mut lines = Vec::new();
      for line in text.split('\n') {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        if lower == "end" {
          depth = depth.saturating_sub(1);
        }
        if trimmed.is_empty() {
          lines.push(String::new());
        } else {
          lines.push(format!("{}{}", "  ".repeat(depth), trimmed));
        }
        if lower.starts_with("def ") {
          depth += 1;
        }
      }
      lines.join("\n")
    })
  }

  /// Appends a marker line so the order formatters ran in shows up in the output.
  pub fn append_marker(name: &str) -> Self {
    Self::new(name, |text| format!("{}|", text))
  }

  pub fn with_targets(mut self, selector: TargetSelector) -> Self {
    self.selection = FileSelection::Targets(selector);
    self
  }

  /// Selects files by the patterns and partitions them into one partition.
  pub fn with_files(mut self, patterns: &[&str]) -> Self {
    let patterns = patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    self.selection = FileSelection::Files(FileMatcher::new(&patterns).unwrap());
    self.partitioner_type = PartitionerType::Custom;
    self
  }

  pub fn with_default_partitioner(mut self) -> Self {
    self.partitioner_type = PartitionerType::Default;
    self
  }

  pub fn not_a_formatter(mut self) -> Self {
    self.is_formatter = false;
    self
  }

  pub fn failing(mut self) -> Self {
    self.fails = true;
    self
  }

  pub fn failing_on(mut self, file_path: &str) -> Self {
    self.fail_on_file = Some(file_path.to_string());
    self
  }

  pub fn adding_file(mut self, file_path: &str) -> Self {
    self.added_file = Some(file_path.to_string());
    self
  }

  pub fn removing_file(mut self, file_path: &str) -> Self {
    self.removed_file = Some(file_path.to_string());
    self
  }

  pub fn with_stdout(mut self, stdout: &str) -> Self {
    self.stdout = stdout.to_string();
    self
  }

  pub fn invocation_count(&self) -> usize {
    self.invocations.borrow().len()
  }

  /// The files of each invocation, in the order they happened.
  pub fn invocations(&self) -> Vec<Vec<String>> {
    self.invocations.borrow().clone()
  }

  pub fn inputs(&self) -> Vec<FileSnapshot> {
    self.inputs.borrow().clone()
  }

  /// The most invocations that were running at the same time.
  pub fn max_active(&self) -> usize {
    self.max_active.get()
  }
}

impl Formatter for TestFormatter {
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
    self.partitioner_type
  }

  fn format(&self, batch: FmtBatch) -> LocalBoxFuture<'_, Result<FmtResult>> {
    async move {
      self.invocations.borrow_mut().push(batch.files.clone());
      self.inputs.borrow_mut().push(batch.snapshot.clone());
      self.active.set(self.active.get() + 1);
      self.max_active.set(self.max_active.get().max(self.active.get()));
      tokio::task::yield_now().await;
      self.active.set(self.active.get() - 1);

      let fails_on_file = self.fail_on_file.as_ref().map(|file| batch.files.contains(file)).unwrap_or(false);
      if self.fails || fails_on_file {
        bail!("{} failed.", self.name);
      }

      let mut files = batch
        .snapshot
        .files()
        .map(|(path, content)| (path.to_string(), (self.transform)(&String::from_utf8_lossy(content)).into_bytes()))
        .collect::<Vec<_>>();
      if let Some(added_file) = &self.added_file {
        files.push((added_file.clone(), Vec::new()));
      }
      if let Some(removed_file) = &self.removed_file {
        files.retain(|(path, _)| path != removed_file);
      }
      Ok(FmtResult {
        input: batch.snapshot,
        output: FileSnapshot::new(files),
        stdout: self.stdout.clone(),
        stderr: String::new(),
        formatter_name: self.name.clone(),
      })
    }
    .boxed_local()
  }
}

/// Records every request and returns the input files, replaced by any configured output.
#[derive(Default)]
pub struct FakeProcessRunner {
  outputs: RefCell<HashMap<String, String>>,
  failure: RefCell<Option<(i32, String)>>,
  requests: RefCell<Vec<ProcessRequest>>,
}

impl FakeProcessRunner {
  pub fn set_output(&self, file_path: &str, text: &str) {
    self.outputs.borrow_mut().insert(file_path.to_string(), text.to_string());
  }

  pub fn set_exit_code(&self, exit_code: i32, stderr: &str) {
    *self.failure.borrow_mut() = Some((exit_code, stderr.to_string()));
  }

  pub fn take_requests(&self) -> Vec<ProcessRequest> {
    std::mem::take(&mut *self.requests.borrow_mut())
  }
}

impl ProcessRunner for FakeProcessRunner {
  fn run(&self, request: ProcessRequest) -> LocalBoxFuture<'_, Result<ProcessOutput>> {
    async move {
      let (exit_code, stderr) = self.failure.borrow().clone().unwrap_or((0, String::new()));
      let files = {
        let outputs = self.outputs.borrow();
        request
          .output_files
          .iter()
          .filter_map(|path| match outputs.get(path) {
            Some(text) => Some((path.clone(), text.as_bytes().to_vec())),
            None => request.input.get(path).map(|content| (path.clone(), content.to_vec())),
          })
          .collect::<Vec<_>>()
      };
      self.requests.borrow_mut().push(request);
      Ok(ProcessOutput {
        exit_code,
        stdout: String::new(),
        stderr,
        output: FileSnapshot::new(files),
      })
    }
    .boxed_local()
  }
}

#[derive(Debug, Error)]
#[error("{inner:#}")]
pub struct TestAppError {
  asserted_exit_code: Cell<bool>,
  inner: AppError,
}

impl TestAppError {
  #[track_caller]
  pub fn assert_exit_code(&self, exit_code: i32) {
    self.asserted_exit_code.set(true);
    assert_eq!(self.inner.exit_code, exit_code);
  }
}

impl From<AppError> for TestAppError {
  fn from(inner: AppError) -> Self {
    Self {
      asserted_exit_code: Default::default(),
      inner,
    }
  }
}

impl Drop for TestAppError {
  fn drop(&mut self) {
    if std::thread::panicking() || self.inner.exit_code <= 1 {
      return;
    }
    if !self.asserted_exit_code.get() {
      panic!("Exit code must be asserted. Was: {}", self.inner.exit_code);
    }
  }
}

pub async fn run_test_cli(args: Vec<&str>, environment: &TestEnvironment, runner: Rc<FakeProcessRunner>) -> Result<(), TestAppError> {
  let mut args: Vec<String> = args.into_iter().map(String::from).collect();
  args.insert(0, String::from(""));
  let args = parse_args(args).map_err(AppError::from)?;
  environment.set_log_level(args.log_level);
  run_cli(&args, environment, runner).await?;
  Ok(())
}
