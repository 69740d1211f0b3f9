use anyhow::Result;
use anyhow::anyhow;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::Environment;
use super::LogLevel;

/// In-memory workspace that records everything logged.
#[derive(Clone)]
pub struct TestEnvironment {
  files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
  written_files: Arc<Mutex<Vec<String>>>,
  stdout_messages: Arc<Mutex<Vec<String>>>,
  stderr_messages: Arc<Mutex<Vec<String>>>,
  log_level: Arc<Mutex<LogLevel>>,
  max_threads: Arc<Mutex<usize>>,
}

impl Default for TestEnvironment {
  fn default() -> Self {
    Self::new()
  }
}

impl TestEnvironment {
  pub fn new() -> TestEnvironment {
    TestEnvironment {
      files: Default::default(),
      written_files: Default::default(),
      stdout_messages: Default::default(),
      stderr_messages: Default::default(),
      log_level: Arc::new(Mutex::new(LogLevel::Info)),
      max_threads: Arc::new(Mutex::new(4)),
    }
  }

  /// Adds a file to the workspace without recording it as written.
  pub fn write_file(&self, file_path: &str, text: &str) -> &Self {
    self.files.lock().insert(file_path.to_string(), text.as_bytes().to_vec());
    self
  }

  pub fn take_written_files(&self) -> Vec<String> {
    std::mem::take(&mut *self.written_files.lock())
  }

  pub fn take_stdout_messages(&self) -> Vec<String> {
    std::mem::take(&mut *self.stdout_messages.lock())
  }

  pub fn take_stderr_messages(&self) -> Vec<String> {
    std::mem::take(&mut *self.stderr_messages.lock())
  }

  pub fn set_log_level(&self, log_level: LogLevel) {
    *self.log_level.lock() = log_level;
  }

  pub fn set_max_threads(&self, value: usize) {
    *self.max_threads.lock() = value;
  }
}

impl Environment for TestEnvironment {
  fn read_file_bytes(&self, file_path: &str) -> Result<Vec<u8>> {
    self
      .files
      .lock()
      .get(file_path)
      .cloned()
      .ok_or_else(|| anyhow!("Could not find file at path {}", file_path))
  }

  fn atomic_write_file_bytes(&self, file_path: &str, bytes: &[u8]) -> Result<()> {
    self.files.lock().insert(file_path.to_string(), bytes.to_vec());
    self.written_files.lock().push(file_path.to_string());
    Ok(())
  }

  fn path_exists(&self, file_path: &str) -> bool {
    self.files.lock().contains_key(file_path)
  }

  fn list_files(&self) -> Result<Vec<String>> {
    Ok(self.files.lock().keys().cloned().collect())
  }

  fn log(&self, text: &str) {
    self.stdout_messages.lock().push(text.to_string());
  }

  fn log_stderr(&self, text: &str) {
    self.stderr_messages.lock().push(text.to_string());
  }

  fn log_level(&self) -> LogLevel {
    *self.log_level.lock()
  }

  fn max_threads(&self) -> usize {
    *self.max_threads.lock()
  }
}
