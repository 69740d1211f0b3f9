use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Debug = 0,
  Info = 1,
  Warn = 2,
  Error = 3,
  Silent = 4,
}

impl LogLevel {
  pub fn from_name(name: &str) -> Option<LogLevel> {
    match name {
      "debug" => Some(LogLevel::Debug),
      "info" => Some(LogLevel::Info),
      "warn" => Some(LogLevel::Warn),
      "error" => Some(LogLevel::Error),
      "silent" => Some(LogLevel::Silent),
      _ => None,
    }
  }
}

/// Access to the workspace and the console.
///
/// All file paths are relative to the workspace root and use `/` separators.
pub trait Environment: Clone + Send + Sync + 'static {
  fn read_file_bytes(&self, file_path: &str) -> Result<Vec<u8>>;
  fn read_file(&self, file_path: &str) -> Result<String> {
    let bytes = self.read_file_bytes(file_path)?;
    Ok(String::from_utf8(bytes)?)
  }
  /// Writes to a temporary file then renames it over the destination.
  fn atomic_write_file_bytes(&self, file_path: &str, bytes: &[u8]) -> Result<()>;
  fn path_exists(&self, file_path: &str) -> bool;
  /// Every file in the workspace, sorted. Dotfiles are included while gitignored files and `.git` are not.
  fn list_files(&self) -> Result<Vec<String>>;
  /// Outputs to stdout.
  fn log(&self, text: &str);
  /// Outputs to stderr.
  fn log_stderr(&self, text: &str);
  fn log_level(&self) -> LogLevel;
  fn max_threads(&self) -> usize;
}

// use macros here so the expressions provided are only evaluated when the level is enabled
macro_rules! log_debug {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() <= $crate::environment::LogLevel::Debug {
      let mut text = String::from("[DEBUG] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_warn {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() <= $crate::environment::LogLevel::Warn {
      $environment.log_stderr(&format!($($arg)*));
    }
  }
}

macro_rules! log_error {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() <= $crate::environment::LogLevel::Error {
      $environment.log_stderr(&format!($($arg)*));
    }
  }
}
