use anyhow::Context;
use anyhow::Result;
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use super::Environment;
use super::LogLevel;

pub struct RealEnvironmentOptions {
  pub root_dir: PathBuf,
  pub log_level: LogLevel,
}

#[derive(Clone)]
pub struct RealEnvironment {
  root_dir: Arc<PathBuf>,
  output_lock: Arc<Mutex<()>>,
  log_level: LogLevel,
}

impl RealEnvironment {
  pub fn new(options: RealEnvironmentOptions) -> Result<Self> {
    let root_dir = options
      .root_dir
      .canonicalize()
      .with_context(|| format!("Error resolving workspace root {}", options.root_dir.display()))?;
    Ok(RealEnvironment {
      root_dir: Arc::new(root_dir),
      output_lock: Default::default(),
      log_level: options.log_level,
    })
  }

  pub fn root_dir(&self) -> &Path {
    &self.root_dir
  }

  fn resolve(&self, file_path: &str) -> PathBuf {
    self.root_dir.join(file_path)
  }
}

impl Environment for RealEnvironment {
  fn read_file_bytes(&self, file_path: &str) -> Result<Vec<u8>> {
    log_debug!(self, "Reading file: {}", file_path);
    std::fs::read(self.resolve(file_path)).with_context(|| format!("Error reading file {}", file_path))
  }

  fn atomic_write_file_bytes(&self, file_path: &str, bytes: &[u8]) -> Result<()> {
    log_debug!(self, "Writing file: {}", file_path);
    let resolved_path = self.resolve(file_path);
    let parent_dir = resolved_path.parent().unwrap_or(&self.root_dir);
    let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir).with_context(|| format!("Error creating temporary file for {}", file_path))?;
    temp_file.write_all(bytes)?;
    // keep the original file's permissions (ex. executable scripts)
    if let Ok(metadata) = std::fs::metadata(&resolved_path) {
      temp_file.as_file().set_permissions(metadata.permissions())?;
    }
    temp_file
      .persist(&resolved_path)
      .map_err(|err| err.error)
      .with_context(|| format!("Error writing file {}", file_path))?;
    Ok(())
  }

  fn path_exists(&self, file_path: &str) -> bool {
    self.resolve(file_path).exists()
  }

  fn list_files(&self) -> Result<Vec<String>> {
    let start_instant = std::time::Instant::now();
    let mut file_paths = Vec::new();
    // respects .gitignore files even outside a git repository and includes dotfiles
    let walker = ignore::WalkBuilder::new(self.root_dir.as_path())
      .require_git(false)
      .hidden(false)
      .filter_entry(|entry| entry.file_name() != ".git")
      .build();
    for entry in walker {
      let entry = entry?;
      if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
        continue;
      }
      let relative_path = entry.path().strip_prefix(self.root_dir.as_path())?;
      let components = relative_path.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>();
      file_paths.push(components.join("/"));
    }
    file_paths.sort();
    log_debug!(self, "Found {} files in {}ms", file_paths.len(), start_instant.elapsed().as_millis());
    Ok(file_paths)
  }

  fn log(&self, text: &str) {
    if self.log_level == LogLevel::Silent {
      return;
    }
    let _guard = self.output_lock.lock();
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", text);
  }

  fn log_stderr(&self, text: &str) {
    let _guard = self.output_lock.lock();
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", text);
  }

  fn log_level(&self) -> LogLevel {
    self.log_level
  }

  fn max_threads(&self) -> usize {
    resolve_max_threads(std::env::var("BATCHFMT_MAX_THREADS").ok(), std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1))
  }
}

fn resolve_max_threads(env_var: Option<String>, available_parallelism: usize) -> usize {
  match env_var.and_then(|value| value.trim().parse::<usize>().ok()) {
    Some(value) if value > 0 => value,
    _ => available_parallelism.max(1),
  }
}
