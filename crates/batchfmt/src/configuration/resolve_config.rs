use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

use super::ConfigFile;
use super::FormatterConfig;
use crate::environment::Environment;
use crate::planner::BatchSize;
use crate::targets::FmtTarget;
use crate::utils::FileMatcher;

#[derive(Debug)]
pub struct ResolvedConfig {
  pub batch_size: BatchSize,
  pub targets: Vec<Rc<FmtTarget>>,
  pub formatters: Vec<FormatterConfig>,
}

#[derive(Debug, Error)]
pub enum ResolveConfigError {
  #[error("No config file found at {config_path}. Did you mean to specify one (--config <path>)?")]
  NotFound { config_path: String },
  #[error("Error resolving config file {config_path}")]
  Invalid {
    config_path: String,
    #[source]
    inner: anyhow::Error,
  },
}

/// Reads the configuration file and resolves the target sources against the workspace files.
pub fn resolve_config<TEnvironment: Environment>(config_path: &str, workspace_files: &[String], environment: &TEnvironment) -> Result<ResolvedConfig, ResolveConfigError> {
  if !environment.path_exists(config_path) {
    return Err(ResolveConfigError::NotFound {
      config_path: config_path.to_string(),
    });
  }
  inner_resolve_config(config_path, workspace_files, environment).map_err(|inner| ResolveConfigError::Invalid {
    config_path: config_path.to_string(),
    inner,
  })
}

fn inner_resolve_config<TEnvironment: Environment>(config_path: &str, workspace_files: &[String], environment: &TEnvironment) -> Result<ResolvedConfig> {
  let text = environment.read_file(config_path)?;
  let config_file: ConfigFile = serde_json::from_str(&text).context("Error deserializing")?;
  let batch_size = BatchSize::new(config_file.batch_size.unwrap_or(BatchSize::DEFAULT_TARGET)).context("Invalid batchSize")?;

  let mut names = HashSet::new();
  let mut targets = Vec::with_capacity(config_file.targets.len());
  for target in config_file.targets {
    if !names.insert(target.name.clone()) {
      bail!("Target '{}' is declared more than once.", target.name);
    }
    let matcher = FileMatcher::new(&target.sources).with_context(|| format!("Invalid sources for target '{}'", target.name))?;
    let sources = workspace_files.iter().filter(|file| matcher.matches(file)).cloned().collect::<Vec<_>>();
    if sources.is_empty() {
      log_warn!(environment, "Target '{}' has no source files.", target.name);
    }
    targets.push(Rc::new(FmtTarget {
      address: target.name,
      fields: target.fields,
      sources,
    }));
  }

  Ok(ResolvedConfig {
    batch_size,
    targets,
    formatters: config_file.formatters,
  })
}
