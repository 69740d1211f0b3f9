use anyhow::Result;
use std::fmt;
use std::rc::Rc;

use crate::arg_parser::CliArgs;
use crate::arg_parser::ParseArgsError;
use crate::arg_parser::SubCommand;
use crate::commands;
use crate::commands::FormattersWouldChangeError;
use crate::configuration::ResolveConfigError;
use crate::configuration::resolve_config;
use crate::configuration::resolve_formatters;
use crate::environment::Environment;
use crate::fmt::WriteMode;
use crate::formatters::RegistrationError;
use crate::invariant::InvariantViolation;
use crate::process::ProcessRunner;

pub const CONFIG_ERROR_EXIT_CODE: i32 = 10;
pub const INVARIANT_VIOLATION_EXIT_CODE: i32 = 11;
pub const WOULD_CHANGE_EXIT_CODE: i32 = 20;

#[derive(Debug)]
pub struct AppError {
  pub inner: anyhow::Error,
  pub exit_code: i32,
}

impl fmt::Display for AppError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.inner, f)
  }
}

impl From<anyhow::Error> for AppError {
  fn from(inner: anyhow::Error) -> Self {
    let exit_code = if inner.downcast_ref::<FormattersWouldChangeError>().is_some() {
      WOULD_CHANGE_EXIT_CODE
    } else if inner.downcast_ref::<InvariantViolation>().is_some() {
      INVARIANT_VIOLATION_EXIT_CODE
    } else if inner.downcast_ref::<RegistrationError>().is_some() || inner.downcast_ref::<ResolveConfigError>().is_some() {
      CONFIG_ERROR_EXIT_CODE
    } else {
      1
    };
    AppError { inner, exit_code }
  }
}

impl From<ParseArgsError> for AppError {
  fn from(err: ParseArgsError) -> Self {
    AppError {
      inner: err.into(),
      exit_code: 1,
    }
  }
}

pub async fn run_cli<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, runner: Rc<dyn ProcessRunner>) -> Result<(), AppError> {
  Ok(inner_run_cli(args, environment, runner).await?)
}

async fn inner_run_cli<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, runner: Rc<dyn ProcessRunner>) -> Result<()> {
  let (cmd, write_mode) = match &args.sub_command {
    SubCommand::Help(help_text) => {
      commands::output_help(help_text, environment);
      return Ok(());
    }
    SubCommand::Version => {
      commands::output_version(environment);
      return Ok(());
    }
    SubCommand::List => {
      let workspace_files = environment.list_files()?;
      let config = resolve_config(&args.config, &workspace_files, environment)?;
      let registry = resolve_formatters(&config.formatters, runner)?;
      commands::output_formatters(&registry, environment);
      return Ok(());
    }
    SubCommand::Fmt(cmd) => (cmd, WriteMode::Write),
    SubCommand::Check(cmd) => (cmd, WriteMode::Check),
  };

  let workspace_files = environment.list_files()?;
  let config = resolve_config(&args.config, &workspace_files, environment)?;
  let registry = resolve_formatters(&config.formatters, runner)?;
  commands::format(cmd, write_mode, &config, &registry, &workspace_files, environment).await
}
