#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

#[macro_use]
mod environment;

use environment::LogLevel;
use environment::RealEnvironment;
use environment::RealEnvironmentOptions;
use process::CachingProcessRunner;
use process::SandboxedProcessRunner;
use run_cli::AppError;
use std::rc::Rc;

mod arg_parser;
mod commands;
mod configuration;
mod executor;
mod fmt;
mod formatters;
mod invariant;
mod partition;
mod planner;
mod process;
mod reporter;
mod run_cli;
mod snapshot;
mod targets;
mod utils;
mod writer;

#[cfg(test)]
mod test_helpers;

fn main() {
  let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
    Ok(rt) => rt,
    Err(err) => {
      #[allow(clippy::print_stderr)]
      {
        eprintln!("Error creating the async runtime: {:#}", err);
      }
      std::process::exit(1);
    }
  };
  rt.block_on(async move {
    match run().await {
      Ok(_) => {}
      Err((err, log_level)) => {
        if log_level != LogLevel::Silent {
          let result = format!("{:#}", err.inner);
          #[allow(clippy::print_stderr)]
          if !result.is_empty() {
            eprintln!("{}", result);
          }
        }
        std::process::exit(err.exit_code);
      }
    }
  });
}

async fn run() -> Result<(), (AppError, LogLevel)> {
  let args = arg_parser::parse_args(std::env::args().collect()).map_err(|err| (err.into(), LogLevel::Info))?;

  let environment = std::env::current_dir()
    .map_err(anyhow::Error::from)
    .and_then(|root_dir| {
      RealEnvironment::new(RealEnvironmentOptions {
        root_dir,
        log_level: args.log_level,
      })
    })
    .map_err(|err| (err.into(), args.log_level))?;
  let runner = Rc::new(CachingProcessRunner::new(SandboxedProcessRunner::new(environment.root_dir().to_path_buf())));

  run_cli::run_cli(&args, &environment, runner).await.map_err(|err| (err, args.log_level))
}
