use anyhow::Result;
use anyhow::bail;
use clap::ArgMatches;
use thiserror::Error;

use crate::environment::LogLevel;

pub const DEFAULT_CONFIG_FILE_NAME: &str = "batchfmt.json";

pub struct CliArgs {
  pub sub_command: SubCommand,
  pub log_level: LogLevel,
  pub config: String,
}

impl CliArgs {
  fn new_with_sub_command(sub_command: SubCommand) -> CliArgs {
    CliArgs {
      sub_command,
      log_level: LogLevel::Info,
      config: DEFAULT_CONFIG_FILE_NAME.to_string(),
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubCommand {
  Fmt(FmtSubCommand),
  Check(FmtSubCommand),
  List,
  Version,
  Help(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FmtSubCommand {
  pub file_patterns: Vec<String>,
  pub only: Vec<String>,
  pub batch_size: Option<usize>,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseArgsError(#[from] anyhow::Error);

pub fn parse_args(args: Vec<String>) -> Result<CliArgs, ParseArgsError> {
  inner_parse_args(args).map_err(ParseArgsError)
}

fn inner_parse_args(args: Vec<String>) -> Result<CliArgs> {
  if args.len() == 1 || (args.len() == 2 && (args[1] == "help" || args[1] == "--help")) {
    let mut cli_parser = create_cli_parser();
    let help_text = format!("{}", cli_parser.render_help());
    return Ok(CliArgs::new_with_sub_command(SubCommand::Help(help_text)));
  } else if args.len() == 2 && (args[1] == "-v" || args[1] == "-V" || args[1] == "--version") {
    return Ok(CliArgs::new_with_sub_command(SubCommand::Version));
  }

  let matches = create_cli_parser().try_get_matches_from(&args)?;
  let sub_command = match matches.subcommand() {
    Some(("fmt", matches)) => SubCommand::Fmt(parse_fmt_sub_command(matches)?),
    Some(("check", matches)) => SubCommand::Check(parse_fmt_sub_command(matches)?),
    Some(("list", _)) => SubCommand::List,
    _ => unreachable!(),
  };

  Ok(CliArgs {
    sub_command,
    log_level: parse_log_level(&matches)?,
    config: matches
      .get_one::<String>("config")
      .map(String::from)
      .unwrap_or_else(|| DEFAULT_CONFIG_FILE_NAME.to_string()),
  })
}

fn parse_fmt_sub_command(matches: &ArgMatches) -> Result<FmtSubCommand> {
  let batch_size = match matches.get_one::<String>("batch-size") {
    Some(value) => match value.parse::<usize>() {
      Ok(0) | Err(_) => bail!("Expected a positive number for --batch-size, but got '{}'.", value),
      Ok(value) => Some(value),
    },
    None => None,
  };
  Ok(FmtSubCommand {
    file_patterns: values_to_vec(matches.get_many("files")),
    only: values_to_vec(matches.get_many("only")),
    batch_size,
  })
}

fn parse_log_level(matches: &ArgMatches) -> Result<LogLevel> {
  if matches.get_flag("verbose") {
    return Ok(LogLevel::Debug);
  }
  match matches.get_one::<String>("log-level") {
    Some(name) => match LogLevel::from_name(name) {
      Some(log_level) => Ok(log_level),
      None => bail!("Unknown log level '{}'. Expected one of: debug, info, warn, error, silent.", name),
    },
    None => Ok(LogLevel::Info),
  }
}

fn values_to_vec(values: Option<clap::parser::ValuesRef<String>>) -> Vec<String> {
  values.map(|x| x.map(std::string::ToString::to_string).collect()).unwrap_or_default()
}

pub fn create_cli_parser() -> clap::Command {
  use clap::Arg;
  use clap::Command;

  Command::new("batchfmt")
    .bin_name("batchfmt")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Runs source code formatters over a workspace in disjoint, concurrent batches.")
    .subcommand_required(true)
    .override_usage("batchfmt <SUBCOMMAND> [OPTIONS] [--] [file patterns]...")
    .after_help(
      r#"ENVIRONMENT VARIABLES:
  BATCHFMT_MAX_THREADS  Limit the number of batches formatted at the same
                        time (ex. BATCHFMT_MAX_THREADS=4).

EXAMPLES:
  Format every file in the workspace:

    batchfmt fmt

  Only run one formatter over the Ruby files:

    batchfmt fmt --only rubocop "**/*.rb"

  Check for files the formatters would change:

    batchfmt check"#,
    )
    .subcommand(
      Command::new("fmt")
        .about("Runs the formatters and writes the changes to the file system.")
        .add_fmt_args(),
    )
    .subcommand(
      Command::new("check")
        .about("Runs the formatters without writing and fails if any would make changes.")
        .add_fmt_args(),
    )
    .subcommand(Command::new("list").about("Lists the registered formatters in the order they run."))
    .arg(
      Arg::new("config")
        .long("config")
        .short('c')
        .help("Path to the JSON configuration file. Defaults to batchfmt.json in the current directory.")
        .global(true)
        .num_args(1),
    )
    .arg(
      Arg::new("verbose")
        .long("verbose")
        .help("Prints additional diagnostic information.")
        .global(true)
        .action(clap::ArgAction::SetTrue),
    )
    .arg(
      Arg::new("log-level")
        .long("log-level")
        .value_name("level")
        .help("One of: debug, info, warn, error, silent.")
        .global(true)
        .num_args(1),
    )
}

trait ClapExtensions {
  fn add_fmt_args(self) -> Self;
}

impl ClapExtensions for clap::Command {
  fn add_fmt_args(self) -> Self {
    use clap::Arg;
    self
      .arg(
        Arg::new("files")
          .help("List of file patterns in quotes to format. Formats every file in the workspace when not provided.")
          .num_args(1..),
      )
      .arg(
        Arg::new("only")
          .long("only")
          .value_name("formatter")
          .help("Only run the provided formatter. May be specified more than once.")
          .action(clap::ArgAction::Append),
      )
      .arg(
        Arg::new("batch-size")
          .long("batch-size")
          .value_name("count")
          .help("Target number of files per batch.")
          .num_args(1),
      )
  }
}
