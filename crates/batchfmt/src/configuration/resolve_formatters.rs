use std::rc::Rc;

use super::FormatterConfig;
use crate::formatters::CommandFormatter;
use crate::formatters::CommandFormatterOptions;
use crate::formatters::Formatter;
use crate::formatters::FormatterRegistry;
use crate::formatters::PartitionBy;
use crate::formatters::RegistrationError;
use crate::process::ProcessRunner;
use crate::targets::FileSelection;
use crate::targets::TargetSelector;
use crate::utils::FileMatcher;

/// Creates the formatter registry from the configured formatters, in the order they were declared.
pub fn resolve_formatters(configs: &[FormatterConfig], runner: Rc<dyn ProcessRunner>) -> Result<FormatterRegistry, RegistrationError> {
  let mut formatters: Vec<Rc<dyn Formatter>> = Vec::with_capacity(configs.len());
  for config in configs {
    let options = CommandFormatterOptions {
      name: config.name.clone(),
      command: config.command.clone(),
      env: config.env.clone(),
      selection: resolve_selection(config)?,
      partition_by: match &config.partition_by {
        Some(text) => Some(PartitionBy::parse(text).ok_or_else(|| invalid(config, format!("Unknown partitionBy '{}'. Expected none, extension, directory or field:<name>.", text)))?),
        None => None,
      },
      is_formatter: config.formatter,
    };
    formatters.push(Rc::new(CommandFormatter::new(options, runner.clone())?));
  }
  FormatterRegistry::new(formatters)
}

fn resolve_selection(config: &FormatterConfig) -> Result<FileSelection, RegistrationError> {
  let selects_targets = config.required_fields.is_some() || config.skip_field.is_some();
  match &config.files {
    Some(_) if selects_targets => Err(invalid(config, "Specify either files or requiredFields/skipField, not both.".to_string())),
    Some(patterns) => match FileMatcher::new(patterns) {
      Ok(matcher) => Ok(FileSelection::Files(matcher)),
      Err(err) => Err(invalid(config, format!("{:#}", err))),
    },
    None if selects_targets => Ok(FileSelection::Targets(TargetSelector {
      required_fields: config.required_fields.clone().unwrap_or_default(),
      skip_field: config.skip_field.clone(),
    })),
    None => Err(invalid(config, "Specify either files or requiredFields to select what to format.".to_string())),
  }
}

fn invalid(config: &FormatterConfig, message: String) -> RegistrationError {
  RegistrationError::InvalidFormatter {
    name: config.name.clone(),
    message,
  }
}
