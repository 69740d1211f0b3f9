use crate::environment::Environment;
use crate::formatters::FormatterRegistry;

pub fn output_version<TEnvironment: Environment>(environment: &TEnvironment) {
  environment.log(&format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
}

pub fn output_help<TEnvironment: Environment>(help_text: &str, environment: &TEnvironment) {
  environment.log(help_text);
}

/// Prints the registered formatters in execution order.
pub fn output_formatters<TEnvironment: Environment>(registry: &FormatterRegistry, environment: &TEnvironment) {
  if registry.is_empty() {
    environment.log("No formatters registered.");
    return;
  }
  for formatter in registry.iter() {
    if formatter.is_formatter() {
      environment.log(formatter.name());
    } else {
      environment.log(&format!("{} (not a formatter)", formatter.name()));
    }
  }
}
