use crossterm::style::Stylize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::environment::Environment;
use crate::environment::LogLevel;
use crate::formatters::FmtResult;

/// Prints one summary line per tool, followed by the files it changed.
pub fn print_results<TEnvironment: Environment>(results: &[FmtResult], environment: &TEnvironment) {
  if environment.log_level() > LogLevel::Info {
    return;
  }
  for line in get_result_lines(results) {
    environment.log_stderr(&line);
  }
}

pub fn get_result_lines(results: &[FmtResult]) -> Vec<String> {
  let mut results_by_tool: BTreeMap<&str, Vec<&FmtResult>> = BTreeMap::new();
  for result in results {
    results_by_tool.entry(&result.formatter_name).or_default().push(result);
  }

  let mut lines = Vec::new();
  if !results_by_tool.is_empty() {
    lines.push(String::new());
  }
  for (tool, results) in results_by_tool {
    let mut changed = BTreeSet::new();
    let mut added = BTreeSet::new();
    let mut removed = BTreeSet::new();
    for result in results.iter().filter(|r| r.did_change()) {
      let diff = result.diff();
      changed.extend(diff.changed_files);
      added.extend(diff.added_files);
      removed.extend(diff.removed_files);
    }
    if results.iter().any(|r| r.did_change()) {
      lines.push(format!("{} {} made changes.", "+".yellow(), tool));
    } else {
      lines.push(format!("{} {} made no changes.", "✓".green(), tool));
    }
    for file in changed.iter().chain(added.iter()).chain(removed.iter()) {
      lines.push(format!("  {}", file));
    }
  }
  lines
}
