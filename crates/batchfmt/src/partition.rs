use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::formatters::Formatter;
use crate::targets::FileSelection;
use crate::targets::FmtTarget;

/// Opaque tool specific data shared by every file of a partition (ex. an interpreter version).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionMetadata(Option<String>);

impl PartitionMetadata {
  pub fn new(value: impl Into<String>) -> Self {
    PartitionMetadata(Some(value.into()))
  }

  pub fn none() -> Self {
    PartitionMetadata(None)
  }

  /// Text to display after a tool name in log messages.
  pub fn description(&self) -> String {
    match &self.0 {
      Some(value) => format!(" ({})", value),
      None => String::new(),
    }
  }
}

impl fmt::Display for PartitionMetadata {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.as_deref().unwrap_or(""))
  }
}

/// Files a formatter processes as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
  pub files: Vec<String>,
  pub metadata: PartitionMetadata,
}

pub type Partitions = Vec<Partition>;

#[derive(Debug, Clone)]
pub struct SelectedTarget {
  pub target: Rc<FmtTarget>,
  /// The target's sources that were requested.
  pub files: Vec<String>,
}

/// What a formatter's partitioner receives.
#[derive(Debug, Clone)]
pub enum PartitionInput {
  Targets(Vec<SelectedTarget>),
  Files(Vec<String>),
}

impl PartitionInput {
  pub fn is_empty(&self) -> bool {
    match self {
      PartitionInput::Targets(targets) => targets.is_empty(),
      PartitionInput::Files(files) => files.is_empty(),
    }
  }

  /// Every file of the input, sorted and deduplicated.
  pub fn all_files(&self) -> Vec<String> {
    let files: BTreeSet<&String> = match self {
      PartitionInput::Targets(targets) => targets.iter().flat_map(|t| t.files.iter()).collect(),
      PartitionInput::Files(files) => files.iter().collect(),
    };
    files.into_iter().cloned().collect()
  }
}

/// One partition holding every file with no metadata.
pub fn default_partitions(input: &PartitionInput) -> Partitions {
  let files = input.all_files();
  if files.is_empty() {
    Vec::new()
  } else {
    vec![Partition {
      files,
      metadata: PartitionMetadata::none(),
    }]
  }
}

/// Collects the input handed to a formatter's partitioner from the requested files.
pub fn get_partition_input<TEnvironment: Environment>(
  formatter: &dyn Formatter,
  targets: &[Rc<FmtTarget>],
  requested_files: &HashSet<&str>,
  environment: &TEnvironment,
) -> PartitionInput {
  match formatter.selection() {
    FileSelection::Targets(selector) => {
      let mut selected = Vec::new();
      for target in targets {
        if !selector.is_applicable(target) {
          continue;
        }
        if selector.opt_out(target) {
          log_debug!(environment, "Skipping {} for {} (opted out).", formatter.name(), target.address);
          continue;
        }
        let files = target
          .sources
          .iter()
          .filter(|file| requested_files.contains(file.as_str()))
          .cloned()
          .collect::<Vec<_>>();
        if !files.is_empty() {
          selected.push(SelectedTarget { target: target.clone(), files });
        }
      }
      PartitionInput::Targets(selected)
    }
    FileSelection::Files(matcher) => {
      let mut files = requested_files.iter().filter(|file| matcher.matches(file)).map(|file| file.to_string()).collect::<Vec<_>>();
      files.sort();
      PartitionInput::Files(files)
    }
  }
}

/// Runs the partitioner of every formatter concurrently.
///
/// The returned list is in the order of the provided formatters.
pub async fn get_partitions_by_formatter<TEnvironment: Environment>(
  formatters: &[Rc<dyn Formatter>],
  targets: &[Rc<FmtTarget>],
  requested_files: &[String],
  environment: &TEnvironment,
) -> Result<Vec<(Rc<dyn Formatter>, Partitions)>> {
  let requested_files = requested_files.iter().map(|file| file.as_str()).collect::<HashSet<_>>();
  let futures = formatters.iter().map(|formatter| {
    let input = get_partition_input(formatter.as_ref(), targets, &requested_files, environment);
    async move {
      if input.is_empty() {
        return Ok::<_, anyhow::Error>((formatter.clone(), Vec::new()));
      }
      let partitions = formatter.partition(input).await?;
      log_debug!(
        environment,
        "{} partitions for {}: {}",
        partitions.len(),
        formatter.name(),
        partitions.iter().map(|p| p.files.len().to_string()).collect::<Vec<_>>().join(", ")
      );
      Ok::<_, anyhow::Error>((formatter.clone(), partitions))
    }
  });
  join_all(futures).await.into_iter().collect()
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;
  use crate::environment::TestEnvironment;
  use crate::targets::TargetSelector;
  use crate::test_helpers::TestFormatter;
  use crate::test_helpers::test_target;

  fn files(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
  }

  #[tokio::test]
  async fn default_partitioner_makes_single_partition_of_requested_sources() {
    let environment = TestEnvironment::new();
    let formatter: Rc<dyn Formatter> = Rc::new(TestFormatter::upper_case("rubocop").with_targets(TargetSelector {
      required_fields: files(&["rubySource"]),
      skip_field: Some("skipRubocop".to_string()),
    }));
    let targets = vec![
      Rc::new(test_target("app", json!({ "rubySource": true }), &["app/b.rb", "app/a.rb"])),
      Rc::new(test_target("lib", json!({ "rubySource": true, "skipRubocop": true }), &["lib/c.rb"])),
      Rc::new(test_target("py", json!({ "pythonSource": true }), &["py/d.py"])),
      Rc::new(test_target("other", json!({ "rubySource": true }), &["other/e.rb"])),
    ];
    let requested = files(&["app/a.rb", "app/b.rb", "lib/c.rb", "py/d.py"]);
    let result = get_partitions_by_formatter(&[formatter], &targets, &requested, &environment).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(
      result[0].1,
      vec![Partition {
        files: files(&["app/a.rb", "app/b.rb"]),
        metadata: PartitionMetadata::none(),
      }]
    );
  }

  #[tokio::test]
  async fn file_selection_matches_requested_files() {
    let environment = TestEnvironment::new();
    let formatter: Rc<dyn Formatter> = Rc::new(TestFormatter::upper_case("prettier").with_files(&["*.js"]));
    let requested = files(&["b.js", "a.js", "c.rb"]);
    let result = get_partitions_by_formatter(&[formatter], &[], &requested, &environment).await.unwrap();
    assert_eq!(
      result[0].1,
      vec![Partition {
        files: files(&["a.js", "b.js"]),
        metadata: PartitionMetadata::none(),
      }]
    );
  }

  #[tokio::test]
  async fn no_matching_files_gives_no_partitions() {
    let environment = TestEnvironment::new();
    let formatter: Rc<dyn Formatter> = Rc::new(TestFormatter::upper_case("prettier").with_files(&["*.js"]));
    let result = get_partitions_by_formatter(&[formatter], &[], &files(&["a.rb"]), &environment).await.unwrap();
    assert!(result[0].1.is_empty());
  }

  #[test]
  fn metadata_description() {
    assert_eq!(PartitionMetadata::new("3.1").description(), " (3.1)");
    assert_eq!(PartitionMetadata::none().description(), "");
  }
}
