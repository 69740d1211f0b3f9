use anyhow::Context;
use anyhow::Result;
use ignore::overrides::Override;
use ignore::overrides::OverrideBuilder;

/// Matches workspace relative paths against gitignore style globs.
///
/// A pattern without a slash matches at any depth (ex. `*.rb`), while a
/// pattern with one is anchored to the workspace root (ex. `app/**/*.rb`).
/// Patterns starting with `!` exclude.
pub struct FileMatcher {
  overrides: Override,
}

impl FileMatcher {
  pub fn new(patterns: &[String]) -> Result<Self> {
    let mut builder = OverrideBuilder::new("/");
    for pattern in patterns {
      builder.add(pattern).with_context(|| format!("Error parsing glob pattern '{}'", pattern))?;
    }
    Ok(FileMatcher {
      overrides: builder.build().context("Error building glob patterns")?,
    })
  }

  pub fn matches(&self, file_path: &str) -> bool {
    self.overrides.matched(file_path, false).is_whitelist()
  }
}
