use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::Digest;
use super::DigestBuilder;
use crate::environment::Environment;

/// An immutable, content addressed set of files.
///
/// Two snapshots are equal when their digests are equal. The digest is computed
/// over the sorted `(path, content)` pairs, so it doesn't depend on the order
/// the files were added in.
#[derive(Clone)]
pub struct FileSnapshot {
  digest: Digest,
  files: Arc<BTreeMap<String, Arc<[u8]>>>,
}

impl FileSnapshot {
  pub fn new(files: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
    Self::from_map(files.into_iter().map(|(path, content)| (path, Arc::from(content))).collect())
  }

  pub fn empty() -> Self {
    Self::from_map(BTreeMap::new())
  }

  fn from_map(files: BTreeMap<String, Arc<[u8]>>) -> Self {
    let mut builder = DigestBuilder::new();
    for (path, content) in files.iter() {
      builder.add_str(path).add_bytes(content);
    }
    FileSnapshot {
      digest: builder.finish(),
      files: Arc::new(files),
    }
  }

  /// Reads the provided workspace files into a snapshot.
  pub async fn from_workspace<TEnvironment: Environment>(environment: &TEnvironment, file_paths: &[String]) -> Result<Self> {
    let environment = environment.clone();
    let file_paths = file_paths.to_vec();
    // reading files is a big perf improvement on a blocking thread
    tokio::task::spawn_blocking(move || {
      let mut files = BTreeMap::new();
      for file_path in file_paths {
        let content = environment.read_file_bytes(&file_path)?;
        files.insert(file_path, Arc::from(content));
      }
      Ok::<_, anyhow::Error>(Self::from_map(files))
    })
    .await?
  }

  pub fn digest(&self) -> Digest {
    self.digest
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  pub fn contains(&self, file_path: &str) -> bool {
    self.files.contains_key(file_path)
  }

  pub fn get(&self, file_path: &str) -> Option<&[u8]> {
    self.files.get(file_path).map(|content| content.as_ref())
  }

  /// Paths in sorted order.
  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.files.keys().map(|path| path.as_str())
  }

  pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
    self.files.iter().map(|(path, content)| (path.as_str(), content.as_ref()))
  }

  /// If this snapshot holds exactly the provided paths.
  pub fn has_exact_paths(&self, file_paths: &[String]) -> bool {
    self.files.len() == file_paths.len() && file_paths.iter().all(|path| self.files.contains_key(path))
  }

  /// A snapshot restricted to the provided paths. Paths not in this snapshot are ignored.
  pub fn subset<'a>(&self, file_paths: impl IntoIterator<Item = &'a str>) -> FileSnapshot {
    let files = file_paths
      .into_iter()
      .filter_map(|path| self.files.get_key_value(path))
      .map(|(path, content)| (path.clone(), content.clone()))
      .collect();
    Self::from_map(files)
  }
}

impl PartialEq for FileSnapshot {
  fn eq(&self, other: &Self) -> bool {
    self.digest == other.digest
  }
}

impl Eq for FileSnapshot {}

impl fmt::Debug for FileSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FileSnapshot")
      .field("digest", &self.digest)
      .field("files", &self.files.keys().collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::environment::TestEnvironment;

  fn snapshot(files: &[(&str, &str)]) -> FileSnapshot {
    FileSnapshot::new(files.iter().map(|(path, text)| (path.to_string(), text.as_bytes().to_vec())))
  }

  #[test]
  fn equal_when_content_is_equal() {
    assert_eq!(snapshot(&[("a.rb", "1"), ("b.rb", "2")]), snapshot(&[("b.rb", "2"), ("a.rb", "1")]));
    assert_ne!(snapshot(&[("a.rb", "1")]), snapshot(&[("a.rb", "2")]));
    assert_ne!(snapshot(&[("a.rb", "1")]), snapshot(&[("b.rb", "1")]));
    assert_eq!(FileSnapshot::empty(), snapshot(&[]));
  }

  #[test]
  fn subset_and_exact_paths() {
    let snapshot = snapshot(&[("a.rb", "1"), ("b.rb", "2"), ("c.rb", "3")]);
    let subset = snapshot.subset(["a.rb", "c.rb", "missing.rb"]);
    assert_eq!(subset.paths().collect::<Vec<_>>(), vec!["a.rb", "c.rb"]);
    assert_eq!(subset.get("c.rb"), Some("3".as_bytes()));
    assert!(subset.has_exact_paths(&["c.rb".to_string(), "a.rb".to_string()]));
    assert!(!subset.has_exact_paths(&["a.rb".to_string()]));
    assert!(!subset.has_exact_paths(&["a.rb".to_string(), "b.rb".to_string()]));
  }

  #[tokio::test]
  async fn reads_from_workspace() {
    let environment = TestEnvironment::new();
    environment.write_file("a.rb", "1").write_file("b.rb", "2");
    let result = FileSnapshot::from_workspace(&environment, &["b.rb".to_string()]).await.unwrap();
    assert_eq!(result, snapshot(&[("b.rb", "2")]));

    let err = FileSnapshot::from_workspace(&environment, &["missing.rb".to_string()]).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not find file at path missing.rb");
  }
}
