mod file_matcher;
mod get_bytes_hash;
mod partition_sequentially;

pub use file_matcher::*;
pub use get_bytes_hash::*;
pub use partition_sequentially::*;

pub fn pluralize(count: usize, word: &str) -> String {
  if count == 1 { format!("{} {}", count, word) } else { format!("{} {}s", count, word) }
}
