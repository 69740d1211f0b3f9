mod diff;
mod digest;
mod file_snapshot;
mod merge;

pub use diff::*;
pub use digest::*;
pub use file_snapshot::*;
pub use merge::*;
