mod resolve_config;
mod resolve_formatters;
mod types;

pub use resolve_config::*;
pub use resolve_formatters::*;
pub use types::*;
