mod builder;
mod document;
mod error;
mod executor;
mod frontmatter;
mod markdown;
mod paths;
pub mod pipeline;
mod render;
mod report;
mod reserved;
mod resolve;
pub mod source;
mod templates;

pub use builder::Builder;
pub use executor::{CancelSignal, cancel_channel};
pub use paths::base_path_from_config;
