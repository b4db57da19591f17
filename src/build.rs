mod builder;
mod escape;
mod paths;
mod render;
mod structured_data;

pub use builder::{Builder, StaleReason};
pub use paths::base_path_from_config;
