//! Configuration loading and resolution.
mod apply;
mod loader;
pub mod types;


pub use apply::resolve_config;
pub use loader::load_config;

#[cfg(test)]
pub(crate) use loader::load_config_file;
