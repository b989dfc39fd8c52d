//! Configuration for the dynamic lighting core.
//!
//! Settings persist to disk as RON files and can be overridden from the
//! command line via clap. Missing fields fall back to defaults so older
//! config files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, LightingConfig, QualityMode, default_config_dir};
pub use error::ConfigError;
