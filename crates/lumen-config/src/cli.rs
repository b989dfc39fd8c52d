//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, QualityMode};

/// Command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "lumen", about = "Dynamic lighting for chunked voxel worlds")]
pub struct CliArgs {
    /// Update cadence for dynamic lights.
    #[arg(long, value_enum)]
    pub quality: Option<QualityMode>,

    /// Enable or disable entity lighting.
    #[arg(long)]
    pub entity_lighting: Option<bool>,

    /// Enable or disable block-entity lighting.
    #[arg(long)]
    pub block_entity_lighting: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(quality) = args.quality {
            self.lighting.quality = quality;
        }
        if let Some(enabled) = args.entity_lighting {
            self.lighting.entity_lighting = enabled;
        }
        if let Some(enabled) = args.block_entity_lighting {
            self.lighting.block_entity_lighting = enabled;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
