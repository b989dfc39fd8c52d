//! Errors raised while persisting `config.ron`.

use std::io;
use std::path::{Path, PathBuf};

/// A failed load, save, or reload, naming the file involved where there is one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write config file {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not valid RON for [`crate::Config`].
    #[error("failed to parse config file {}: {source}", .path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),
}

impl ConfigError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self::ReadError {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Self::WriteError {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, source: ron::error::SpannedError) -> Self {
        Self::ParseError {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file or directory the failed operation touched.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ReadError { path, .. }
            | Self::WriteError { path, .. }
            | Self::ParseError { path, .. } => Some(path),
            Self::SerializeError(_) => None,
        }
    }
}
