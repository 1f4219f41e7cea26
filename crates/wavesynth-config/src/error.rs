//! Configuration error type.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::ValidationError;

/// Everything that can go wrong between a config file and a [`crate::SynthConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    ReadFile {
        /// File that was being read.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: io::Error,
    },

    /// The config file could not be written.
    #[error("cannot write config file {}: {source}", path.display())]
    WriteFile {
        /// File that was being written.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: io::Error,
    },

    /// A parent directory for the config file could not be created.
    #[error("cannot create config directory {}: {source}", path.display())]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or does not match the config layout.
    #[error("config is not valid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The configuration could not be encoded as TOML.
    #[error("cannot encode config as TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Values parsed but are out of range or unknown.
    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    pub(crate) fn read_file(path: &Path, source: io::Error) -> Self {
        Self::ReadFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write_file(path: &Path, source: io::Error) -> Self {
        Self::WriteFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn create_dir(path: &Path, source: io::Error) -> Self {
        Self::CreateDir {
            path: path.to_path_buf(),
            source,
        }
    }
}
