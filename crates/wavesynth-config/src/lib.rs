//! Configuration files for the wavesynth synthesizer.
//!
//! A single TOML file describes the output engine, the envelope, the
//! oscillator patch and the keyboard layout. Every section and field is
//! optional; anything left out takes the built-in default.
//!
//! # Example
//!
//! ```rust,no_run
//! use wavesynth_config::{SynthConfig, default_config_path, validate_config};
//!
//! let config = SynthConfig::load_or_default(default_config_path()).unwrap();
//! validate_config(&config).unwrap();
//!
//! let patch = config.patch.to_patch().unwrap();
//! let shape = config.envelope.to_shape();
//! println!("{} layers, attack {}s", patch.layers.len(), shape.attack_time);
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
#[cfg(feature = "std")]
pub mod paths;

/// Configuration validation.
pub mod validation;

pub use config::{
    EngineSettings, EnvelopeSettings, KeyboardSettings, LayerSettings, PatchSettings, SynthConfig,
};
pub use error::ConfigError;
#[cfg(feature = "std")]
pub use paths::{CONFIG_FILE_NAME, default_config_path, ensure_user_config_dir, user_config_dir};
pub use validation::{SUPPORTED_BIT_DEPTHS, ValidationError, ValidationResult, validate_config};
