//! Where the configuration file lives.
//!
//! The directory comes from [`dirs::config_dir`], with a `wavesynth`
//! subdirectory (`~/.config/wavesynth` on Linux).

use std::path::PathBuf;

const APP_DIR: &str = "wavesynth";

/// File name of the default configuration.
pub const CONFIG_FILE_NAME: &str = "wavesynth.toml";

/// Per-user configuration directory, or `./wavesynth` when the platform has none.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from(".").join(APP_DIR), |d| d.join(APP_DIR))
}

/// `wavesynth.toml` inside [`user_config_dir`].
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Create [`user_config_dir`] if it is missing and return it.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    Ok(dir)
}
