//! Configuration file discovery and media folder resolution
//!
//! Bootstrap settings come from a TOML file. A missing file is never fatal: the
//! service runs on built-in defaults. A file that exists but cannot be parsed is
//! a configuration error.
//!
//! Nothing here logs. The log level itself comes from the file, so the caller
//! reports what was found once tracing is up.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "IVI_CONFIG";

/// Environment variable naming the media folder
pub const MEDIA_FOLDER_ENV_VAR: &str = "IVI_MEDIA_FOLDER";

/// Find the configuration file following this priority order:
/// 1. Explicit path (command-line argument)
/// 2. `IVI_CONFIG` environment variable
/// 3. `<config_dir>/ivi/config.toml`
/// 4. `/etc/ivi/config.toml` (unix only)
///
/// Returns `None` when no candidate exists on disk.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return existing(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return existing(PathBuf::from(path));
    }

    if let Some(path) = dirs::config_dir().map(|d| d.join("ivi").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        return existing(PathBuf::from("/etc/ivi/config.toml"));
    }

    None
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

/// Parse the TOML file at `path` (as found by [`locate_config_file`]),
/// or return `T::default()` when there is none
pub fn load_toml<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Resolve the media folder following this priority order:
/// 1. Command-line argument
/// 2. `IVI_MEDIA_FOLDER` environment variable
/// 3. `media_folder` from the TOML config
/// 4. OS-dependent compiled default
pub fn resolve_media_folder(cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(MEDIA_FOLDER_ENV_VAR) {
        return PathBuf::from(path);
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default_media_folder()
}

/// OS-dependent default media folder (`<data_local_dir>/ivi/media`)
pub fn default_media_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ivi").join("media"))
        .unwrap_or_else(|| PathBuf::from("./media"))
}
