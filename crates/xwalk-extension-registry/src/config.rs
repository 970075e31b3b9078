use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Suffix marking a directory as an extension bundle.
pub const DEFAULT_PACKAGE_EXTENSION: &str = "framework";
/// Manifest key holding the extension-name to class-name table.
pub const DEFAULT_METADATA_KEY: &str = "XWalkExtensions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory scanned at construction. `None` selects
    /// [`default_extensions_dir`].
    pub extensions_dir: Option<PathBuf>,
    pub package_extension: String,
    pub metadata_key: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            extensions_dir: None,
            package_extension: DEFAULT_PACKAGE_EXTENSION.to_string(),
            metadata_key: DEFAULT_METADATA_KEY.to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn with_extensions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extensions_dir = Some(dir.into());
        self
    }

    /// Read a configuration from a JSON file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The directory the registry scans on construction, if one can be derived.
    pub fn scan_dir(&self) -> Option<PathBuf> {
        self.extensions_dir.clone().or_else(default_extensions_dir)
    }
}

/// Private extension directory of the running executable.
///
/// On macOS this is the `Frameworks` directory of the application bundle
/// (`Contents/MacOS/<exe>` → `Contents/Frameworks`); elsewhere it is a
/// `Frameworks` directory beside the executable. When the executable path is
/// unavailable the per-user data directory is used instead.
pub fn default_extensions_dir() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match exe_dir {
        Some(dir) if cfg!(target_os = "macos") => {
            Some(dir.parent().unwrap_or(dir.as_path()).join("Frameworks"))
        }
        Some(dir) => Some(dir.join("Frameworks")),
        None => dirs::data_local_dir().map(|dir| dir.join("xwalk").join("Frameworks")),
    }
}
