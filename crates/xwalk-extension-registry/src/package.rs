use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Map, Value};
use xwalk_extension_sdk::ExtensionModule;

use crate::error::RegistryError;
use crate::loader::PackageLoader;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// A bundle directory discovered on disk.
    Bundle,
    /// The running process; owns the built-in extensions.
    Host,
}

/// Class table of a loaded package plus the library that holds its code.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    module: Arc<ExtensionModule>,
    library: Option<Arc<Library>>,
}

impl LoadedModule {
    pub fn new(module: ExtensionModule) -> Self {
        Self {
            module: Arc::new(module),
            library: None,
        }
    }

    pub fn with_library(module: ExtensionModule, library: Library) -> Self {
        Self {
            module: Arc::new(module),
            library: Some(Arc::new(library)),
        }
    }

    pub fn module(&self) -> &ExtensionModule {
        &self.module
    }

    pub fn library(&self) -> Option<&Arc<Library>> {
        self.library.as_ref()
    }
}

#[derive(Debug, Deserialize)]
struct BundleManifest {
    executable: Option<String>,
    #[serde(flatten)]
    info: Map<String, Value>,
}

/// A loadable code unit: an extension bundle or the host process.
///
/// The load state moves from unloaded to loaded at most once and never back.
pub struct Package {
    kind: PackageKind,
    path: PathBuf,
    executable: Option<PathBuf>,
    info: Map<String, Value>,
    module: Mutex<Option<LoadedModule>>,
}

impl Package {
    /// Open the bundle directory at `path` by reading its manifest.
    ///
    /// The manifest is looked up as `manifest.json` and then
    /// `Contents/manifest.json`. The executable is resolved relative to the
    /// manifest directory; without an `executable` entry the platform library
    /// name of the bundle stem is assumed (`Foo.framework` → `libFoo.so`).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(RegistryError::NotAPackage(path.to_path_buf()));
        }
        let manifest_path = find_manifest(path)
            .ok_or_else(|| RegistryError::NotAPackage(path.to_path_buf()))?;
        let raw = fs::read_to_string(&manifest_path)?;
        let manifest: BundleManifest = serde_json::from_str(&raw)?;

        let base = manifest_path.parent().unwrap_or(path);
        let executable = match manifest.executable {
            Some(name) => base.join(name),
            None => {
                let stem = path.file_stem().unwrap_or_else(|| OsStr::new("extension"));
                base.join(libloading::library_filename(stem))
            }
        };

        Ok(Self {
            kind: PackageKind::Bundle,
            path: path.to_path_buf(),
            executable: Some(executable),
            info: manifest.info,
            module: Mutex::new(None),
        })
    }

    /// The host process package. It starts out loaded with `module`.
    pub fn host(module: ExtensionModule) -> Self {
        let executable = std::env::current_exe().ok();
        let path = executable
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            kind: PackageKind::Host,
            path,
            executable,
            info: Map::new(),
            module: Mutex::new(Some(LoadedModule::new(module))),
        }
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn executable_path(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    /// File stem of the executable without the platform library prefix
    /// (`libFoo.so` → `Foo`).
    pub fn executable_name(&self) -> Option<&str> {
        let stem = self.executable.as_deref()?.file_stem()?.to_str()?;
        Some(
            stem.strip_prefix(std::env::consts::DLL_PREFIX)
                .filter(|name| !name.is_empty())
                .unwrap_or(stem),
        )
    }

    /// Manifest value stored under `key`.
    pub fn info(&self, key: &str) -> Option<&Value> {
        self.info.get(key)
    }

    pub fn is_loaded(&self) -> bool {
        self.module.lock().is_some()
    }

    /// Return the loaded module, running `loader` if this is the first
    /// successful load. Failures leave the package unloaded.
    pub fn load_with(&self, loader: &dyn PackageLoader) -> Result<LoadedModule, RegistryError> {
        let mut state = self.module.lock();
        if let Some(loaded) = state.as_ref() {
            return Ok(loaded.clone());
        }
        let loaded = loader.load(self)?;
        tracing::debug!(
            path = %self.path.display(),
            classes = loaded.module().len(),
            "loaded extension bundle"
        );
        *state = Some(loaded.clone());
        Ok(loaded)
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("executable", &self.executable)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

fn find_manifest(path: &Path) -> Option<PathBuf> {
    [path.join(MANIFEST_FILE), path.join("Contents").join(MANIFEST_FILE)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}
