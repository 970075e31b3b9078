use std::sync::Arc;

use libloading::Library;
use xwalk_extension_sdk::{ExtensionEntry, ENTRY_SYMBOL};

use crate::error::RegistryError;
use crate::package::{LoadedModule, Package, PackageKind};

/// Loads the code of a package and returns the class table it exports.
pub trait PackageLoader: Send + Sync {
    fn load(&self, package: &Package) -> Result<LoadedModule, RegistryError>;
}

impl<T: PackageLoader + ?Sized> PackageLoader for Arc<T> {
    fn load(&self, package: &Package) -> Result<LoadedModule, RegistryError> {
        (**self).load(package)
    }
}

/// Opens bundle executables as shared libraries and calls their
/// [`ENTRY_SYMBOL`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl PackageLoader for DylibLoader {
    fn load(&self, package: &Package) -> Result<LoadedModule, RegistryError> {
        let path = package.path();
        if package.kind() == PackageKind::Host {
            return Err(RegistryError::load_failure(
                path,
                "the host package cannot be loaded dynamically",
            ));
        }
        let executable = package
            .executable_path()
            .ok_or_else(|| RegistryError::load_failure(path, "bundle has no executable"))?;
        if !executable.exists() {
            return Err(RegistryError::load_failure(
                path,
                format!("executable {} not found", executable.display()),
            ));
        }

        let library = unsafe { Library::new(executable) }
            .map_err(|err| RegistryError::load_failure(path, err))?;
        let export = unsafe {
            let entry = library
                .get::<ExtensionEntry>(ENTRY_SYMBOL.as_bytes())
                .map_err(|err| {
                    RegistryError::load_failure(
                        path,
                        format!("missing entry symbol `{ENTRY_SYMBOL}`: {err}"),
                    )
                })?;
            entry()
        };
        Ok(LoadedModule::with_library(export.into_module(), library))
    }
}
