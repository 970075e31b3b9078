use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;

use libloading::Library;
use xwalk_extension_sdk::{
    canonical_class_name, class_name_of, constructor_of, ConstructArgs, Constructor, Extension,
    ExtensionClass, ExtensionModule, ExtensionParam,
};

use crate::builtin::{ExtensionLoader, LOADER_EXTENSION};
use crate::catalog::{Catalog, ExtensionProvider};
use crate::config::RegistryConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::RegistryError;
use crate::loader::{DylibLoader, PackageLoader};
use crate::package::Package;
use crate::scan::scan_directory;

/// A constructed extension.
///
/// Holds a reference on the library that provided the extension's code so the
/// library stays mapped for as long as the instance exists.
pub struct ExtensionInstance {
    // Declared before `_library`: the extension must drop first.
    extension: Box<dyn Extension>,
    _library: Option<Arc<Library>>,
}

impl ExtensionInstance {
    fn new(extension: Box<dyn Extension>, library: Option<Arc<Library>>) -> Self {
        Self {
            extension,
            _library: library,
        }
    }

    pub fn as_extension(&self) -> &dyn Extension {
        self.extension.as_ref()
    }

    pub fn as_extension_mut(&mut self) -> &mut dyn Extension {
        self.extension.as_mut()
    }
}

impl Deref for ExtensionInstance {
    type Target = dyn Extension;

    fn deref(&self) -> &Self::Target {
        self.as_extension()
    }
}

impl DerefMut for ExtensionInstance {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_extension_mut()
    }
}

impl fmt::Debug for ExtensionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionInstance")
            .field("class_name", &self.extension.class_name())
            .field("dynamic", &self._library.is_some())
            .finish()
    }
}

/// Catalog of named extensions with lazy bundle loading.
///
/// Construct one per process at the entry point and hand it to consumers by
/// reference.
pub struct ExtensionRegistry {
    config: RegistryConfig,
    catalog: Catalog,
    host: Arc<Package>,
    loader: Box<dyn PackageLoader>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ExtensionRegistry {
    /// Registry loading bundles with [`DylibLoader`] and reporting through
    /// `tracing`.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_parts(config, Box::new(DylibLoader), Arc::new(TracingSink))
    }

    /// Register the built-in loader extension, then scan the configured
    /// extension directory.
    pub fn with_parts(
        config: RegistryConfig,
        loader: Box<dyn PackageLoader>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let mut registry = Self {
            config,
            catalog: Catalog::new(),
            host: Arc::new(Package::host(ExtensionModule::new())),
            loader,
            sink,
        };
        registry.register::<ExtensionLoader>(LOADER_EXTENSION);
        if let Some(dir) = registry.config.scan_dir() {
            registry.scan(dir);
        }
        registry
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a class compiled into the host under `name`.
    ///
    /// Returns `false` without touching the catalog when `name` is taken.
    pub fn register<T: ExtensionClass>(&mut self, name: &str) -> bool {
        self.register_constructor(name, class_name_of::<T>(), constructor_of::<T>())
    }

    /// Like [`ExtensionRegistry::register`] for a plain constructor function.
    pub fn register_constructor(
        &mut self,
        name: &str,
        class_name: &str,
        constructor: Constructor,
    ) -> bool {
        if self.catalog.contains(name) {
            return false;
        }
        let provider = ExtensionProvider::builtin(
            Arc::clone(&self.host),
            canonical_class_name(class_name),
            constructor,
        );
        self.catalog.insert(name, provider).is_ok()
    }

    /// Scan `dir` for bundles and add their extensions. Names already known
    /// are kept. Returns whether the directory existed.
    pub fn scan(&mut self, dir: impl AsRef<Path>) -> bool {
        scan_directory(
            dir.as_ref(),
            &self.config,
            &mut self.catalog,
            self.sink.as_ref(),
        )
    }

    /// Construct the extension registered as `name`.
    ///
    /// The owning bundle is loaded on first use. Every failure is reported to
    /// the diagnostics sink and yields `None`; a failed load is retried on the
    /// next call.
    pub fn create_extension(
        &self,
        name: &str,
        param: Option<ExtensionParam>,
    ) -> Option<ExtensionInstance> {
        match self.try_create_extension(name, param) {
            Ok(instance) => Some(instance),
            Err(err) => {
                self.sink.emit(Diagnostic::error(&err));
                None
            }
        }
    }

    pub fn try_create_extension(
        &self,
        name: &str,
        param: Option<ExtensionParam>,
    ) -> Result<ExtensionInstance, RegistryError> {
        let provider = self
            .catalog
            .get(name)
            .ok_or_else(|| RegistryError::ExtensionNotFound(name.to_string()))?;
        let package = provider.package();
        let loaded = package.load_with(self.loader.as_ref())?;
        let constructor = match provider.constructor() {
            Some(constructor) => constructor,
            None => resolve_constructor(package, loaded.module(), provider.class_name())?,
        };

        let args = ConstructArgs::with_param(param);
        let extension = constructor(&args).map_err(|source| RegistryError::Construction {
            name: name.to_string(),
            source,
        })?;
        Ok(ExtensionInstance::new(extension, loaded.library().cloned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    pub fn provider(&self, name: &str) -> Option<&ExtensionProvider> {
        self.catalog.get(name)
    }

    /// Registered extension names in lexical order.
    pub fn extension_names(&self) -> Vec<&str> {
        self.catalog.names()
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("config", &self.config)
            .field("extensions", &self.catalog.names())
            .finish()
    }
}

/// Look `class_name` up in `module`, falling back to the name qualified with
/// the package executable (`<executable>.<class>`).
fn resolve_constructor(
    package: &Package,
    module: &ExtensionModule,
    class_name: &str,
) -> Result<Constructor, RegistryError> {
    if let Some(constructor) = module.constructor(class_name) {
        return Ok(constructor);
    }
    if let Some(executable) = package.executable_name() {
        let qualified = format!("{executable}.{class_name}");
        if let Some(constructor) = module.constructor(&qualified) {
            tracing::debug!(class = class_name, %qualified, "resolved class by qualified name");
            return Ok(constructor);
        }
    }
    Err(RegistryError::TypeResolution {
        class_name: class_name.to_string(),
        path: package.path().to_path_buf(),
    })
}
