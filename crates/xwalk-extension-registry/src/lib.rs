//! Registry for XWalk extensions.
//!
//! An [`ExtensionRegistry`] maps extension names to the bundle and class that
//! implement them. It is populated from built-in registrations and from
//! bundles found in an extensions directory:
//!
//! ```text
//! Frameworks/
//!   Echo.framework/
//!     manifest.json      { "executable": "libecho.so",
//!                          "XWalkExtensions": { "echo": "Echo" } }
//!     libecho.so
//! ```
//!
//! Bundle code is loaded the first time one of its extensions is requested.

mod builtin;
mod catalog;
mod config;
mod diagnostics;
mod error;
mod loader;
mod package;
mod registry;
mod scan;

pub use builtin::{ExtensionLoader, LOADER_EXTENSION};
pub use catalog::{Catalog, ExtensionProvider};
pub use config::{
    default_extensions_dir, RegistryConfig, DEFAULT_METADATA_KEY, DEFAULT_PACKAGE_EXTENSION,
};
pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, Severity, TracingSink,
};
pub use error::RegistryError;
pub use loader::{DylibLoader, PackageLoader};
pub use package::{LoadedModule, Package, PackageKind, MANIFEST_FILE};
pub use registry::{ExtensionInstance, ExtensionRegistry};
pub use scan::{merge_package, scan_directory};

pub use xwalk_extension_sdk as sdk;
