use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::catalog::{Catalog, ExtensionProvider};
use crate::config::RegistryConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::RegistryError;
use crate::package::Package;

/// Open every bundle in `dir` and merge its extensions into `catalog`.
///
/// Bundles are visited in file-name order, so when two bundles declare the
/// same extension name the one sorting first wins. Entries that are not
/// bundles are skipped. Returns whether `dir` existed and could be read.
pub fn scan_directory(
    dir: &Path,
    config: &RegistryConfig,
    catalog: &mut Catalog,
    sink: &dyn DiagnosticSink,
) -> bool {
    if !dir.exists() {
        sink.emit(Diagnostic::info(&RegistryError::DirectoryNotFound(
            dir.to_path_buf(),
        )));
        return false;
    }

    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            sink.emit(Diagnostic::warning(&RegistryError::Io(err)));
            return false;
        }
    };

    let mut candidates: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| matches_package(path, &config.package_extension))
        .collect();
    candidates.sort();

    for candidate in candidates {
        match Package::open(&candidate) {
            Ok(package) => {
                merge_package(Arc::new(package), &config.metadata_key, catalog, sink);
            }
            Err(err) => {
                tracing::debug!(path = %candidate.display(), "skipping bundle: {err}");
            }
        }
    }
    true
}

/// Merge the extension table stored under `metadata_key` into `catalog`.
///
/// Returns `false` when the package has no such table; that is not an error.
pub fn merge_package(
    package: Arc<Package>,
    metadata_key: &str,
    catalog: &mut Catalog,
    sink: &dyn DiagnosticSink,
) -> bool {
    let Some(Value::Object(table)) = package.info(metadata_key) else {
        return false;
    };

    for (name, value) in table {
        let class_name = match value.as_str() {
            Some(class_name) if is_valid_class_name(class_name) => class_name,
            _ => {
                sink.emit(Diagnostic::warning(&RegistryError::BadClassName {
                    name: name.clone(),
                    value: value.to_string(),
                }));
                continue;
            }
        };
        let provider = ExtensionProvider::new(Arc::clone(&package), class_name);
        match catalog.insert(name.clone(), provider) {
            Ok(()) => tracing::debug!(
                extension = %name,
                class = class_name,
                bundle = %package.path().display(),
                "registered extension"
            ),
            Err(err) => sink.emit(Diagnostic::warning(&err)),
        }
    }
    true
}

fn matches_package(path: &Path, package_extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext == package_extension)
        .unwrap_or(false)
}

fn is_valid_class_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}
