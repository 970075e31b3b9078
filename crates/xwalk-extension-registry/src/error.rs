use std::path::PathBuf;

use thiserror::Error;
use xwalk_extension_sdk::ConstructError;

use crate::diagnostics::DiagnosticKind;

/// Errors raised while discovering, loading or constructing extensions.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("extension directory not found at {0}")]
    DirectoryNotFound(PathBuf),
    #[error("duplicated extension name '{0}'")]
    DuplicateName(String),
    #[error("bad class name {value} for extension '{name}'")]
    BadClassName { name: String, value: String },
    #[error("extension '{0}' not found")]
    ExtensionNotFound(String),
    #[error("can't load bundle '{}': {reason}", .path.display())]
    PackageLoad { path: PathBuf, reason: String },
    #[error("class '{class_name}' not found in bundle '{}'", .path.display())]
    TypeResolution { class_name: String, path: PathBuf },
    #[error("can't create extension '{name}': {source}")]
    Construction {
        name: String,
        #[source]
        source: ConstructError,
    },
    #[error("{} is not an extension bundle", .0.display())]
    NotAPackage(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bundle manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn load_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::PackageLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            RegistryError::DirectoryNotFound(_) => DiagnosticKind::DirectoryNotFound,
            RegistryError::DuplicateName(_) => DiagnosticKind::DuplicateName,
            RegistryError::BadClassName { .. } => DiagnosticKind::BadClassName,
            RegistryError::ExtensionNotFound(_) => DiagnosticKind::ExtensionNotFound,
            RegistryError::PackageLoad { .. } => DiagnosticKind::PackageLoad,
            RegistryError::TypeResolution { .. } => DiagnosticKind::TypeResolution,
            RegistryError::Construction { .. } => DiagnosticKind::Construction,
            RegistryError::NotAPackage(_) | RegistryError::Manifest(_) => {
                DiagnosticKind::InvalidBundle
            }
            RegistryError::Io(_) => DiagnosticKind::Io,
        }
    }
}
