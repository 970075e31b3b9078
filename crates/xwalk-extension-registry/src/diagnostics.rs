//! Diagnostics emitted by the registry.
//!
//! Registry operations never fail hard: problems are reported through a
//! [`DiagnosticSink`] and the operation degrades to `false` or `None`.

use parking_lot::Mutex;

use crate::error::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    DirectoryNotFound,
    DuplicateName,
    BadClassName,
    ExtensionNotFound,
    PackageLoad,
    TypeResolution,
    Construction,
    InvalidBundle,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, error: &RegistryError) -> Self {
        Self {
            severity,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn info(error: &RegistryError) -> Self {
        Self::new(Severity::Info, error)
    }

    pub fn warning(error: &RegistryError) -> Self {
        Self::new(Severity::Warning, error)
    }

    pub fn error(error: &RegistryError) -> Self {
        Self::new(Severity::Error, error)
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let Diagnostic {
            severity,
            kind,
            message,
        } = diagnostic;
        match severity {
            Severity::Info => tracing::info!(?kind, "{message}"),
            Severity::Warning => tracing::warn!(?kind, "{message}"),
            Severity::Error => tracing::error!(?kind, "{message}"),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|diagnostic| diagnostic.kind == kind)
            .count()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .cloned()
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}
