use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use xwalk_extension_sdk::Constructor;

use crate::error::RegistryError;
use crate::package::Package;

/// Which package owns an extension name and which class implements it.
///
/// Built-in providers carry their constructor; bundle providers resolve the
/// class by name once the bundle is loaded.
#[derive(Debug, Clone)]
pub struct ExtensionProvider {
    package: Arc<Package>,
    class_name: String,
    constructor: Option<Constructor>,
}

impl ExtensionProvider {
    pub fn new(package: Arc<Package>, class_name: impl Into<String>) -> Self {
        Self {
            package,
            class_name: class_name.into(),
            constructor: None,
        }
    }

    pub fn builtin(
        package: Arc<Package>,
        class_name: impl Into<String>,
        constructor: Constructor,
    ) -> Self {
        Self {
            package,
            class_name: class_name.into(),
            constructor: Some(constructor),
        }
    }

    pub fn constructor(&self) -> Option<Constructor> {
        self.constructor
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// Extension name to provider map. Names are never overwritten.
#[derive(Debug, Default)]
pub struct Catalog {
    providers: HashMap<String, ExtensionProvider>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `provider` under `name` unless the name is already taken.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        provider: ExtensionProvider,
    ) -> Result<(), RegistryError> {
        match self.providers.entry(name.into()) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateName(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(provider);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionProvider> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionProvider)> {
        self.providers
            .iter()
            .map(|(name, provider)| (name.as_str(), provider))
    }
}
