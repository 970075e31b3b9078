use std::any::Any;
use std::collections::BTreeMap;

use crate::{ConstructArgs, ConstructError};

/// A constructed extension instance.
///
/// The registry only relies on extensions being constructible; hosts recover
/// the concrete type through [`Extension::as_any`] or the downcast helpers on
/// `dyn Extension`.
pub trait Extension: Any + Send {
    /// Canonical class name the instance was constructed from.
    fn class_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Extension {
    pub fn is<T: Extension>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Extension>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Extension>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// An extension type that can be built from [`ConstructArgs`].
pub trait ExtensionClass: Extension + Sized {
    fn construct(args: &ConstructArgs) -> Result<Self, ConstructError>;
}

/// Type-erased constructor stored in an [`ExtensionModule`].
pub type Constructor = fn(&ConstructArgs) -> Result<Box<dyn Extension>, ConstructError>;

fn construct_boxed<T: ExtensionClass>(
    args: &ConstructArgs,
) -> Result<Box<dyn Extension>, ConstructError> {
    T::construct(args).map(|extension| Box::new(extension) as Box<dyn Extension>)
}

pub fn constructor_of<T: ExtensionClass>() -> Constructor {
    construct_boxed::<T>
}

/// Canonical class name of `T`: the last component of its type path.
///
/// `hello_extension::echo::Echo` becomes `Echo`.
pub fn class_name_of<T: ?Sized>() -> &'static str {
    canonical_class_name(std::any::type_name::<T>())
}

/// Strip module qualification (`a::b::C`, `Module.C`) and generic arguments.
pub fn canonical_class_name(type_path: &str) -> &str {
    let base = type_path
        .split_once('<')
        .map(|(base, _)| base)
        .unwrap_or(type_path);
    let base = base.rsplit("::").next().unwrap_or(base);
    base.rsplit('.').next().unwrap_or(base)
}

/// Class table exported by an extension bundle (or the host itself).
#[derive(Clone, Default)]
pub struct ExtensionModule {
    classes: BTreeMap<String, Constructor>,
}

impl ExtensionModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its canonical class name.
    pub fn register_class<T: ExtensionClass>(&mut self) -> &mut Self {
        self.register_constructor(class_name_of::<T>(), constructor_of::<T>())
    }

    /// Register `constructor` under `class_name`, replacing any previous entry.
    pub fn register_constructor(
        &mut self,
        class_name: impl Into<String>,
        constructor: Constructor,
    ) -> &mut Self {
        self.classes.insert(class_name.into(), constructor);
        self
    }

    pub fn constructor(&self, class_name: &str) -> Option<Constructor> {
        self.classes.get(class_name).copied()
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl std::fmt::Debug for ExtensionModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionModule")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Value returned by a bundle's entry point.
pub struct ExtensionExport {
    module: ExtensionModule,
}

impl ExtensionExport {
    pub fn new(module: ExtensionModule) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &ExtensionModule {
        &self.module
    }

    pub fn into_module(self) -> ExtensionModule {
        self.module
    }
}
