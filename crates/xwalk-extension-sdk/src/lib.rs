//! XWalk Extension SDK
//! ===================
//!
//! Types shared by the extension registry and the bundles it loads. A bundle
//! is a shared library that exports a single entry point returning an
//! [`ExtensionExport`]: a table mapping class names to constructors. The
//! registry looks classes up in that table by the names declared in the
//! bundle manifest and calls the constructor with an optional
//! [`ExtensionParam`] delivered under [`PARAM_KEY`].

mod parameters;
mod registry;

pub use parameters::{ConstructArgs, ConstructError, ExtensionParam, PARAM_KEY};
pub use registry::{
    canonical_class_name, class_name_of, constructor_of, Constructor, Extension, ExtensionClass,
    ExtensionExport, ExtensionModule,
};

/// Name of the symbol every extension bundle exports.
pub const ENTRY_SYMBOL: &str = "xwalk_extension_entrypoint";

/// Signature of [`ENTRY_SYMBOL`].
///
/// The Rust ABI is used, so bundles must be built with the same toolchain and
/// SDK version as the host that loads them.
pub type ExtensionEntry = unsafe extern "Rust" fn() -> ExtensionExport;

/// Common imports for extension authors.
pub mod prelude {
    pub use crate::{
        ConstructArgs, ConstructError, Extension, ExtensionClass, ExtensionExport,
        ExtensionModule, ExtensionParam,
    };
    pub use std::any::Any;
}

/// Declare the entry point of an extension bundle.
///
/// Each listed type must implement [`ExtensionClass`] and is registered under
/// its canonical class name.
///
/// # Example
///
/// ```ignore
/// use xwalk_extension_sdk::declare_xwalk_extensions;
///
/// struct Echo;
/// // impl Extension + ExtensionClass for Echo { ... }
///
/// declare_xwalk_extensions!(Echo);
/// ```
#[macro_export]
macro_rules! declare_xwalk_extensions {
    ($($class:ty),+ $(,)?) => {
        #[no_mangle]
        pub extern "Rust" fn xwalk_extension_entrypoint() -> $crate::ExtensionExport {
            let mut module = $crate::ExtensionModule::new();
            $(module.register_class::<$class>();)+
            $crate::ExtensionExport::new(module)
        }
    };
}
