//! Minimal extension bundle exporting an echo and a greeter.
//!
//! Build with `cargo build -p hello-extension` and copy the resulting library
//! next to `bundle/hello_extension.framework/manifest.json`. The manifest names
//! no executable, so the platform file name of the bundle stem is used
//! (`libhello_extension.so`, `libhello_extension.dylib`, `hello_extension.dll`).

use xwalk_extension_sdk::declare_xwalk_extensions;
use xwalk_extension_sdk::prelude::*;

/// Returns whatever parameter it was constructed with.
pub struct Echo {
    param: Option<ExtensionParam>,
}

impl Echo {
    pub fn echo(&self) -> Option<&ExtensionParam> {
        self.param.as_ref()
    }
}

impl Extension for Echo {
    fn class_name(&self) -> &str {
        "Echo"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ExtensionClass for Echo {
    fn construct(args: &ConstructArgs) -> Result<Self, ConstructError> {
        Ok(Self {
            param: args.param().cloned(),
        })
    }
}

/// Requires a text parameter naming who to greet.
pub struct Greeter {
    name: String,
}

impl Greeter {
    pub fn greeting(&self) -> String {
        format!("Hello, {}!", self.name)
    }
}

impl Extension for Greeter {
    fn class_name(&self) -> &str {
        "Greeter"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ExtensionClass for Greeter {
    fn construct(args: &ConstructArgs) -> Result<Self, ConstructError> {
        let param = args.require_param()?;
        let name = param
            .as_str()
            .ok_or_else(|| ConstructError::wrong_type("param", "text", param))?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

declare_xwalk_extensions!(Echo, Greeter);
