use std::any::Any;

use xwalk_extension_sdk::{ConstructArgs, ConstructError, Extension, ExtensionClass, ExtensionParam};

use crate::registry::{ExtensionInstance, ExtensionRegistry};

/// Name under which [`ExtensionLoader`] is always registered.
pub const LOADER_EXTENSION: &str = "Extension.loader";

/// Built-in extension that lets hosted code request further extensions by
/// name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionLoader {
    param: Option<ExtensionParam>,
}

impl ExtensionLoader {
    pub fn param(&self) -> Option<&ExtensionParam> {
        self.param.as_ref()
    }

    pub fn load(
        &self,
        registry: &ExtensionRegistry,
        name: &str,
        param: Option<ExtensionParam>,
    ) -> Option<ExtensionInstance> {
        registry.create_extension(name, param)
    }
}

impl Extension for ExtensionLoader {
    fn class_name(&self) -> &str {
        "ExtensionLoader"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ExtensionClass for ExtensionLoader {
    fn construct(args: &ConstructArgs) -> Result<Self, ConstructError> {
        Ok(Self {
            param: args.param().cloned(),
        })
    }
}
