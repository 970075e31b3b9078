use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xwalk_extension_registry::sdk::ExtensionParam;
use xwalk_extension_registry::{
    ExtensionLoader, ExtensionRegistry, RegistryConfig, LOADER_EXTENSION,
};

#[derive(Parser, Debug)]
#[command(name = "minimal-host")]
struct Args {
    /// Directory scanned for extension bundles
    #[arg(long, value_name = "DIR")]
    extensions: Option<PathBuf>,

    /// JSON registry configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Extensions to instantiate after scanning
    #[arg(value_name = "NAME")]
    create: Vec<String>,

    /// JSON value passed to each created extension
    #[arg(long, value_name = "JSON")]
    param: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    if let Some(dir) = args.extensions {
        config.extensions_dir = Some(dir);
    }
    let param: Option<ExtensionParam> = args
        .param
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("--param must be valid JSON")?;

    let registry = ExtensionRegistry::new(config);
    println!("Registered extensions:");
    for name in registry.extension_names() {
        if let Some(provider) = registry.provider(name) {
            println!(
                "  - {name} ({} in {})",
                provider.class_name(),
                provider.package().path().display()
            );
        }
    }

    run(&registry, &args.create, param)
}

fn run(
    registry: &ExtensionRegistry,
    names: &[String],
    param: Option<ExtensionParam>,
) -> Result<()> {
    let Some(loader) = registry.create_extension(LOADER_EXTENSION, None) else {
        bail!("built-in loader extension is unavailable");
    };
    let Some(loader) = loader.downcast_ref::<ExtensionLoader>() else {
        bail!("{LOADER_EXTENSION} is not an ExtensionLoader");
    };

    let mut failures = 0;
    for name in names {
        match loader.load(registry, name, param.clone()) {
            Some(instance) => println!("Created {name}: {}", instance.class_name()),
            None => failures += 1,
        }
    }
    if failures > 0 {
        bail!("{failures} extension(s) could not be created");
    }
    Ok(())
}
