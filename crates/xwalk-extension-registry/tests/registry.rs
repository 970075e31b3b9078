use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use xwalk_extension_registry::sdk::{
    ConstructArgs, ConstructError, Extension, ExtensionClass, ExtensionModule, ExtensionParam,
    PARAM_KEY,
};
use xwalk_extension_registry::{
    DiagnosticKind, ExtensionLoader, ExtensionRegistry, LoadedModule, MemorySink, Package,
    PackageLoader, RegistryConfig, RegistryError, Severity, LOADER_EXTENSION, MANIFEST_FILE,
};

#[derive(Debug, PartialEq)]
struct Echo {
    args: ConstructArgs,
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
        Ok(Self { args: args.clone() })
    }
}

struct Picky;

impl Extension for Picky {
    fn class_name(&self) -> &str {
        "Picky"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ExtensionClass for Picky {
    fn construct(args: &ConstructArgs) -> Result<Self, ConstructError> {
        let param = args.require_param()?;
        param
            .as_bool()
            .ok_or_else(|| ConstructError::wrong_type(PARAM_KEY, "bool", param))?;
        Ok(Self)
    }
}

mod other {
    use std::any::Any;

    use xwalk_extension_registry::sdk::{ConstructArgs, ConstructError, Extension, ExtensionClass};

    /// Shares its class name with the top-level `Echo` but never constructs.
    pub struct Echo;

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
        fn construct(_: &ConstructArgs) -> Result<Self, ConstructError> {
            Err(ConstructError::failed("other echo is unavailable"))
        }
    }
}

/// Serves a fixed class table and counts how often packages get loaded.
#[derive(Default)]
struct TestLoader {
    loads: AtomicUsize,
    failing: AtomicBool,
}

impl TestLoader {
    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl PackageLoader for TestLoader {
    fn load(&self, package: &Package) -> Result<LoadedModule, RegistryError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistryError::PackageLoad {
                path: package.path().to_path_buf(),
                reason: "refused by test".into(),
            });
        }
        let mut module = ExtensionModule::new();
        module.register_class::<Echo>().register_class::<Picky>();
        module.register_constructor(
            "Qualifying.Qualified",
            xwalk_extension_registry::sdk::constructor_of::<Echo>(),
        );
        Ok(LoadedModule::new(module))
    }
}

struct Harness {
    dir: TempDir,
    loader: Arc<TestLoader>,
    sink: Arc<MemorySink>,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
            loader: Arc::new(TestLoader::default()),
            sink: Arc::new(MemorySink::new()),
        }
    }

    fn bundle(&self, name: &str, manifest: Value) -> &Self {
        let bundle = self.dir.path().join(name);
        fs::create_dir_all(&bundle).unwrap();
        fs::write(bundle.join(MANIFEST_FILE), manifest.to_string()).unwrap();
        self
    }

    fn registry(&self) -> ExtensionRegistry {
        self.registry_for(self.dir.path())
    }

    fn registry_for(&self, dir: &Path) -> ExtensionRegistry {
        ExtensionRegistry::with_parts(
            RegistryConfig::default().with_extensions_dir(dir),
            Box::new(Arc::clone(&self.loader)),
            self.sink.clone(),
        )
    }
}

fn extensions(table: Value) -> Value {
    json!({ "executable": "Qualifying", "XWalkExtensions": table })
}

#[test]
fn unknown_names_are_not_created() {
    let harness = Harness::new();
    let registry = harness.registry();

    assert!(registry.create_extension("no.such.extension", None).is_none());
    assert!(matches!(
        registry.try_create_extension("no.such.extension", None),
        Err(RegistryError::ExtensionNotFound(_))
    ));
    assert_eq!(harness.sink.count(DiagnosticKind::ExtensionNotFound), 1);
    assert_eq!(harness.loader.loads(), 0);
}

#[test]
fn loader_extension_works_without_any_bundle() {
    let harness = Harness::new();
    let registry = harness.registry_for(&harness.dir.path().join("missing"));

    assert_eq!(registry.extension_names(), vec![LOADER_EXTENSION]);
    let instance = registry.create_extension(LOADER_EXTENSION, None).unwrap();
    let loader = instance.downcast_ref::<ExtensionLoader>().unwrap();
    assert_eq!(loader.param(), None);
    assert_eq!(harness.loader.loads(), 0);
    assert_eq!(harness.sink.count(DiagnosticKind::DirectoryNotFound), 1);
}

#[test]
fn register_accepts_each_name_once() {
    let harness = Harness::new();
    let mut registry = harness.registry();

    assert!(registry.register::<Echo>("host.echo"));
    assert!(!registry.register::<Picky>("host.echo"));
    assert!(!registry.register::<Echo>(LOADER_EXTENSION));

    assert_eq!(registry.provider("host.echo").unwrap().class_name(), "Echo");
    let instance = registry.create_extension("host.echo", None).unwrap();
    assert!(instance.is::<Echo>());
    assert_eq!(harness.loader.loads(), 0);
}

#[test]
fn builtins_with_equal_class_names_stay_distinct() {
    let harness = Harness::new();
    let mut registry = harness.registry();

    assert!(registry.register::<Echo>("host.echo"));
    assert!(registry.register::<other::Echo>("other.echo"));
    assert_eq!(registry.provider("other.echo").unwrap().class_name(), "Echo");

    assert!(registry.create_extension("host.echo", None).unwrap().is::<Echo>());
    assert!(registry.create_extension("other.echo", None).is_none());
    assert!(registry.create_extension("host.echo", None).is_some());
    assert_eq!(harness.sink.count(DiagnosticKind::Construction), 1);
}

#[test]
fn first_bundle_wins_duplicate_names() {
    let harness = Harness::new();
    harness
        .bundle("Alpha.framework", extensions(json!({ "shared": "Echo" })))
        .bundle("Beta.framework", extensions(json!({ "shared": "Picky" })));
    let registry = harness.registry();

    let provider = registry.provider("shared").unwrap();
    assert_eq!(provider.class_name(), "Echo");
    assert!(provider.package().path().ends_with("Alpha.framework"));

    let warnings = harness.sink.with_severity(Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, DiagnosticKind::DuplicateName);
    assert_eq!(warnings[0].message, "duplicated extension name 'shared'");
}

#[test]
fn bundles_cannot_shadow_builtins() {
    let harness = Harness::new();
    harness.bundle(
        "Shadow.framework",
        extensions(json!({ "Extension.loader": "Echo" })),
    );
    let registry = harness.registry();

    assert_eq!(
        registry.provider(LOADER_EXTENSION).unwrap().class_name(),
        "ExtensionLoader"
    );
    assert_eq!(harness.sink.count(DiagnosticKind::DuplicateName), 1);
}

#[test]
fn bundle_without_extension_table_is_ignored_quietly() {
    let harness = Harness::new();
    harness
        .bundle("Plain.framework", json!({ "executable": "Plain" }))
        .bundle("NotAnObject.framework", json!({ "XWalkExtensions": "Echo" }));
    fs::create_dir_all(harness.dir.path().join("NoManifest.framework")).unwrap();
    fs::write(harness.dir.path().join("Stray.framework"), "").unwrap();
    let registry = harness.registry();

    assert_eq!(registry.len(), 1);
    assert!(harness.sink.snapshot().is_empty());
}

#[test]
fn bad_class_names_are_skipped() {
    let harness = Harness::new();
    harness.bundle(
        "Mixed.framework",
        extensions(json!({ "ok": "Echo", "numeric": 7, "list": ["Echo"] })),
    );
    let registry = harness.registry();

    assert!(registry.contains("ok"));
    assert!(!registry.contains("numeric"));
    assert!(!registry.contains("list"));
    assert_eq!(harness.sink.count(DiagnosticKind::BadClassName), 2);
}

#[test]
fn bundle_is_loaded_once() {
    let harness = Harness::new();
    harness.bundle(
        "Alpha.framework",
        extensions(json!({ "alpha.echo": "Echo", "alpha.picky": "Picky" })),
    );
    let registry = harness.registry();
    let package = Arc::clone(registry.provider("alpha.echo").unwrap().package());
    assert!(!package.is_loaded());

    for _ in 0..3 {
        assert!(registry.create_extension("alpha.echo", None).is_some());
    }
    assert!(registry
        .create_extension("alpha.picky", Some(ExtensionParam::Bool(true)))
        .is_some());

    assert!(package.is_loaded());
    assert_eq!(harness.loader.loads(), 1);
}

#[test]
fn failed_load_is_retried() {
    let harness = Harness::new();
    harness.bundle("Alpha.framework", extensions(json!({ "alpha.echo": "Echo" })));
    let registry = harness.registry();

    harness.loader.set_failing(true);
    assert!(registry.create_extension("alpha.echo", None).is_none());
    assert!(registry.create_extension("alpha.echo", None).is_none());
    assert_eq!(harness.loader.loads(), 2);
    assert_eq!(harness.sink.count(DiagnosticKind::PackageLoad), 2);
    assert!(!registry.provider("alpha.echo").unwrap().package().is_loaded());

    harness.loader.set_failing(false);
    assert!(registry.create_extension("alpha.echo", None).is_some());
    assert!(registry.create_extension("alpha.echo", None).is_some());
    assert_eq!(harness.loader.loads(), 3);
}

#[test]
fn parameter_is_delivered_under_param_key() {
    let harness = Harness::new();
    harness.bundle("Alpha.framework", extensions(json!({ "alpha.echo": "Echo" })));
    let registry = harness.registry();

    let with_param = registry
        .create_extension("alpha.echo", Some(ExtensionParam::from("hello")))
        .unwrap();
    let echo = with_param.downcast_ref::<Echo>().unwrap();
    assert_eq!(echo.args.len(), 1);
    assert_eq!(echo.args.get("param"), Some(&ExtensionParam::from("hello")));

    let without_param = registry.create_extension("alpha.echo", None).unwrap();
    assert!(without_param.downcast_ref::<Echo>().unwrap().args.is_empty());
}

#[test]
fn construction_failures_are_reported() {
    let harness = Harness::new();
    harness.bundle("Alpha.framework", extensions(json!({ "alpha.picky": "Picky" })));
    let registry = harness.registry();

    assert!(registry.create_extension("alpha.picky", None).is_none());
    assert!(registry
        .create_extension("alpha.picky", Some(ExtensionParam::Integer(1)))
        .is_none());
    assert!(registry
        .create_extension("alpha.picky", Some(ExtensionParam::Bool(false)))
        .is_some());

    let errors = harness.sink.with_severity(Severity::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|diagnostic| diagnostic.kind == DiagnosticKind::Construction));
    assert_eq!(harness.loader.loads(), 1);
}

#[test]
fn qualified_class_name_is_used_as_fallback() {
    let harness = Harness::new();
    harness.bundle(
        "Alpha.framework",
        extensions(json!({ "alpha.qualified": "Qualified", "alpha.unknown": "Unknown" })),
    );
    let registry = harness.registry();

    let instance = registry.create_extension("alpha.qualified", None).unwrap();
    assert!(instance.is::<Echo>());

    assert!(matches!(
        registry.try_create_extension("alpha.unknown", None),
        Err(RegistryError::TypeResolution { ref class_name, .. }) if class_name == "Unknown"
    ));
}

#[test]
fn loader_extension_creates_other_extensions() {
    let harness = Harness::new();
    harness.bundle("Alpha.framework", extensions(json!({ "alpha.echo": "Echo" })));
    let registry = harness.registry();

    let instance = registry
        .create_extension(LOADER_EXTENSION, Some(ExtensionParam::from("frame-1")))
        .unwrap();
    let loader = instance.downcast_ref::<ExtensionLoader>().unwrap();
    assert_eq!(loader.param().and_then(ExtensionParam::as_str), Some("frame-1"));

    let echo = loader
        .load(&registry, "alpha.echo", Some(ExtensionParam::Integer(5)))
        .unwrap();
    assert_eq!(
        echo.downcast_ref::<Echo>().unwrap().args.param(),
        Some(&ExtensionParam::Integer(5))
    );
    assert!(loader.load(&registry, "alpha.missing", None).is_none());
}

#[test]
fn later_scans_only_add_new_names() {
    let harness = Harness::new();
    harness.bundle("Alpha.framework", extensions(json!({ "shared": "Echo" })));
    let mut registry = harness.registry();

    let extra = tempdir().unwrap();
    let bundle = extra.path().join("Extra.framework");
    fs::create_dir_all(&bundle).unwrap();
    fs::write(
        bundle.join(MANIFEST_FILE),
        extensions(json!({ "shared": "Picky", "extra": "Echo" })).to_string(),
    )
    .unwrap();

    assert!(registry.scan(extra.path()));
    assert!(!registry.scan(extra.path().join("absent")));
    assert_eq!(registry.extension_names(), vec![LOADER_EXTENSION, "extra", "shared"]);
    assert_eq!(registry.provider("shared").unwrap().class_name(), "Echo");
}
