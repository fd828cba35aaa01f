//! Compiled module metadata and the per-build loading context.
//!
//! A module exposes its name, a type registry and the names of the modules it
//! references. Loading is delegated to a [`ModuleLoader`]; the bundled
//! [`ManifestLoader`] reads the JSON metadata manifest the host build emits.
//! Every module is loaded at most once per [`ModuleCache`], so descriptors
//! handed out by one cache can be compared by identity.

pub mod builtin;
pub mod locate;

use crate::error::{DocError, Result};
pub use locate::{find_file, module_files, ModuleLocator, SearchPath};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of module binaries.
pub const MODULE_EXTENSION: &str = "dll";

/// Marker attribute flagging extension methods.
pub const EXTENSION_ATTRIBUTE: &str = "System.Runtime.CompilerServices.ExtensionAttribute";

// -- Manifest format ----------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleImage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub full_name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub constructors: Vec<MethodDefinition>,
    #[serde(default)]
    pub methods: Vec<MethodDefinition>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default = "void_type")]
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub generic_arity: usize,
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Declared optional even when the default is `null`
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "yes")]
    pub get: bool,
    #[serde(default)]
    pub set: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Family,
    Assembly,
    FamilyOrAssembly,
    FamilyAndAssembly,
}

impl Default for MethodDefinition {
    fn default() -> Self {
        MethodDefinition {
            name: String::new(),
            return_type: void_type(),
            parameters: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
            generic_arity: 0,
            attributes: Vec::new(),
        }
    }
}

fn void_type() -> String {
    builtin::VOID.to_string()
}

fn yes() -> bool {
    true
}

// -- Loading ------------------------------------------------------------------

/// Host-supplied module loading.
pub trait ModuleLoader {
    fn load(&self, path: &Path) -> Result<ModuleImage>;

    fn is_module(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXTENSION)
    }
}

/// Reads the JSON metadata manifest stored in a module file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestLoader;

impl ModuleLoader for ManifestLoader {
    fn load(&self, path: &Path) -> Result<ModuleImage> {
        let load_error = |message: String| DocError::ModuleLoad {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let mut image: ModuleImage =
            serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?;

        if image.name.is_empty() {
            image.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        Ok(image)
    }
}

/// Position of a module inside one [`ModuleCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

impl ModuleId {
    /// The built-in framework module, always present.
    pub const CORE: ModuleId = ModuleId(0);
}

/// A concrete type inside a loaded module.
///
/// Equality is identity: same module in the same cache and same full name.
#[derive(Debug, Clone, Default)]
pub struct TypeDescriptor {
    pub module: ModuleId,
    pub module_name: String,
    pub full_name: String,
    pub namespace: String,
    pub interfaces: Vec<String>,
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.full_name == other.full_name
    }
}

impl Eq for TypeDescriptor {}

impl TypeDescriptor {
    pub fn name(&self) -> &str {
        simple_name(&self.full_name)
    }
}

/// Last dotted segment of a type name, without the generic arity suffix.
pub fn simple_name(full_name: &str) -> &str {
    let last = full_name.rsplit('.').next().unwrap_or(full_name);
    last.split('`').next().unwrap_or(last)
}

#[derive(Debug)]
pub struct LoadedModule {
    pub id: ModuleId,
    pub path: Option<PathBuf>,
    pub image: ModuleImage,
    index: HashMap<String, usize>,
}

impl LoadedModule {
    fn new(id: ModuleId, path: Option<PathBuf>, image: ModuleImage) -> Self {
        let index = image
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.full_name.clone(), i))
            .collect();
        LoadedModule {
            id,
            path,
            image,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.image.name
    }

    pub fn referenced_module_names(&self) -> &[String] {
        &self.image.references
    }

    pub fn definition(&self, full_name: &str) -> Option<&TypeDefinition> {
        self.index.get(full_name).map(|&i| &self.image.types[i])
    }

    pub fn find_type(&self, full_name: &str) -> Option<TypeDescriptor> {
        self.definition(full_name).map(|def| self.describe(def))
    }

    fn describe(&self, def: &TypeDefinition) -> TypeDescriptor {
        let namespace = def.namespace.clone().unwrap_or_else(|| {
            def.full_name
                .rsplit_once('.')
                .map(|(ns, _)| ns.to_string())
                .unwrap_or_default()
        });
        TypeDescriptor {
            module: self.id,
            module_name: self.image.name.clone(),
            full_name: def.full_name.clone(),
            namespace,
            interfaces: def.interfaces.clone(),
        }
    }
}

/// Modules loaded during one documentation build.
///
/// Owned by a single build and never shared, so a module name maps to
/// exactly one loaded copy for the lifetime of the cache.
pub struct ModuleCache<'l> {
    loader: &'l dyn ModuleLoader,
    modules: Vec<LoadedModule>,
    by_path: HashMap<PathBuf, ModuleId>,
    by_name: HashMap<String, ModuleId>,
    failed: HashSet<PathBuf>,
    /// Reference names the locator could not find
    missing: HashSet<String>,
}

impl<'l> ModuleCache<'l> {
    pub fn new(loader: &'l dyn ModuleLoader) -> Self {
        let core = LoadedModule::new(ModuleId::CORE, None, builtin::core_module());
        let mut by_name = HashMap::new();
        by_name.insert(core.name().to_string(), ModuleId::CORE);
        ModuleCache {
            loader,
            modules: vec![core],
            by_path: HashMap::new(),
            by_name,
            failed: HashSet::new(),
            missing: HashSet::new(),
        }
    }

    pub fn loader(&self) -> &'l dyn ModuleLoader {
        self.loader
    }

    pub fn get(&self, id: ModuleId) -> &LoadedModule {
        &self.modules[id.0]
    }

    /// Number of loaded modules, the built-in core included.
    pub fn loaded_count(&self) -> usize {
        self.modules.len()
    }

    pub fn by_name(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    /// Load the module at `path`, reusing an earlier load of the same file
    /// or of a module with the same name.
    pub fn load_path(&mut self, path: &Path) -> Result<ModuleId> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(&id) = self.by_path.get(&key) {
            return Ok(id);
        }
        if self.failed.contains(&key) {
            return Err(DocError::ModuleLoad {
                path: path.to_path_buf(),
                message: "previous load failed".to_string(),
            });
        }

        let image = match self.loader.load(path) {
            Ok(image) => image,
            Err(e) => {
                self.failed.insert(key);
                return Err(e);
            }
        };

        if let Some(&existing) = self.by_name.get(&image.name) {
            tracing::debug!(
                "module {} already loaded, reusing it for {}",
                image.name,
                path.display()
            );
            self.by_path.insert(key, existing);
            return Ok(existing);
        }

        let id = ModuleId(self.modules.len());
        tracing::debug!("loaded module {} from {}", image.name, path.display());
        self.by_name.insert(image.name.clone(), id);
        self.by_path.insert(key.clone(), id);
        self.modules.push(LoadedModule::new(id, Some(key), image));
        Ok(id)
    }

    /// Load a referenced module by name through `locator`.
    ///
    /// Reference names may carry version qualifiers after a comma.
    pub fn load_reference(&mut self, reference: &str, locator: &dyn ModuleLocator) -> Result<ModuleId> {
        let name = reference.split(',').next().unwrap_or(reference).trim();
        if builtin::is_core_reference(name) {
            return Ok(ModuleId::CORE);
        }
        if let Some(id) = self.by_name(name) {
            return Ok(id);
        }
        let not_found = || DocError::ModuleLoad {
            path: PathBuf::from(name),
            message: "referenced module not found".to_string(),
        };
        if self.missing.contains(name) {
            return Err(not_found());
        }
        match locator.locate(name) {
            Some(path) => self.load_path(&path),
            None => {
                self.missing.insert(name.to_string());
                Err(not_found())
            }
        }
    }

    /// `root` followed by every module reachable through declared
    /// references, breadth first. Unloadable references are skipped.
    pub fn closure(&mut self, root: ModuleId, locator: &dyn ModuleLocator) -> Vec<ModuleId> {
        let mut seen = HashSet::from([root]);
        let mut order = vec![root];
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            let references = self.get(current).referenced_module_names().to_vec();
            for reference in references {
                match self.load_reference(&reference, locator) {
                    Ok(id) => {
                        if seen.insert(id) {
                            order.push(id);
                            queue.push_back(id);
                        }
                    }
                    Err(e) => tracing::debug!("skipping reference {}: {}", reference, e),
                }
            }
        }
        order
    }

    pub fn find_in(&self, id: ModuleId, full_name: &str) -> Option<TypeDescriptor> {
        self.get(id).find_type(full_name)
    }

    pub fn definition(&self, ty: &TypeDescriptor) -> Option<&TypeDefinition> {
        self.get(ty.module).definition(&ty.full_name)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;

    /// In-memory loader keyed by path, counting loads.
    #[derive(Default)]
    pub struct MemoryLoader {
        pub modules: HashMap<PathBuf, ModuleImage>,
        pub loads: Cell<usize>,
    }

    impl MemoryLoader {
        pub fn with(mut self, path: &str, image: ModuleImage) -> Self {
            self.modules.insert(PathBuf::from(path), image);
            self
        }
    }

    impl ModuleLoader for MemoryLoader {
        fn load(&self, path: &Path) -> Result<ModuleImage> {
            self.loads.set(self.loads.get() + 1);
            self.modules.get(path).cloned().ok_or_else(|| DocError::ModuleLoad {
                path: path.to_path_buf(),
                message: "no such module".to_string(),
            })
        }
    }

    /// Locates modules at `<dir>/<name>.dll` without touching the disk.
    pub struct MemoryLocator<'a> {
        pub dir: &'a str,
        pub loader: &'a MemoryLoader,
    }

    impl ModuleLocator for MemoryLocator<'_> {
        fn locate(&self, name: &str) -> Option<PathBuf> {
            let path = PathBuf::from(format!("{}/{}.{}", self.dir, name, MODULE_EXTENSION));
            self.loader.modules.contains_key(&path).then_some(path)
        }
    }

    pub fn image(name: &str, references: &[&str], types: Vec<TypeDefinition>) -> ModuleImage {
        ModuleImage {
            name: name.to_string(),
            references: references.iter().map(|r| r.to_string()).collect(),
            types,
        }
    }

    pub fn type_def(full_name: &str) -> TypeDefinition {
        TypeDefinition {
            full_name: full_name.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn modules_load_once() {
        let loader = MemoryLoader::default().with("/m/Acme.dll", image("Acme", &[], vec![]));
        let mut cache = ModuleCache::new(&loader);
        let a = cache.load_path(Path::new("/m/Acme.dll")).unwrap();
        let b = cache.load_path(Path::new("/m/Acme.dll")).unwrap();
        assert_eq!(a, b);
        assert_eq!(loader.loads.get(), 1);
    }

    #[test]
    fn same_name_from_two_paths_is_one_module() {
        let loader = MemoryLoader::default()
            .with("/a/Acme.dll", image("Acme", &[], vec![type_def("Acme.Widget")]))
            .with("/b/Acme.dll", image("Acme", &[], vec![type_def("Acme.Widget")]));
        let mut cache = ModuleCache::new(&loader);
        let a = cache.load_path(Path::new("/a/Acme.dll")).unwrap();
        let b = cache.load_path(Path::new("/b/Acme.dll")).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            cache.find_in(a, "Acme.Widget"),
            cache.find_in(b, "Acme.Widget")
        );
    }

    #[test]
    fn failed_loads_are_not_retried() {
        let loader = MemoryLoader::default();
        let mut cache = ModuleCache::new(&loader);
        assert!(cache.load_path(Path::new("/m/Broken.dll")).is_err());
        assert!(cache.load_path(Path::new("/m/Broken.dll")).is_err());
        assert_eq!(loader.loads.get(), 1);
    }

    #[test]
    fn closure_follows_references_transitively() {
        let loader = MemoryLoader::default()
            .with("/m/App.dll", image("App", &["Lib, Version=1.0.0.0", "mscorlib"], vec![]))
            .with("/m/Lib.dll", image("Lib", &["Base", "Missing"], vec![]))
            .with("/m/Base.dll", image("Base", &["App"], vec![]));
        let locator = MemoryLocator {
            dir: "/m",
            loader: &loader,
        };
        let mut cache = ModuleCache::new(&loader);
        let app = cache.load_path(Path::new("/m/App.dll")).unwrap();
        let names: Vec<String> = cache
            .closure(app, &locator)
            .into_iter()
            .map(|id| cache.get(id).name().to_string())
            .collect();
        assert_eq!(names, ["App", "Lib", builtin::CORE_MODULE, "Base"]);
    }

    struct CountingLocator {
        calls: std::cell::Cell<usize>,
    }

    impl ModuleLocator for CountingLocator {
        fn locate(&self, _name: &str) -> Option<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    #[test]
    fn unlocatable_references_are_searched_once() {
        let loader = MemoryLoader::default()
            .with("/m/App.dll", image("App", &["Microsoft.CSharp, Version=4.0.0.0"], vec![]));
        let locator = CountingLocator {
            calls: std::cell::Cell::new(0),
        };
        let mut cache = ModuleCache::new(&loader);
        let app = cache.load_path(Path::new("/m/App.dll")).unwrap();
        for _ in 0..5 {
            assert_eq!(cache.closure(app, &locator), [app]);
        }
        assert!(cache.load_reference("Microsoft.CSharp", &locator).is_err());
        assert_eq!(locator.calls.get(), 1);
    }

    #[test]
    fn namespace_defaults_from_full_name() {
        let loader = MemoryLoader::default()
            .with("/m/Acme.dll", image("Acme", &[], vec![type_def("Acme.Gui.Widget")]));
        let mut cache = ModuleCache::new(&loader);
        let id = cache.load_path(Path::new("/m/Acme.dll")).unwrap();
        let ty = cache.find_in(id, "Acme.Gui.Widget").unwrap();
        assert_eq!(ty.namespace, "Acme.Gui");
        assert_eq!(ty.name(), "Widget");
        assert_eq!(ty.module_name, "Acme");
    }

    #[test]
    fn manifest_loader_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Acme.dll");
        fs::write(
            &path,
            r#"{ "types": [ { "fullName": "Acme.Widget",
                 "methods": [ { "name": "Reset" } ],
                 "properties": [ { "name": "Size", "type": "System.Int32" } ] } ] }"#,
        )
        .unwrap();
        let image = ManifestLoader.load(&path).unwrap();
        assert_eq!(image.name, "Acme");
        let widget = &image.types[0];
        assert_eq!(widget.methods[0].return_type, builtin::VOID);
        assert_eq!(widget.methods[0].visibility, Visibility::Public);
        assert!(widget.properties[0].get);
        assert!(!widget.properties[0].set);
    }

    #[test]
    fn manifest_loader_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Native.dll");
        fs::write(&path, [0x4d, 0x5a, 0x90, 0x00]).unwrap();
        assert!(matches!(
            ManifestLoader.load(&path),
            Err(DocError::ModuleLoad { .. })
        ));
    }

    #[test]
    fn simple_name_strips_arity() {
        assert_eq!(simple_name("System.Collections.Generic.List`1"), "List");
        assert_eq!(simple_name("Widget"), "Widget");
    }
}
