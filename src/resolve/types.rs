//! Type resolution across the subject module's dependency closure.
//!
//! Lookup order for a type name, first hit wins:
//!
//! 1. framework types already known to the cache (no loading)
//! 2. the configured [`TypeHook`]
//! 3. every module file in the subject module's directory, each expanded to
//!    its reference closure, in sorted file order
//!
//! Results, including misses, are memoized per `(context module, name)`.
//! When binding tokens for member matching, a `System.*` or `Microsoft.*`
//! name that no module declares is identified by its full name alone.

use crate::module::{
    builtin, module_files, simple_name, ModuleCache, ModuleId, ModuleLocator, SearchPath, TypeDescriptor,
};
use crate::parser::signature::split_parameters;
use std::collections::HashMap;
use std::path::PathBuf;

// -- Type tokens --------------------------------------------------------------

/// Structured form of a textual type name such as
/// `System.Collections.Generic.Dictionary{System.String,``0}[]@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeToken {
    Named { name: String, args: Vec<TypeToken> },
    /// `` `N ``: generic parameter of the declaring type
    TypeParam(usize),
    /// ``` ``N ```: generic parameter of the method
    MethodParam(usize),
    Array { element: Box<TypeToken>, rank: usize },
    ByRef(Box<TypeToken>),
    Pointer(Box<TypeToken>),
}

impl TypeToken {
    pub fn parse(raw: &str) -> TypeToken {
        let raw = raw.trim();

        if let Some(inner) = raw.strip_suffix('@').or_else(|| raw.strip_suffix('&')) {
            return TypeToken::ByRef(Box::new(TypeToken::parse(inner)));
        }
        if let Some(inner) = raw.strip_suffix('*') {
            return TypeToken::Pointer(Box::new(TypeToken::parse(inner)));
        }
        if raw.ends_with(']') {
            if let Some(open) = matching_open(raw, '[', ']') {
                let rank = raw[open + 1..raw.len() - 1].matches(',').count() + 1;
                return TypeToken::Array {
                    element: Box::new(TypeToken::parse(&raw[..open])),
                    rank,
                };
            }
        }
        if let Some(index) = raw.strip_prefix("``").and_then(|n| n.parse().ok()) {
            return TypeToken::MethodParam(index);
        }
        if let Some(index) = raw.strip_prefix('`').and_then(|n| n.parse().ok()) {
            return TypeToken::TypeParam(index);
        }
        if raw.ends_with('}') {
            if let Some(open) = matching_open(raw, '{', '}') {
                let args = split_parameters(&raw[open + 1..raw.len() - 1])
                    .iter()
                    .map(|a| TypeToken::parse(a))
                    .collect();
                return TypeToken::Named {
                    name: raw[..open].to_string(),
                    args,
                };
            }
        }
        TypeToken::Named {
            name: raw.to_string(),
            args: Vec::new(),
        }
    }

    /// Name of the generic definition (or plain type) to look up.
    pub fn definition_name(&self) -> Option<String> {
        match self {
            TypeToken::Named { name, args } if args.is_empty() => Some(name.clone()),
            TypeToken::Named { name, args } => Some(format!("{}`{}", name, args.len())),
            TypeToken::Array { element, .. } => element.definition_name(),
            TypeToken::ByRef(inner) | TypeToken::Pointer(inner) => inner.definition_name(),
            TypeToken::TypeParam(_) | TypeToken::MethodParam(_) => None,
        }
    }

    /// Human-readable form, e.g. `Dictionary<String, Int32>[]`.
    pub fn display(&self) -> String {
        match self {
            TypeToken::Named { name, args } if args.is_empty() => simple_name(name).to_string(),
            TypeToken::Named { name, args } => format!(
                "{}<{}>",
                simple_name(name),
                args.iter().map(TypeToken::display).collect::<Vec<_>>().join(", ")
            ),
            TypeToken::TypeParam(i) => generic_name("T", *i),
            TypeToken::MethodParam(i) => generic_name("U", *i),
            TypeToken::Array { element, rank } => {
                format!("{}[{}]", element.display(), ",".repeat(rank - 1))
            }
            TypeToken::ByRef(inner) => format!("ref {}", inner.display()),
            TypeToken::Pointer(inner) => format!("{}*", inner.display()),
        }
    }
}

fn generic_name(prefix: &str, index: usize) -> String {
    if index == 0 {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, index)
    }
}

/// Index of the bracket opening the group that closes at the end of `raw`.
fn matching_open(raw: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in raw.char_indices().rev() {
        if c == close {
            depth += 1;
        } else if c == open {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// A token with every named part bound to a concrete descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    Type {
        descriptor: TypeDescriptor,
        args: Vec<ResolvedType>,
    },
    /// Framework type no loaded module declares, identified by its
    /// definition name
    External {
        name: String,
        args: Vec<ResolvedType>,
    },
    TypeParam(usize),
    MethodParam(usize),
    Array {
        element: Box<ResolvedType>,
        rank: usize,
    },
    ByRef(Box<ResolvedType>),
    Pointer(Box<ResolvedType>),
}

// -- Resolver -----------------------------------------------------------------

/// Custom lookup consulted before the directory scan.
pub trait TypeHook {
    fn resolve(
        &self,
        name: &str,
        context: ModuleId,
        modules: &mut ModuleCache<'_>,
        locator: &dyn ModuleLocator,
    ) -> Option<TypeDescriptor>;
}

/// Looks in the context module and the modules it references directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearDependencies;

impl TypeHook for NearDependencies {
    fn resolve(
        &self,
        name: &str,
        context: ModuleId,
        modules: &mut ModuleCache<'_>,
        locator: &dyn ModuleLocator,
    ) -> Option<TypeDescriptor> {
        if let Some(found) = modules.find_in(context, name) {
            return Some(found);
        }
        let references = modules.get(context).referenced_module_names().to_vec();
        references.iter().find_map(|reference| {
            match modules.load_reference(reference, locator) {
                Ok(id) => modules.find_in(id, name),
                Err(e) => {
                    tracing::debug!("reference {} unavailable: {}", reference, e);
                    None
                }
            }
        })
    }
}

/// Resolves type names for one build. Owns that build's [`ModuleCache`].
pub struct TypeResolver<'l> {
    modules: ModuleCache<'l>,
    subject: ModuleId,
    locator: SearchPath,
    hook: Option<&'l dyn TypeHook>,
    memo: HashMap<(ModuleId, String), Option<TypeDescriptor>>,
}

impl<'l> TypeResolver<'l> {
    pub fn new(modules: ModuleCache<'l>, subject: ModuleId, locator: SearchPath) -> Self {
        TypeResolver {
            modules,
            subject,
            locator,
            hook: None,
            memo: HashMap::new(),
        }
    }

    pub fn with_hook(mut self, hook: &'l dyn TypeHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn subject(&self) -> ModuleId {
        self.subject
    }

    pub fn modules(&self) -> &ModuleCache<'l> {
        &self.modules
    }

    /// Resolve a raw type token to the descriptor of its named type.
    pub fn resolve(&mut self, token: &str, context: ModuleId) -> Option<TypeDescriptor> {
        let locator = self.locator.clone();
        self.resolve_with(token, context, &locator)
    }

    /// [`resolve`](Self::resolve) with an explicit strategy for locating
    /// referenced modules.
    pub fn resolve_with(
        &mut self,
        token: &str,
        context: ModuleId,
        locator: &dyn ModuleLocator,
    ) -> Option<TypeDescriptor> {
        let name = TypeToken::parse(token).definition_name()?;
        self.find(&name, context, locator)
    }

    /// Bind every named part of `token`; `None` if any part is unknown.
    pub fn resolve_token(&mut self, token: &TypeToken, context: ModuleId) -> Option<ResolvedType> {
        let locator = self.locator.clone();
        self.bind(token, context, &locator)
    }

    fn bind(
        &mut self,
        token: &TypeToken,
        context: ModuleId,
        locator: &dyn ModuleLocator,
    ) -> Option<ResolvedType> {
        Some(match token {
            TypeToken::Named { args, .. } => {
                let name = token.definition_name()?;
                let descriptor = self.find(&name, context, locator);
                if descriptor.is_none() && !builtin::is_framework_name(&name) {
                    return None;
                }
                let args = args
                    .iter()
                    .map(|a| self.bind(a, context, locator))
                    .collect::<Option<Vec<_>>>()?;
                match descriptor {
                    Some(descriptor) => ResolvedType::Type { descriptor, args },
                    None => ResolvedType::External { name, args },
                }
            }
            TypeToken::TypeParam(i) => ResolvedType::TypeParam(*i),
            TypeToken::MethodParam(i) => ResolvedType::MethodParam(*i),
            TypeToken::Array { element, rank } => ResolvedType::Array {
                element: Box::new(self.bind(element, context, locator)?),
                rank: *rank,
            },
            TypeToken::ByRef(inner) => {
                ResolvedType::ByRef(Box::new(self.bind(inner, context, locator)?))
            }
            TypeToken::Pointer(inner) => {
                ResolvedType::Pointer(Box::new(self.bind(inner, context, locator)?))
            }
        })
    }

    fn find(
        &mut self,
        name: &str,
        context: ModuleId,
        locator: &dyn ModuleLocator,
    ) -> Option<TypeDescriptor> {
        let key = (context, name.to_string());
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }

        let found = self
            .modules
            .find_in(ModuleId::CORE, name)
            .or_else(|| {
                let hook = self.hook?;
                hook.resolve(name, context, &mut self.modules, locator)
            })
            .or_else(|| self.scan_subject_directory(name, locator));

        if found.is_none() {
            tracing::debug!("type {} not found", name);
        }
        self.memo.insert(key, found.clone());
        found
    }

    fn scan_subject_directory(
        &mut self,
        name: &str,
        locator: &dyn ModuleLocator,
    ) -> Option<TypeDescriptor> {
        let dir: PathBuf = self
            .modules
            .get(self.subject)
            .path
            .as_ref()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())?;

        for file in module_files(&dir, self.modules.loader()) {
            let id = match self.modules.load_path(&file) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("skipping module {}: {}", file.display(), e);
                    continue;
                }
            };
            for member in self.modules.closure(id, locator) {
                if let Some(found) = self.modules.find_in(member, name) {
                    return Some(found);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::testing::*;
    use crate::module::{ManifestLoader, ModuleImage};
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;

    #[test]
    fn parse_plain_and_generic_tokens() {
        assert_eq!(
            TypeToken::parse("System.Int32"),
            TypeToken::Named {
                name: "System.Int32".to_string(),
                args: vec![]
            }
        );
        let token = TypeToken::parse(
            "System.Collections.Generic.Dictionary{System.String,System.Collections.Generic.List{``0}}",
        );
        assert_eq!(
            token.definition_name().as_deref(),
            Some("System.Collections.Generic.Dictionary`2")
        );
        assert_eq!(token.display(), "Dictionary<String, List<U>>");
    }

    #[test]
    fn parse_compound_tokens() {
        assert_eq!(TypeToken::parse("System.Int32[0:,0:]").display(), "Int32[,]");
        assert_eq!(TypeToken::parse("System.Int32@").display(), "ref Int32");
        assert_eq!(TypeToken::parse("System.Byte*").display(), "Byte*");
        assert_eq!(TypeToken::parse("`1[]").display(), "T1[]");
        assert_eq!(TypeToken::parse("``0"), TypeToken::MethodParam(0));
        assert_eq!(TypeToken::parse("``0").definition_name(), None);
    }

    #[test]
    fn framework_types_resolve_without_loading() {
        let loader = MemoryLoader::default();
        let mut resolver = TypeResolver::new(
            ModuleCache::new(&loader),
            ModuleId::CORE,
            SearchPath::default(),
        );
        let ty = resolver.resolve("System.Int32", ModuleId::CORE).unwrap();
        assert_eq!(ty.module, ModuleId::CORE);
        assert_eq!(loader.loads.get(), 0);
        assert!(resolver.resolve("Acme.Unknown", ModuleId::CORE).is_none());
    }

    #[test]
    fn near_dependencies_hook_loads_references() {
        let loader = MemoryLoader::default()
            .with("/m/App.dll", image("App", &["Lib"], vec![type_def("App.Main")]))
            .with("/m/Lib.dll", image("Lib", &[], vec![type_def("Lib.Shape")]));
        let mut modules = ModuleCache::new(&loader);
        let app = modules.load_path(Path::new("/m/App.dll")).unwrap();
        let locator = MemoryLocator {
            dir: "/m",
            loader: &loader,
        };

        let hook = NearDependencies;
        let shape = hook
            .resolve("Lib.Shape", app, &mut modules, &locator)
            .unwrap();
        assert_eq!(shape.module_name, "Lib");
        assert!(hook.resolve("Lib.Circle", app, &mut modules, &locator).is_none());
    }

    struct CountingHook<'a> {
        calls: &'a Cell<usize>,
    }

    impl TypeHook for CountingHook<'_> {
        fn resolve(
            &self,
            _name: &str,
            _context: ModuleId,
            _modules: &mut ModuleCache<'_>,
            _locator: &dyn ModuleLocator,
        ) -> Option<TypeDescriptor> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    #[test]
    fn results_are_memoized_per_context() {
        let calls = Cell::new(0);
        let hook = CountingHook { calls: &calls };
        let loader = MemoryLoader::default();
        let mut resolver = TypeResolver::new(
            ModuleCache::new(&loader),
            ModuleId::CORE,
            SearchPath::default(),
        )
        .with_hook(&hook);

        assert!(resolver.resolve("Acme.Gone", ModuleId::CORE).is_none());
        assert!(resolver.resolve("Acme.Gone", ModuleId::CORE).is_none());
        assert_eq!(calls.get(), 1);
    }

    fn write_module(dir: &Path, file: &str, image: &ModuleImage) {
        fs::write(dir.join(file), serde_json::to_string(image).unwrap()).unwrap();
    }

    #[test]
    fn directory_scan_finds_types_in_sibling_closures() {
        let dir = tempfile::tempdir().unwrap();
        let packages = tempfile::tempdir().unwrap();
        fs::create_dir_all(packages.path().join("deep/lib")).unwrap();

        write_module(dir.path(), "App.dll", &image("App", &[], vec![type_def("App.Main")]));
        fs::write(dir.path().join("Broken.dll"), "not a manifest").unwrap();
        write_module(dir.path(), "Plugin.dll", &image("Plugin", &["Shared"], vec![]));
        write_module(
            &packages.path().join("deep/lib"),
            "Shared.dll",
            &image("Shared", &[], vec![type_def("Shared.Color")]),
        );

        let loader = ManifestLoader;
        let mut modules = ModuleCache::new(&loader);
        let app = modules.load_path(&dir.path().join("App.dll")).unwrap();
        let mut resolver = TypeResolver::new(
            modules,
            app,
            SearchPath::new(Some(dir.path()), Some(packages.path())),
        );

        let color = resolver.resolve("Shared.Color", app).unwrap();
        assert_eq!(color.module_name, "Shared");
        let again = resolver.resolve("Shared.Color[]", app).unwrap();
        assert_eq!(color, again);
        assert!(resolver.resolve("Shared.Missing", app).is_none());
    }

    #[test]
    fn resolve_token_binds_generic_arguments() {
        let loader = MemoryLoader::default()
            .with("/m/App.dll", image("App", &[], vec![type_def("App.Item")]));
        let mut modules = ModuleCache::new(&loader);
        let app = modules.load_path(Path::new("/m/App.dll")).unwrap();
        let mut resolver = TypeResolver::new(modules, app, SearchPath::default())
            .with_hook(&NearDependencies);

        let token = TypeToken::parse("System.Collections.Generic.List{App.Item}");
        match resolver.resolve_token(&token, app).unwrap() {
            ResolvedType::Type { descriptor, args } => {
                assert_eq!(descriptor.full_name, "System.Collections.Generic.List`1");
                assert!(matches!(
                    &args[0],
                    ResolvedType::Type { descriptor, .. } if descriptor.full_name == "App.Item"
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
        let missing = TypeToken::parse("System.Collections.Generic.List{App.Nope}");
        assert!(resolver.resolve_token(&missing, app).is_none());
    }

    #[test]
    fn undeclared_framework_types_bind_by_name() {
        let loader = MemoryLoader::default()
            .with("/m/App.dll", image("App", &[], vec![type_def("App.Item")]));
        let mut modules = ModuleCache::new(&loader);
        let app = modules.load_path(Path::new("/m/App.dll")).unwrap();
        let mut resolver = TypeResolver::new(modules, app, SearchPath::default())
            .with_hook(&NearDependencies);

        let token = TypeToken::parse("System.Collections.Generic.KeyValuePair{System.String,App.Item}[]");
        match resolver.resolve_token(&token, app).unwrap() {
            ResolvedType::Array { element, rank: 1 } => match *element {
                ResolvedType::External { ref name, ref args } => {
                    assert_eq!(name, "System.Collections.Generic.KeyValuePair`2");
                    assert_eq!(args.len(), 2);
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }

        let stream = TypeToken::parse("System.IO.Stream");
        assert_eq!(
            resolver.resolve_token(&stream, app),
            resolver.resolve_token(&stream, app)
        );
        assert_ne!(
            resolver.resolve_token(&stream, app),
            resolver.resolve_token(&TypeToken::parse("System.IO.TextReader"), app)
        );
        assert!(resolver.resolve("System.IO.Stream", app).is_none());
        assert!(resolver
            .resolve_token(&TypeToken::parse("Acme.IO.Stream"), app)
            .is_none());
    }
}
