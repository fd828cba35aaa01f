//! lucid-doc: API reference documentation from a compiled module and its
//! XML comment corpus.
//!
//! ```no_run
//! use lucid_doc::DocumentationBuilder;
//! use std::path::Path;
//!
//! let builder = DocumentationBuilder::new("packages");
//! let doc = builder.build_documentation(Path::new("bin/Acme.Widgets.dll"))?;
//! println!("{} types", doc.types.len());
//! # Ok::<(), lucid_doc::DocError>(())
//! ```

pub mod assemble;
pub mod error;
pub mod model;
pub mod module;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod resolve;
pub mod toc;

pub use error::{DocError, Result};
pub use model::Documentation;

use module::{ManifestLoader, ModuleCache, ModuleLoader, SearchPath};
use resolve::{NearDependencies, TypeHook, TypeResolver};
use std::path::{Path, PathBuf};

/// Builds documentation trees, one independent build per call.
///
/// Construction takes the package resolution root searched for referenced
/// modules; each build takes the path of the subject module.
pub struct DocumentationBuilder {
    package_resolution_path: PathBuf,
    loader: Box<dyn ModuleLoader>,
    hook: Option<Box<dyn TypeHook>>,
}

impl DocumentationBuilder {
    pub fn new(package_resolution_path: impl Into<PathBuf>) -> Self {
        DocumentationBuilder {
            package_resolution_path: package_resolution_path.into(),
            loader: Box::new(ManifestLoader),
            hook: None,
        }
    }

    /// Replace the host module loader.
    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Replace the type hook consulted after the built-in types.
    /// Defaults to [`NearDependencies`].
    pub fn with_hook(mut self, hook: impl TypeHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn package_resolution_path(&self) -> &Path {
        &self.package_resolution_path
    }

    /// Build the document tree for the module at `module_path`.
    ///
    /// Every failure comes back as [`DocError::Build`] carrying the module
    /// path and the underlying cause.
    pub fn build_documentation(&self, module_path: &Path) -> Result<Documentation> {
        self.build(module_path)
            .map_err(|e| DocError::build(module_path, e))
    }

    /// Build and render in one step.
    pub fn render_documentation(&self, module_path: &Path, format: &str) -> Result<String> {
        let renderer = render::create_renderer(format)?;
        let doc = self.build_documentation(module_path)?;
        renderer.render(&doc)
    }

    fn build(&self, module_path: &Path) -> Result<Documentation> {
        let mut modules = ModuleCache::new(self.loader.as_ref());
        let subject = modules.load_path(module_path)?;
        let corpus = parser::load_corpus(module_path)?;
        if corpus.skipped > 0 {
            tracing::warn!("{} malformed corpus entries skipped", corpus.skipped);
        }

        let locator = SearchPath::new(module_path.parent(), Some(&self.package_resolution_path));
        let hook: &dyn TypeHook = match self.hook {
            Some(ref hook) => &**hook,
            None => &NearDependencies,
        };
        let mut types = TypeResolver::new(modules, subject, locator).with_hook(hook);

        let name = types.modules().get(subject).name().to_string();
        if let Some(ref described) = corpus.module_name {
            if described != &name {
                tracing::warn!(
                    "{} documents module {} but the module is {}",
                    parser::corpus_path(module_path).display(),
                    described,
                    name
                );
            }
        }
        tracing::info!(
            "documenting {} ({} corpus entries)",
            name,
            corpus.entries.len()
        );
        let doc = assemble::assemble(&name, &corpus.entries, &mut types)?;
        tracing::info!(
            "{}: {} types, {} modules loaded",
            name,
            doc.types.len(),
            types.modules().loaded_count()
        );
        Ok(doc)
    }
}
