//! Locating module files on disk.

use super::{ModuleLoader, MODULE_EXTENSION};
use std::fs;
use std::path::{Path, PathBuf};

/// Maps a referenced module name to a file that can be loaded.
///
/// Passed explicitly to every resolution call that may need to load
/// referenced modules.
pub trait ModuleLocator {
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Directories searched for `<name>.dll`: flat ones first (the module's own
/// directory), then recursive package roots.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    pub dirs: Vec<PathBuf>,
    pub roots: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dir: Option<&Path>, root: Option<&Path>) -> Self {
        SearchPath {
            dirs: dir.map(Path::to_path_buf).into_iter().collect(),
            roots: root.map(Path::to_path_buf).into_iter().collect(),
        }
    }
}

impl ModuleLocator for SearchPath {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{}.{}", name, MODULE_EXTENSION);

        let flat = self
            .dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file());
        if flat.is_some() {
            return flat;
        }

        self.roots.iter().find_map(|root| find_file(root, &file_name))
    }
}

/// Search `root` recursively for `file_name`; first match in sorted path order.
pub fn find_file(root: &Path, file_name: &str) -> Option<PathBuf> {
    let pattern = format!(
        "{}/**/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        glob::Pattern::escape(file_name)
    );

    let mut matches: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(|r| r.ok()).filter(|p| p.is_file()).collect(),
        Err(e) => {
            tracing::warn!("invalid search pattern {}: {}", pattern, e);
            return None;
        }
    };
    matches.sort();
    matches.into_iter().next()
}

/// Module files directly inside `dir`, sorted for deterministic search order.
pub fn module_files(dir: &Path, loader: &dyn ModuleLoader) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot enumerate {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && loader.is_module(p))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ManifestLoader;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn find_file_searches_nested_directories() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("packages/acme.core/1.2.0/lib/Acme.Core.dll"));
        touch(&dir.path().join("packages/zeta/Acme.Core.dll"));

        let found = find_file(dir.path(), "Acme.Core.dll").unwrap();
        assert!(found.ends_with("packages/acme.core/1.2.0/lib/Acme.Core.dll"));
        assert_eq!(find_file(dir.path(), "Missing.dll"), None);
    }

    #[test]
    fn flat_directory_wins_over_package_root() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("bin/Acme.Core.dll"));
        touch(&dir.path().join("packages/a/Acme.Core.dll"));

        let search = SearchPath::new(
            Some(&dir.path().join("bin")),
            Some(&dir.path().join("packages")),
        );
        assert_eq!(
            search.locate("Acme.Core"),
            Some(dir.path().join("bin/Acme.Core.dll"))
        );
        assert_eq!(
            search.locate("Acme.Core").map(|p| p.is_file()),
            Some(true)
        );
    }

    #[test]
    fn module_files_are_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("b.dll"));
        touch(&dir.path().join("a.dll"));
        touch(&dir.path().join("a.xml"));
        touch(&dir.path().join("sub/c.dll"));

        let names: Vec<String> = module_files(dir.path(), &ManifestLoader)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.dll", "b.dll"]);
    }
}
