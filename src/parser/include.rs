//! Resolution of `include 'file';` statements
//!
//! The core never touches the filesystem on its own: the host hands the parser an
//! [`IncludeResolver`] that turns an include request into program text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions tried, in order, when a request has none
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["mima", "mimax"];

/// Text of an included file and the path that identifies it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInclude {
    pub path: PathBuf,
    pub source: String,
}

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("can't find file `{0}`")]
    NotFound(String),

    #[error("can't load file `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("includes are not available here (requested `{0}`)")]
    Unavailable(String),
}

pub trait IncludeResolver {
    /// Resolve `request`, written in the file at `from`
    fn resolve(&mut self, request: &str, from: &Path) -> Result<ResolvedInclude, IncludeError>;
}

/// Rejects every include
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&mut self, request: &str, _from: &Path) -> Result<ResolvedInclude, IncludeError> {
        Err(IncludeError::Unavailable(request.to_string()))
    }
}

/// In-memory files keyed by the exact include request
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    files: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.files.insert(name.into(), source.into());
        self
    }
}

impl IncludeResolver for MapResolver {
    fn resolve(&mut self, request: &str, _from: &Path) -> Result<ResolvedInclude, IncludeError> {
        self.files
            .get(request)
            .map(|source| ResolvedInclude {
                path: PathBuf::from(request),
                source: source.clone(),
            })
            .ok_or_else(|| IncludeError::NotFound(request.to_string()))
    }
}

/// Looks next to the including file first, then in each search path
#[derive(Debug, Clone)]
pub struct FsResolver {
    search_paths: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl Default for FsResolver {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl FsResolver {
    pub fn new(search_paths: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            search_paths,
            extensions,
        }
    }

    fn candidates(&self, request: &str, from: &Path) -> Vec<PathBuf> {
        let base_dirs = from
            .parent()
            .map(Path::to_path_buf)
            .into_iter()
            .chain(self.search_paths.iter().cloned());

        let mut candidates = Vec::new();
        for dir in base_dirs {
            let exact = dir.join(request);
            if exact.extension().is_none() {
                candidates.extend(self.extensions.iter().map(|ext| exact.with_extension(ext)));
            }
            candidates.push(exact);
        }
        candidates
    }
}

impl IncludeResolver for FsResolver {
    fn resolve(&mut self, request: &str, from: &Path) -> Result<ResolvedInclude, IncludeError> {
        let path = self
            .candidates(request, from)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| IncludeError::NotFound(request.to_string()))?;

        let source = std::fs::read_to_string(&path).map_err(|source| IncludeError::Io {
            path: path.clone(),
            source,
        })?;
        let path = path.canonicalize().unwrap_or(path);
        Ok(ResolvedInclude { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_fs_resolver_tries_extensions_and_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        fs::create_dir(&lib).unwrap();
        fs::write(lib.join("util.mimax"), "const ONE = 1;").unwrap();

        let mut resolver = FsResolver::new(vec![lib], vec!["mima".into(), "mimax".into()]);
        let resolved = resolver
            .resolve("util", &dir.path().join("main.mima"))
            .unwrap();

        assert_eq!(resolved.source, "const ONE = 1;");
        assert!(resolved.path.ends_with("util.mimax"));
    }

    #[test]
    fn test_fs_resolver_prefers_including_directory() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        fs::create_dir(&lib).unwrap();
        fs::write(dir.path().join("defs.mima"), "local").unwrap();
        fs::write(lib.join("defs.mima"), "library").unwrap();

        let mut resolver = FsResolver::new(vec![lib], vec!["mima".into()]);
        let resolved = resolver
            .resolve("defs.mima", &dir.path().join("main.mima"))
            .unwrap();
        assert_eq!(resolved.source, "local");
    }

    #[test]
    fn test_fs_resolver_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = FsResolver::default();
        let err = resolver
            .resolve("nowhere", &dir.path().join("main.mima"))
            .unwrap_err();
        assert!(matches!(err, IncludeError::NotFound(ref name) if name == "nowhere"));
    }

    #[test]
    fn test_no_includes() {
        let err = NoIncludes.resolve("x", Path::new("main.mima")).unwrap_err();
        assert!(err.to_string().contains("not available"));
    }
}
