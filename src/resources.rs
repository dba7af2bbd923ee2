//! Pluggable byte retrieval for external documents.
//!
//! The core never touches the filesystem directly; a [`Provider`] maps a
//! path to bytes, and callers that load from archives, embedded assets or a
//! test fixture supply their own. Only the parsing of a retrieved document
//! is cached and serialized, never the provider call itself.

use std::path::{Component, Path, PathBuf};

use crate::error::MapError;

/// Maps a document path to its raw bytes.
pub trait Provider: Send + Sync {
    /// Retrieve the bytes of the document at `path`.
    fn load(&self, path: &Path) -> Result<Vec<u8>, MapError>;

    /// The cache key for `path`. Two spellings of the same document must
    /// produce the same key so it is parsed only once.
    fn canonical(&self, path: &Path) -> PathBuf {
        normalize(path)
    }
}

/// The default provider: plain filesystem reads.
#[derive(Debug, Default)]
pub struct FileProvider;

impl Provider for FileProvider {
    fn load(&self, path: &Path) -> Result<Vec<u8>, MapError> {
        std::fs::read(path).map_err(|e| MapError::MissingExternalResource {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        // fall back to the lexical form for paths that do not exist yet,
        // so the cache still records the failed lookup under one key
        path.canonicalize().unwrap_or_else(|_| normalize(path))
    }
}

/// Lexically resolve `.` and `..` components without consulting the
/// filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_relative_segments() {
        assert_eq!(normalize(Path::new("a/./b/../c.tsx")), PathBuf::from("a/c.tsx"));
        assert_eq!(normalize(Path::new("../x/y.tsx")), PathBuf::from("../x/y.tsx"));
    }

    #[test]
    fn missing_file_maps_to_missing_external_resource() {
        let err = FileProvider.load(Path::new("no/such/file.tsx")).unwrap_err();
        assert!(matches!(err, MapError::MissingExternalResource { .. }));
    }
}
