//! Parsing entry points and the external-document caches.

mod template;
mod tmx;
mod tsx;
pub(crate) mod xml;

use std::path::Path;
use std::sync::Arc;

use crate::error::MapError;
use crate::map::Tilemap;
use crate::registry::DocumentCache;
use crate::resources::{FileProvider, Provider};
use crate::tileset::Tileset;

pub use template::ObjectTemplate;

/// Parses map documents and caches the external tilesets and templates
/// they reference.
///
/// A `Loader` may be shared between threads; when several parses reference
/// the same external document concurrently, exactly one of them parses it
/// and the rest wait for that result. Keep one `Loader` around for as long
/// as its cache should live.
pub struct Loader {
    provider: Box<dyn Provider>,
    tilesets: DocumentCache<Tileset>,
    templates: DocumentCache<ObjectTemplate>,
}

impl Default for Loader {
    fn default() -> Self {
        Loader::new()
    }
}

impl Loader {
    /// A loader reading from the filesystem.
    pub fn new() -> Self {
        Loader::with_provider(Box::new(FileProvider))
    }

    /// A loader retrieving bytes through `provider` instead of the
    /// filesystem.
    pub fn with_provider(provider: Box<dyn Provider>) -> Self {
        Loader {
            provider,
            tilesets: DocumentCache::new(),
            templates: DocumentCache::new(),
        }
    }

    /// Load and parse the map document at `path`. External references are
    /// resolved relative to the map's directory.
    pub fn load_map(&self, path: impl AsRef<Path>) -> Result<Tilemap, MapError> {
        let path = path.as_ref();
        let xml = self.load_text(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tmx::parse_map(self, &xml, &base_dir)
    }

    /// Parse a map document already in memory. External references are
    /// resolved relative to `base_dir`.
    pub fn parse_map_str(&self, xml: &str, base_dir: &Path) -> Result<Tilemap, MapError> {
        tmx::parse_map(self, xml, base_dir)
    }

    /// Load an external tileset document, parsing it at most once per
    /// canonical path for the lifetime of this loader.
    pub fn load_tileset(&self, path: &Path) -> Result<Arc<Tileset>, MapError> {
        let key = self.provider.canonical(path);
        self.tilesets.get_or_parse(&key, || {
            let xml = self.load_text(path)?;
            tsx::parse_tileset_document(&xml)
        })
    }

    /// Load an object template document, with the same cache discipline as
    /// tilesets.
    pub fn load_template(&self, path: &Path) -> Result<Arc<ObjectTemplate>, MapError> {
        let key = self.provider.canonical(path);
        self.templates.get_or_parse(&key, || {
            let xml = self
                .load_text(path)
                .map_err(|_| MapError::MissingTemplate { path: path.to_path_buf() })?;
            let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            template::parse_template_document(self, &xml, &base_dir)
        })
    }

    fn load_text(&self, path: &Path) -> Result<String, MapError> {
        let bytes = self.provider.load(path)?;
        String::from_utf8(bytes).map_err(|_| MapError::MalformedDocument {
            element: "document".into(),
            attribute: String::new(),
            detail: format!("{} is not valid UTF-8", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory provider for fixture documents.
    struct MemoryProvider {
        files: HashMap<PathBuf, Vec<u8>>,
    }

    impl Provider for MemoryProvider {
        fn load(&self, path: &Path) -> Result<Vec<u8>, MapError> {
            self.files
                .get(&crate::resources::normalize(path))
                .cloned()
                .ok_or_else(|| MapError::MissingExternalResource {
                    path: path.to_path_buf(),
                    detail: "not in fixture set".into(),
                })
        }
    }

    fn loader_with(files: &[(&str, &str)]) -> Loader {
        let files = files
            .iter()
            .map(|(p, c)| (PathBuf::from(*p), c.as_bytes().to_vec()))
            .collect();
        Loader::with_provider(Box::new(MemoryProvider { files }))
    }

    const TSX: &str = r#"
        <tileset name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
          <image source="terrain.png" width="32" height="32"/>
        </tileset>
    "#;

    #[test]
    fn external_tilesets_parse_once_per_canonical_path() {
        let loader = loader_with(&[("maps/terrain.tsx", TSX)]);

        let a = loader.load_tileset(Path::new("maps/terrain.tsx")).unwrap();
        // a different spelling of the same path hits the cache
        let b = loader.load_tileset(Path::new("maps/./terrain.tsx")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn missing_template_maps_to_missing_template() {
        let loader = loader_with(&[]);
        let err = loader.load_template(Path::new("door.tx")).unwrap_err();
        assert_eq!(err, MapError::MissingTemplate { path: PathBuf::from("door.tx") });
    }

    #[test]
    fn loader_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Loader>();
    }

    #[test]
    fn concurrent_tileset_loads_share_one_parse() {
        let loader = std::sync::Arc::new(loader_with(&[("terrain.tsx", TSX)]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let loader = loader.clone();
                std::thread::spawn(move || loader.load_tileset(Path::new("terrain.tsx")).unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in results.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }
}
