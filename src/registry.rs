//! Global-id range bookkeeping and the external-document cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};

use crate::error::MapError;
use crate::tileset::Tileset;

#[derive(Debug)]
struct RangeEntry {
    first_gid: u32,
    tileset: Arc<Tileset>,
}

/// The ordered set of tilesets registered into one map, each owning a
/// contiguous range of global ids.
#[derive(Debug, Default)]
pub struct TilesetRegistry {
    // sorted by first_gid; ranges never overlap
    ranges: Vec<RangeEntry>,
}

impl TilesetRegistry {
    pub fn new() -> Self {
        TilesetRegistry { ranges: Vec::new() }
    }

    /// Assign `[first_gid, first_gid + tile_count)` to `tileset`.
    ///
    /// Maps carry a handful of tilesets, so the intersection check is a
    /// plain scan; only resolution is on the hot path.
    pub fn register(&mut self, tileset: Arc<Tileset>, first_gid: u32) -> Result<(), MapError> {
        let count = tileset.tile_count;
        let end = first_gid.saturating_add(count);
        let intersects = self.ranges.iter().any(|e| {
            let e_end = e.first_gid.saturating_add(e.tileset.tile_count);
            first_gid < e_end && e.first_gid < end
        });
        if intersects {
            return Err(MapError::OverlappingTilesetRange { first_gid, count });
        }

        let pos = self.ranges.partition_point(|e| e.first_gid < first_gid);
        self.ranges.insert(pos, RangeEntry { first_gid, tileset });
        Ok(())
    }

    /// Resolve a global id to its tileset and local id.
    ///
    /// Id 0 never reaches this point; the cell codec treats it as empty
    /// before resolution. An id no range covers is an error, not empty.
    pub fn resolve(&self, gid: u32) -> Result<(Arc<Tileset>, u32), MapError> {
        let pos = self.ranges.partition_point(|e| e.first_gid <= gid);
        // walk back over empty ranges; the first non-empty candidate decides
        for entry in self.ranges[..pos].iter().rev() {
            let local = gid - entry.first_gid;
            if entry.tileset.contains_local(local) {
                return Ok((entry.tileset.clone(), local));
            }
            if entry.tileset.tile_count > 0 {
                break;
            }
        }
        Err(MapError::UnresolvedGlobalId { id: gid })
    }

    /// Registered tilesets in ascending first-gid order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<Tileset>)> {
        self.ranges.iter().map(|e| (e.first_gid, &e.tileset))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

enum Slot<T> {
    InFlight,
    Done(Result<Arc<T>, MapError>),
}

/// A map-with-lock cache of parsed external documents, keyed by canonical
/// path, guaranteeing at most one in-flight parse per key.
///
/// The first caller to miss inserts an in-flight marker, releases the lock,
/// parses, and publishes the result; callers that hit the marker block on
/// the condvar and wake to the published entry. Failures are published the
/// same way, so every caller for a path sees the same outcome and no path
/// is ever parsed twice.
pub(crate) struct DocumentCache<T> {
    slots: Mutex<HashMap<PathBuf, Slot<T>>>,
    ready: Condvar,
}

impl<T> DocumentCache<T> {
    pub fn new() -> Self {
        DocumentCache {
            slots: Mutex::new(HashMap::new()),
            ready: Condvar::new(),
        }
    }

    pub fn get_or_parse(
        &self,
        key: &Path,
        parse: impl FnOnce() -> Result<T, MapError>,
    ) -> Result<Arc<T>, MapError> {
        let mut slots = self.slots.lock().expect("document cache poisoned");
        loop {
            match slots.get(key) {
                Some(Slot::Done(result)) => return result.clone(),
                Some(Slot::InFlight) => {
                    slots = self.ready.wait(slots).expect("document cache poisoned");
                }
                None => break,
            }
        }
        slots.insert(key.to_path_buf(), Slot::InFlight);
        drop(slots);

        let result = parse().map(Arc::new);

        let mut slots = self.slots.lock().expect("document cache poisoned");
        slots.insert(key.to_path_buf(), Slot::Done(result.clone()));
        self.ready.notify_all();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec2;
    use crate::properties::Properties;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tileset(count: u32) -> Arc<Tileset> {
        Arc::new(Tileset::new(
            "t".into(),
            16,
            16,
            0,
            0,
            count,
            count.min(8),
            Vec2::ZERO,
            None,
            Properties::new(),
            HashMap::new(),
        ))
    }

    #[test]
    fn adjacent_ranges_register_and_resolve() {
        let mut reg = TilesetRegistry::new();
        reg.register(tileset(10), 1).unwrap();
        reg.register(tileset(10), 11).unwrap();

        let (ts, local) = reg.resolve(11).unwrap();
        assert_eq!(ts.tile_count, 10);
        assert_eq!(local, 0);
        let (_, local) = reg.resolve(10).unwrap();
        assert_eq!(local, 9);
    }

    #[test]
    fn intersecting_range_is_rejected() {
        let mut reg = TilesetRegistry::new();
        reg.register(tileset(10), 0).unwrap();
        let err = reg.register(tileset(10), 5).unwrap_err();
        assert_eq!(err, MapError::OverlappingTilesetRange { first_gid: 5, count: 10 });
    }

    #[test]
    fn uncovered_gid_is_an_error_not_empty() {
        let mut reg = TilesetRegistry::new();
        reg.register(tileset(4), 1).unwrap();
        let err = reg.resolve(99).unwrap_err();
        assert_eq!(err, MapError::UnresolvedGlobalId { id: 99 });
    }

    #[test]
    fn registration_order_does_not_matter_for_resolution() {
        let mut reg = TilesetRegistry::new();
        reg.register(tileset(4), 100).unwrap();
        reg.register(tileset(4), 1).unwrap();
        assert_eq!(reg.resolve(102).unwrap().1, 2);
        assert_eq!(reg.resolve(3).unwrap().1, 2);
        let firsts: Vec<u32> = reg.iter().map(|(g, _)| g).collect();
        assert_eq!(firsts, [1, 100]);
    }

    #[test]
    fn cache_parses_each_key_once() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);
        let key = Path::new("a/b.tsx");

        let first = cache
            .get_or_parse(key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7usize)
            })
            .unwrap();
        let second = cache
            .get_or_parse(key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(8usize)
            })
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn cache_replays_failures() {
        let cache: DocumentCache<usize> = DocumentCache::new();
        let key = Path::new("missing.tsx");
        let err = MapError::MissingExternalResource {
            path: key.to_path_buf(),
            detail: "gone".into(),
        };

        let first = cache.get_or_parse(key, || Err(err.clone())).unwrap_err();
        // the second closure must not run at all
        let second = cache.get_or_parse(key, || panic!("reparsed")).unwrap_err();
        assert_eq!(first, second);
    }
}
