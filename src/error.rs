use std::fmt;
use std::path::PathBuf;

/// Error type for map, tileset and template parsing.
///
/// Every variant identifies one specific offending construct; a failed parse
/// never yields a partially-built map. Variants are cheap to clone so cached
/// external-document results can hand the same failure to every waiter.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// A required element or attribute is missing, or its value has the
    /// wrong shape.
    MalformedDocument {
        /// Tag name of the element at fault
        element: String,
        /// Attribute at fault, empty when the element itself is the problem
        attribute: String,
        /// What was wrong
        detail: String,
    },
    /// The map declares an orientation outside the four supported kinds.
    UnsupportedProjection {
        /// The declared orientation value
        value: String,
    },
    /// Layer data declares an unknown compression scheme, or the stream
    /// could not be inflated.
    UnsupportedCompression {
        /// The declared compression value
        value: String,
        /// Underlying reason
        detail: String,
    },
    /// A decoded payload does not contain exactly the declared cell count.
    CellCountMismatch {
        /// Cells the layer or chunk dimensions call for
        expected: usize,
        /// Cells the payload actually decoded to
        actual: usize,
    },
    /// Layer data could not be decoded into cells.
    MalformedPayload {
        /// What was wrong
        detail: String,
    },
    /// A tileset's global-id range intersects an already-registered range.
    OverlappingTilesetRange {
        /// First global id of the rejected range
        first_gid: u32,
        /// Tile count of the rejected range
        count: u32,
    },
    /// A non-empty cell references a global id outside every registered
    /// tileset range.
    UnresolvedGlobalId {
        /// The offending global id, flip flags already masked off
        id: u32,
    },
    /// An object template document could not be loaded.
    MissingTemplate {
        /// Path of the template reference
        path: PathBuf,
    },
    /// A referenced external document could not be retrieved.
    MissingExternalResource {
        /// Path of the reference
        path: PathBuf,
        /// Underlying reason
        detail: String,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::MalformedDocument { element, attribute, detail } => {
                if attribute.is_empty() {
                    write!(f, "malformed <{}>: {}", element, detail)
                } else {
                    write!(f, "malformed <{}> attribute '{}': {}", element, attribute, detail)
                }
            }
            MapError::UnsupportedProjection { value } => {
                write!(f, "unsupported map orientation '{}'", value)
            }
            MapError::UnsupportedCompression { value, detail } => {
                write!(f, "unsupported compression '{}': {}", value, detail)
            }
            MapError::CellCountMismatch { expected, actual } => {
                write!(f, "layer data holds {} cells, expected {}", actual, expected)
            }
            MapError::MalformedPayload { detail } => {
                write!(f, "malformed layer data: {}", detail)
            }
            MapError::OverlappingTilesetRange { first_gid, count } => {
                write!(
                    f,
                    "tileset range [{}, {}) overlaps an already-registered tileset",
                    first_gid,
                    first_gid.saturating_add(*count)
                )
            }
            MapError::UnresolvedGlobalId { id } => {
                write!(f, "global tile id {} is not covered by any tileset", id)
            }
            MapError::MissingTemplate { path } => {
                write!(f, "object template {} could not be loaded", path.display())
            }
            MapError::MissingExternalResource { path, detail } => {
                write!(f, "external document {}: {}", path.display(), detail)
            }
        }
    }
}

impl std::error::Error for MapError {}
