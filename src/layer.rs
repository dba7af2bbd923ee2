use std::collections::HashMap;

use crate::geom::Vec2;
use crate::gid::Gid;
use crate::object::TileObject;
use crate::properties::Properties;
use crate::tileset::Image;

/// Fields shared by every layer kind.
///
/// Visibility, opacity and offset are the model's only mutable surface; a
/// consumer may toggle them after the parse. Everything else is rebuilt by
/// re-parsing, never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerMeta {
    /// The document-assigned layer id, unique within the map.
    pub id: u32,
    pub name: String,
    pub opacity: f32,
    pub visible: bool,
    /// Render offset in local pixels.
    pub offset: Vec2,
    pub properties: Properties,
}

/// One layer of the map. Consumers match on the variant; there is no
/// downcasting and no shared base class.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Tile(TileLayer),
    Object(ObjectLayer),
    Image(ImageLayer),
    Group(GroupLayer),
}

impl Layer {
    /// The shared fields, whichever the variant.
    pub fn meta(&self) -> &LayerMeta {
        match self {
            Layer::Tile(l) => &l.meta,
            Layer::Object(l) => &l.meta,
            Layer::Image(l) => &l.meta,
            Layer::Group(l) => &l.meta,
        }
    }

    /// Mutable access to the shared fields (the post-load mutation surface).
    pub fn meta_mut(&mut self) -> &mut LayerMeta {
        match self {
            Layer::Tile(l) => &mut l.meta,
            Layer::Object(l) => &mut l.meta,
            Layer::Image(l) => &mut l.meta,
            Layer::Group(l) => &mut l.meta,
        }
    }
}

/// Cell storage for one tile layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TileStorage {
    /// A finite map's dense cell rectangle, row-major.
    Finite {
        width: u32,
        height: u32,
        cells: Vec<Gid>,
    },
    /// An infinite map's sparse chunk set, keyed by chunk origin. Origins
    /// are aligned to the chunk size, as the editor writes them.
    Chunked {
        chunk_width: u32,
        chunk_height: u32,
        chunks: HashMap<(i32, i32), Chunk>,
    },
}

/// One rectangular piece of an infinite layer. Chunks never overlap; the
/// gaps between them are empty cells, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Row-major cells covering the chunk rectangle.
    pub cells: Vec<Gid>,
}

/// A grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub meta: LayerMeta,
    pub storage: TileStorage,
}

impl TileLayer {
    /// The raw cell at `(col, row)`; empty outside the stored region.
    pub fn gid_at(&self, col: i32, row: i32) -> Gid {
        match &self.storage {
            TileStorage::Finite { width, height, cells } => {
                if col < 0 || row < 0 || col >= *width as i32 || row >= *height as i32 {
                    return Gid::EMPTY;
                }
                cells[row as usize * *width as usize + col as usize]
            }
            TileStorage::Chunked { chunk_width, chunk_height, chunks } => {
                let cw = *chunk_width as i32;
                let ch = *chunk_height as i32;
                let origin = (col.div_euclid(cw) * cw, row.div_euclid(ch) * ch);
                match chunks.get(&origin) {
                    Some(chunk) => {
                        let dx = col - chunk.x;
                        let dy = row - chunk.y;
                        // a chunk smaller than the chunk grid leaves the rest
                        // of its cell empty
                        if dx >= chunk.width as i32 || dy >= chunk.height as i32 {
                            return Gid::EMPTY;
                        }
                        chunk.cells[dy as usize * chunk.width as usize + dx as usize]
                    }
                    None => Gid::EMPTY,
                }
            }
        }
    }
}

/// An ordered collection of free-floating objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLayer {
    pub meta: LayerMeta,
    pub objects: Vec<TileObject>,
}

/// A single background/foreground image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    pub meta: LayerMeta,
    pub image: Option<Image>,
}

/// A layer grouping nested sub-layers; the only recursive layer kind.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayer {
    pub meta: LayerMeta,
    pub layers: Vec<Layer>,
}
