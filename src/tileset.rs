use std::collections::HashMap;
use std::sync::Arc;

use crate::color::Color;
use crate::geom::Vec2;
use crate::gid::Flip;
use crate::object::TileObject;
use crate::properties::Properties;

/// A reference to a tileset or tile image file. The source path stays
/// relative to the declaring document; consumers join it with their own
/// base directory when they load pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Color to treat as transparent, when the format declares one.
    pub transparent: Option<Color>,
}

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Local id of the tile shown during this frame
    pub tile_id: u32,
    pub duration_ms: u32,
}

/// Per-tile overrides, present only for tiles the document says something
/// extra about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileMeta {
    pub user_type: String,
    pub properties: Properties,
    pub animation: Vec<Frame>,
    /// Collision shapes, in tile-local pixels.
    pub collision: Vec<TileObject>,
    /// Individual image for collection-of-images tilesets.
    pub image: Option<Image>,
}

/// A parsed tileset document or embedded tileset element.
///
/// The first global id is not part of this struct: an externally-loaded
/// tileset is cached and shared between maps, and each map assigns its own
/// range at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    /// Draw offset applied to every tile of this set.
    pub tile_offset: Vec2,
    /// The shared atlas image; absent for collection-of-images tilesets.
    pub image: Option<Image>,
    pub properties: Properties,
    tiles: HashMap<u32, TileMeta>,
}

impl Tileset {
    pub(crate) fn new(
        name: String,
        tile_width: u32,
        tile_height: u32,
        spacing: u32,
        margin: u32,
        tile_count: u32,
        columns: u32,
        tile_offset: Vec2,
        image: Option<Image>,
        properties: Properties,
        tiles: HashMap<u32, TileMeta>,
    ) -> Self {
        Tileset {
            name,
            tile_width,
            tile_height,
            spacing,
            margin,
            tile_count,
            columns,
            tile_offset,
            image,
            properties,
            tiles,
        }
    }

    /// Whether `local_id` falls inside this set.
    pub fn contains_local(&self, local_id: u32) -> bool {
        local_id < self.tile_count
    }

    /// The overrides for one tile, if the document declared any.
    pub fn tile_meta(&self, local_id: u32) -> Option<&TileMeta> {
        self.tiles.get(&local_id)
    }

    /// All tiles that carry overrides, in no particular order.
    pub fn tiles_with_meta(&self) -> impl Iterator<Item = (u32, &TileMeta)> {
        self.tiles.iter().map(|(id, meta)| (*id, meta))
    }
}

/// The resolved identity of one placed tile: which tileset, which tile in
/// it, and the orientation carried over from the cell. Cells with equal gid
/// and flags resolve to interchangeable values.
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    pub tileset: Arc<Tileset>,
    pub local_id: u32,
    pub flip: Flip,
}

impl TileData {
    /// Overrides for this tile, if any.
    pub fn meta(&self) -> Option<&TileMeta> {
        self.tileset.tile_meta(self.local_id)
    }
}
