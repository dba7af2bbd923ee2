#![warn(missing_docs)]

//! Renderer-agnostic loader & in-memory model for Tiled TMX/TSX maps.
//!
//! A [`Loader`] turns a map document into a [`Tilemap`]: a tree of
//! [`Layer`]s, the map's resolved [`Tileset`]s, and the geometry needed to
//! convert between tile coordinates and local pixel positions. Rendering,
//! physics and pathfinding live outside this crate and consume the model
//! read-only.
//!
//! ```no_run
//! let loader = tiled_ir::Loader::new();
//! let map = loader.load_map("assets/level1.tmx")?;
//!
//! for layer in map.iter_layers() {
//!     println!("layer '{}'", layer.meta().name);
//! }
//! # Ok::<(), tiled_ir::MapError>(())
//! ```

mod color;
mod data;
mod error;
mod geom;
mod gid;
mod grid;
mod layer;
mod loader;
mod map;
mod object;
mod properties;
mod registry;
mod resources;
mod tileset;

pub use color::Color;
pub use data::{decode_cells, Compression, Encoding};
pub use error::MapError;
pub use geom::{vec2, Vec2};
pub use gid::{Flip, Gid, FLIP_DIAGONAL, FLIP_HORIZONTAL, FLIP_VERTICAL, ID_MASK};
pub use grid::{Grid, Projection, StaggerAxis, StaggerIndex};
pub use layer::{Chunk, GroupLayer, ImageLayer, Layer, LayerMeta, ObjectLayer, TileLayer, TileStorage};
pub use loader::{Loader, ObjectTemplate};
pub use map::{LayerIter, RenderOrder, Tilemap};
pub use object::{ObjectShape, TileObject};
pub use properties::{Properties, PropertyValue};
pub use registry::TilesetRegistry;
pub use resources::{FileProvider, Provider};
pub use tileset::{Frame, Image, TileData, TileMeta, Tileset};
