use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use crate::color::Color;
use crate::error::MapError;
use crate::geom::Vec2;
use crate::gid::{Flip, Gid};
use crate::grid::Grid;
use crate::layer::{Layer, ObjectLayer, TileLayer};
use crate::object::TileObject;
use crate::properties::Properties;
use crate::registry::TilesetRegistry;
use crate::tileset::{TileData, Tileset};

/// The order tiles within a layer are meant to be drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderOrder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

impl FromStr for RenderOrder {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, MapError> {
        match s {
            "right-down" => Ok(RenderOrder::RightDown),
            "right-up" => Ok(RenderOrder::RightUp),
            "left-down" => Ok(RenderOrder::LeftDown),
            "left-up" => Ok(RenderOrder::LeftUp),
            other => Err(MapError::MalformedDocument {
                element: "map".into(),
                attribute: "renderorder".into(),
                detail: format!("unknown render order '{}'", other),
            }),
        }
    }
}

/// The parsed map: layer tree, resolved tilesets and the query surface
/// consumers read it through.
///
/// Constructed once per parse and logically immutable afterwards; the only
/// mutable surface is layer visibility/opacity/offset (through
/// [`Layer::meta_mut`]) and the isolated-layer set below.
#[derive(Debug)]
pub struct Tilemap {
    /// Format version of the source document.
    pub version: String,
    /// Map geometry, shared by every coordinate query.
    pub grid: Grid,
    pub render_order: RenderOrder,
    /// Declared size in tiles. Advisory when `infinite` is set; chunked
    /// layers may extend past it.
    pub width: u32,
    pub height: u32,
    pub infinite: bool,
    pub background: Option<Color>,
    layers: Vec<Layer>,
    registry: TilesetRegistry,
    pub properties: Properties,
    isolated: HashSet<u32>,
}

impl Tilemap {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        version: String,
        grid: Grid,
        render_order: RenderOrder,
        width: u32,
        height: u32,
        infinite: bool,
        background: Option<Color>,
        layers: Vec<Layer>,
        registry: TilesetRegistry,
        properties: Properties,
    ) -> Self {
        Tilemap {
            version,
            grid,
            render_order,
            width,
            height,
            infinite,
            background,
            layers,
            registry,
            properties,
            isolated: HashSet::new(),
        }
    }

    /// Top-level layers in document order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to the top-level layers, for the visibility/opacity/
    /// offset mutation surface.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Every layer in depth-first document order, group contents included.
    pub fn iter_layers(&self) -> LayerIter<'_> {
        LayerIter::new(&self.layers)
    }

    /// The first layer named `name`, searching depth-first.
    pub fn layer_named(&self, name: &str) -> Option<&Layer> {
        self.iter_layers().find(|l| l.meta().name == name)
    }

    /// Registered tilesets with their first gids, ascending.
    pub fn tilesets(&self) -> impl Iterator<Item = (u32, &Arc<Tileset>)> {
        self.registry.iter()
    }

    /// The resolved tile at `(col, row)` of a tile layer, or `None` for an
    /// empty cell.
    pub fn tile_at(&self, layer: &TileLayer, col: i32, row: i32) -> Option<TileData> {
        self.resolve_cell(layer.gid_at(col, row))
    }

    /// Resolve any raw cell value to its tileset identity.
    pub fn resolve_cell(&self, cell: Gid) -> Option<TileData> {
        if cell.is_empty() {
            return None;
        }
        let (tileset, local_id) = self.registry.resolve(cell.id()).ok()?;
        Some(TileData { tileset, local_id, flip: cell.flip() })
    }

    /// The tileset covering a gid, with the local id and the flip flags the
    /// cell carries.
    pub fn tileset_for(&self, cell: Gid) -> Option<(Arc<Tileset>, u32, Flip)> {
        let data = self.resolve_cell(cell)?;
        Some((data.tileset, data.local_id, data.flip))
    }

    /// Objects across every object layer, in layer-then-document order,
    /// optionally filtered by user type.
    pub fn objects<'a>(&'a self, of_type: Option<&'a str>) -> impl Iterator<Item = &'a TileObject> {
        self.iter_layers()
            .filter_map(|layer| match layer {
                Layer::Object(ObjectLayer { objects, .. }) => Some(objects.iter()),
                _ => None,
            })
            .flatten()
            .filter(move |object| match of_type {
                Some(t) => object.user_type == t,
                None => true,
            })
    }

    /// Local pixel position of a tile coordinate under this map's
    /// projection.
    pub fn tile_to_local(&self, col: i32, row: i32) -> Vec2 {
        self.grid.tile_to_local(col, row)
    }

    /// Tile coordinate under a local pixel position; the exact inverse of
    /// [`Tilemap::tile_to_local`] on tile positions.
    pub fn local_to_tile(&self, point: Vec2) -> (i32, i32) {
        self.grid.local_to_tile(point)
    }

    /// Replace the isolated-layer set. Pure list membership for renderers;
    /// parsing state and identifiers are unaffected.
    pub fn set_isolated_layers(&mut self, layer_ids: impl IntoIterator<Item = u32>) {
        self.isolated = layer_ids.into_iter().collect();
    }

    pub fn clear_isolated_layers(&mut self) {
        self.isolated.clear();
    }

    /// Whether any layers are isolated at all.
    pub fn has_isolated_layers(&self) -> bool {
        !self.isolated.is_empty()
    }

    /// Whether the layer with `layer_id` is in the isolated set.
    pub fn is_layer_isolated(&self, layer_id: u32) -> bool {
        self.isolated.contains(&layer_id)
    }
}

/// Depth-first walk over a layer tree, yielding groups before their
/// contents.
pub struct LayerIter<'a> {
    stack: Vec<std::slice::Iter<'a, Layer>>,
}

impl<'a> LayerIter<'a> {
    fn new(layers: &'a [Layer]) -> Self {
        LayerIter { stack: vec![layers.iter()] }
    }
}

impl<'a> Iterator for LayerIter<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<&'a Layer> {
        while let Some(top) = self.stack.last_mut() {
            match top.next() {
                Some(layer) => {
                    if let Layer::Group(group) = layer {
                        self.stack.push(group.layers.iter());
                    }
                    return Some(layer);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{GroupLayer, LayerMeta, TileStorage};

    fn meta(id: u32, name: &str) -> LayerMeta {
        LayerMeta {
            id,
            name: name.into(),
            opacity: 1.0,
            visible: true,
            offset: Vec2::ZERO,
            properties: Properties::new(),
        }
    }

    fn tile_layer(id: u32, name: &str) -> Layer {
        Layer::Tile(TileLayer {
            meta: meta(id, name),
            storage: TileStorage::Finite { width: 1, height: 1, cells: vec![Gid::EMPTY] },
        })
    }

    fn sample_map(layers: Vec<Layer>) -> Tilemap {
        Tilemap::assemble(
            "1.10".into(),
            Grid::orthogonal(16, 16),
            RenderOrder::RightDown,
            1,
            1,
            false,
            None,
            layers,
            TilesetRegistry::new(),
            Properties::new(),
        )
    }

    #[test]
    fn iter_layers_is_depth_first_in_document_order() {
        let map = sample_map(vec![
            tile_layer(1, "a"),
            Layer::Group(GroupLayer {
                meta: meta(2, "g"),
                layers: vec![tile_layer(3, "b"), tile_layer(4, "c")],
            }),
            tile_layer(5, "d"),
        ]);

        let names: Vec<&str> =
            map.iter_layers().map(|l| l.meta().name.as_str()).collect();
        assert_eq!(names, ["a", "g", "b", "c", "d"]);
        assert_eq!(map.layers().len(), 3);
        assert_eq!(map.layer_named("c").unwrap().meta().id, 4);
    }

    #[test]
    fn isolation_is_pure_membership() {
        let mut map = sample_map(vec![tile_layer(1, "a"), tile_layer(2, "b")]);
        assert!(!map.has_isolated_layers());

        map.set_isolated_layers([2]);
        assert!(map.is_layer_isolated(2));
        assert!(!map.is_layer_isolated(1));

        map.clear_isolated_layers();
        assert!(!map.has_isolated_layers());
    }
}
