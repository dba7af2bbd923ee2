//! The TMX map document walk: one depth-first pass building the layer tree
//! in document order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use roxmltree::{Document, Node};

use crate::data::{decode_cells, Compression, Encoding};
use crate::error::MapError;
use crate::geom::vec2;
use crate::gid::Gid;
use crate::grid::{Grid, Projection, StaggerAxis, StaggerIndex};
use crate::layer::{
    Chunk, GroupLayer, ImageLayer, Layer, LayerMeta, ObjectLayer, TileLayer, TileStorage,
};
use crate::loader::xml::{
    apply_raw_object, attr_or, first_child, flag_attr, object_from_raw, parse_color,
    parse_image, parse_properties, read_raw_object, require_attr,
};
use crate::loader::{tsx, Loader};
use crate::map::{RenderOrder, Tilemap};
use crate::object::{ObjectShape, TileObject};
use crate::registry::TilesetRegistry;

struct MapContext<'a> {
    loader: &'a Loader,
    base_dir: &'a Path,
    registry: TilesetRegistry,
    infinite: bool,
    chunk_width: u32,
    chunk_height: u32,
    map_width: u32,
    map_height: u32,
}

pub(crate) fn parse_map(loader: &Loader, xml: &str, base_dir: &Path) -> Result<Tilemap, MapError> {
    let doc = Document::parse(xml).map_err(|e| MapError::MalformedDocument {
        element: "map".into(),
        attribute: String::new(),
        detail: e.to_string(),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(MapError::MalformedDocument {
            element: root.tag_name().name().to_string(),
            attribute: String::new(),
            detail: "expected <map> at document root".into(),
        });
    }

    let version: String = require_attr(&root, "version")?;
    let projection: Projection = require_attr::<String>(&root, "orientation")?.parse()?;
    let render_order: RenderOrder = attr_or(&root, "renderorder", RenderOrder::RightDown)?;
    let map_width: u32 = require_attr(&root, "width")?;
    let map_height: u32 = require_attr(&root, "height")?;
    let tile_width: u32 = require_attr(&root, "tilewidth")?;
    let tile_height: u32 = require_attr(&root, "tileheight")?;
    if tile_width == 0 || tile_height == 0 {
        return Err(MapError::MalformedDocument {
            element: "map".into(),
            attribute: "tilewidth".into(),
            detail: "tile dimensions must be positive".into(),
        });
    }
    let infinite = flag_attr(&root, "infinite", false)?;

    let background = match root.attribute("backgroundcolor") {
        Some(text) => Some(parse_color(&root, "backgroundcolor", text)?),
        None => None,
    };

    let grid = Grid {
        projection,
        tile_width,
        tile_height,
        stagger_axis: attr_or(&root, "staggeraxis", StaggerAxis::Y)?,
        stagger_index: attr_or(&root, "staggerindex", StaggerIndex::Odd)?,
        hex_side_length: attr_or(&root, "hexsidelength", 0)?,
    };

    let (chunk_width, chunk_height) = chunk_size(&root)?;

    let mut ctx = MapContext {
        loader,
        base_dir,
        registry: TilesetRegistry::new(),
        infinite,
        chunk_width,
        chunk_height,
        map_width,
        map_height,
    };

    // Tilesets first: a layer may precede a tileset it references in
    // pathological documents, and registration order is by first gid anyway.
    for ts_node in root.children().filter(|c| c.tag_name().name() == "tileset") {
        let first_gid: u32 = require_attr(&ts_node, "firstgid")?;
        let tileset = match ts_node.attribute("source") {
            Some(source) => loader.load_tileset(&base_dir.join(source))?,
            None => Arc::new(tsx::parse_tileset_node(&ts_node)?),
        };
        debug!("tileset '{}' registered at gid {}", tileset.name, first_gid);
        ctx.registry.register(tileset, first_gid)?;
    }

    let layers = parse_layer_sequence(&ctx, &root)?;

    info!(
        "parsed {}x{} {:?} map: {} top-level layers, {} tilesets",
        map_width,
        map_height,
        projection,
        layers.len(),
        ctx.registry.len()
    );

    Ok(Tilemap::assemble(
        version,
        grid,
        render_order,
        map_width,
        map_height,
        infinite,
        background,
        layers,
        ctx.registry,
        parse_properties(&root)?,
    ))
}

fn chunk_size(root: &Node) -> Result<(u32, u32), MapError> {
    let Some(settings) = first_child(root, "editorsettings") else {
        return Ok((16, 16));
    };
    let Some(chunk) = first_child(&settings, "chunksize") else {
        return Ok((16, 16));
    };
    let width: u32 = attr_or(&chunk, "width", 16)?;
    let height: u32 = attr_or(&chunk, "height", 16)?;
    if width == 0 || height == 0 {
        return Err(MapError::MalformedDocument {
            element: "chunksize".into(),
            attribute: "width".into(),
            detail: "chunk dimensions must be positive".into(),
        });
    }
    Ok((width, height))
}

/// Parse the layer children of `parent` in document order. Used for the map
/// root and, recursively, for every group layer.
fn parse_layer_sequence(ctx: &MapContext, parent: &Node) -> Result<Vec<Layer>, MapError> {
    let mut layers = Vec::new();
    for child in parent.children() {
        let layer = match child.tag_name().name() {
            "layer" => Layer::Tile(parse_tile_layer(ctx, &child)?),
            "objectgroup" => Layer::Object(parse_object_layer(ctx, &child)?),
            "imagelayer" => Layer::Image(parse_image_layer(&child)?),
            "group" => Layer::Group(parse_group_layer(ctx, &child)?),
            _ => continue,
        };
        layers.push(layer);
    }
    Ok(layers)
}

fn parse_layer_meta(node: &Node) -> Result<LayerMeta, MapError> {
    Ok(LayerMeta {
        id: attr_or(node, "id", 0)?,
        name: node.attribute("name").unwrap_or_default().to_string(),
        opacity: attr_or(node, "opacity", 1.0)?,
        visible: flag_attr(node, "visible", true)?,
        offset: vec2(attr_or(node, "offsetx", 0.0)?, attr_or(node, "offsety", 0.0)?),
        properties: parse_properties(node)?,
    })
}

fn parse_tile_layer(ctx: &MapContext, node: &Node) -> Result<TileLayer, MapError> {
    let meta = parse_layer_meta(node)?;
    let width: u32 = attr_or(node, "width", ctx.map_width)?;
    let height: u32 = attr_or(node, "height", ctx.map_height)?;

    let data = first_child(node, "data").ok_or_else(|| MapError::MalformedDocument {
        element: "layer".into(),
        attribute: String::new(),
        detail: format!("layer '{}' has no <data> element", meta.name),
    })?;
    let encoding = Encoding::from_attr(data.attribute("encoding"))?;
    let compression = Compression::from_attr(data.attribute("compression"))?;

    let storage = if ctx.infinite {
        let mut chunks = HashMap::new();
        for chunk_node in data.children().filter(|c| c.tag_name().name() == "chunk") {
            let x: i32 = require_attr(&chunk_node, "x")?;
            let y: i32 = require_attr(&chunk_node, "y")?;
            let chunk_w: u32 = require_attr(&chunk_node, "width")?;
            let chunk_h: u32 = require_attr(&chunk_node, "height")?;
            if x.rem_euclid(ctx.chunk_width as i32) != 0
                || y.rem_euclid(ctx.chunk_height as i32) != 0
            {
                return Err(MapError::MalformedDocument {
                    element: "chunk".into(),
                    attribute: "x".into(),
                    detail: format!(
                        "chunk origin ({}, {}) not aligned to the {}x{} chunk size",
                        x, y, ctx.chunk_width, ctx.chunk_height
                    ),
                });
            }
            let text = chunk_node.text().unwrap_or_default();
            let cells =
                decode_cells(encoding, compression, text, chunk_w as usize * chunk_h as usize)?;
            resolve_all(ctx, &cells)?;
            let replaced = chunks.insert(
                (x, y),
                Chunk { x, y, width: chunk_w, height: chunk_h, cells },
            );
            if replaced.is_some() {
                return Err(MapError::MalformedDocument {
                    element: "chunk".into(),
                    attribute: String::new(),
                    detail: format!("duplicate chunk at ({}, {})", x, y),
                });
            }
        }
        TileStorage::Chunked {
            chunk_width: ctx.chunk_width,
            chunk_height: ctx.chunk_height,
            chunks,
        }
    } else {
        let text = data.text().unwrap_or_default();
        let cells = decode_cells(encoding, compression, text, width as usize * height as usize)?;
        resolve_all(ctx, &cells)?;
        TileStorage::Finite { width, height, cells }
    };

    debug!("tile layer '{}' parsed", meta.name);
    Ok(TileLayer { meta, storage })
}

/// Every non-empty cell must land inside a registered tileset range; a map
/// that references a gid nobody owns fails here instead of producing a
/// model with unanswerable cells.
fn resolve_all(ctx: &MapContext, cells: &[Gid]) -> Result<(), MapError> {
    for cell in cells {
        if !cell.is_empty() {
            ctx.registry.resolve(cell.id())?;
        }
    }
    Ok(())
}

fn parse_object_layer(ctx: &MapContext, node: &Node) -> Result<ObjectLayer, MapError> {
    let meta = parse_layer_meta(node)?;
    let mut objects = Vec::new();
    for object_node in node.children().filter(|c| c.tag_name().name() == "object") {
        objects.push(parse_object(ctx, &object_node)?);
    }
    debug!("object layer '{}': {} objects", meta.name, objects.len());
    Ok(ObjectLayer { meta, objects })
}

fn parse_object(ctx: &MapContext, node: &Node) -> Result<TileObject, MapError> {
    let raw = read_raw_object(node)?;
    match raw.template.clone() {
        Some(reference) => {
            let template = ctx.loader.load_template(&ctx.base_dir.join(&reference))?;
            let mut object = template.object.clone();
            object.template = Some(PathBuf::from(reference));
            apply_raw_object(&mut object, raw);
            Ok(object)
        }
        None => {
            let object = object_from_raw(raw);
            // a stamp's gid lives in this map's gid space; template stamps
            // are expressed against the template's own tileset instead
            if let ObjectShape::Tile { gid } = object.shape {
                if !gid.is_empty() {
                    ctx.registry.resolve(gid.id())?;
                }
            }
            Ok(object)
        }
    }
}

fn parse_image_layer(node: &Node) -> Result<ImageLayer, MapError> {
    let meta = parse_layer_meta(node)?;
    let image = match first_child(node, "image") {
        Some(image_node) => Some(parse_image(&image_node)?),
        None => None,
    };
    Ok(ImageLayer { meta, image })
}

fn parse_group_layer(ctx: &MapContext, node: &Node) -> Result<GroupLayer, MapError> {
    let meta = parse_layer_meta(node)?;
    let layers = parse_layer_sequence(ctx, node)?;
    Ok(GroupLayer { meta, layers })
}
