//! Tileset parsing, shared by embedded `<tileset>` elements and external
//! TSX documents.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use crate::error::MapError;
use crate::geom::vec2;
use crate::loader::xml::{
    attr_or, first_child, object_from_raw, parse_image, parse_properties, read_raw_object,
    require_attr,
};
use crate::tileset::{Frame, TileMeta, Tileset};

/// Parse a standalone TSX document.
pub(crate) fn parse_tileset_document(xml: &str) -> Result<Tileset, MapError> {
    let doc = Document::parse(xml).map_err(|e| MapError::MalformedDocument {
        element: "tileset".into(),
        attribute: String::new(),
        detail: e.to_string(),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(MapError::MalformedDocument {
            element: root.tag_name().name().to_string(),
            attribute: String::new(),
            detail: "expected <tileset> at document root".into(),
        });
    }
    parse_tileset_node(&root)
}

/// Parse a `<tileset>` element, embedded or at a TSX root. The `firstgid`
/// attribute, when present, belongs to the referencing map and is read by
/// the caller, not here.
pub(crate) fn parse_tileset_node(node: &Node) -> Result<Tileset, MapError> {
    let name: String = require_attr(node, "name")?;
    let tile_width: u32 = require_attr(node, "tilewidth")?;
    let tile_height: u32 = require_attr(node, "tileheight")?;
    if tile_width == 0 || tile_height == 0 {
        return Err(MapError::MalformedDocument {
            element: "tileset".into(),
            attribute: "tilewidth".into(),
            detail: "tile dimensions must be positive".into(),
        });
    }
    let tile_count: u32 = require_attr(node, "tilecount")?;
    // collection-of-images tilesets have no regular grid and write columns=0
    let columns: u32 = attr_or(node, "columns", 0)?;
    let spacing: u32 = attr_or(node, "spacing", 0)?;
    let margin: u32 = attr_or(node, "margin", 0)?;

    let tile_offset = match first_child(node, "tileoffset") {
        Some(off) => vec2(attr_or(&off, "x", 0.0)?, attr_or(&off, "y", 0.0)?),
        None => vec2(0.0, 0.0),
    };

    let image = match first_child(node, "image") {
        Some(image_node) => Some(parse_image(&image_node)?),
        None => None,
    };

    let mut tiles = HashMap::new();
    for tile_node in node.children().filter(|c| c.tag_name().name() == "tile") {
        let local_id: u32 = require_attr(&tile_node, "id")?;
        if local_id >= tile_count {
            return Err(MapError::MalformedDocument {
                element: "tile".into(),
                attribute: "id".into(),
                detail: format!("local id {} outside tile count {}", local_id, tile_count),
            });
        }
        tiles.insert(local_id, parse_tile_meta(&tile_node)?);
    }

    Ok(Tileset::new(
        name,
        tile_width,
        tile_height,
        spacing,
        margin,
        tile_count,
        columns,
        tile_offset,
        image,
        parse_properties(node)?,
        tiles,
    ))
}

fn parse_tile_meta(node: &Node) -> Result<TileMeta, MapError> {
    let user_type = node
        .attribute("type")
        .or_else(|| node.attribute("class"))
        .unwrap_or_default()
        .to_string();

    let mut animation = Vec::new();
    if let Some(anim) = first_child(node, "animation") {
        for frame in anim.children().filter(|c| c.tag_name().name() == "frame") {
            animation.push(Frame {
                tile_id: require_attr(&frame, "tileid")?,
                duration_ms: require_attr(&frame, "duration")?,
            });
        }
    }

    // collision shapes; template references are kept as authored here, only
    // map object layers expand them
    let mut collision = Vec::new();
    if let Some(group) = first_child(node, "objectgroup") {
        for object in group.children().filter(|c| c.tag_name().name() == "object") {
            collision.push(object_from_raw(read_raw_object(&object)?));
        }
    }

    let image = match first_child(node, "image") {
        Some(image_node) => Some(parse_image(&image_node)?),
        None => None,
    };

    Ok(TileMeta {
        user_type,
        properties: parse_properties(node)?,
        animation,
        collision,
        image,
    })
}
