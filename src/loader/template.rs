//! Object template documents (TX) and the instance-over-template merge.

use std::path::Path;
use std::sync::Arc;

use roxmltree::Document;

use crate::error::MapError;
use crate::loader::xml::{object_from_raw, read_raw_object, require_attr};
use crate::loader::Loader;
use crate::object::TileObject;
use crate::tileset::Tileset;

/// A parsed object template: the default object an instance starts from,
/// plus the tileset its tile stamp refers to, if it has one.
#[derive(Debug, Clone)]
pub struct ObjectTemplate {
    /// The template's single object definition.
    pub object: TileObject,
    /// The template's own tileset reference and the first gid it assigns;
    /// the template object's gid is expressed against this range.
    pub tileset: Option<(u32, Arc<Tileset>)>,
}

pub(crate) fn parse_template_document(
    loader: &Loader,
    xml: &str,
    base_dir: &Path,
) -> Result<ObjectTemplate, MapError> {
    let doc = Document::parse(xml).map_err(|e| MapError::MalformedDocument {
        element: "template".into(),
        attribute: String::new(),
        detail: e.to_string(),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "template" {
        return Err(MapError::MalformedDocument {
            element: root.tag_name().name().to_string(),
            attribute: String::new(),
            detail: "expected <template> at document root".into(),
        });
    }

    let mut tileset = None;
    if let Some(ts_node) = root.children().find(|c| c.tag_name().name() == "tileset") {
        let first_gid: u32 = require_attr(&ts_node, "firstgid")?;
        let source: String = require_attr(&ts_node, "source")?;
        tileset = Some((first_gid, loader.load_tileset(&base_dir.join(source))?));
    }

    let mut objects = root.children().filter(|c| c.tag_name().name() == "object");
    let object_node = objects.next().ok_or_else(|| MapError::MalformedDocument {
        element: "template".into(),
        attribute: String::new(),
        detail: "template holds no object definition".into(),
    })?;
    if objects.next().is_some() {
        return Err(MapError::MalformedDocument {
            element: "template".into(),
            attribute: String::new(),
            detail: "template holds more than one object definition".into(),
        });
    }

    let raw = read_raw_object(&object_node)?;
    if raw.template.is_some() {
        return Err(MapError::MalformedDocument {
            element: "object".into(),
            attribute: "template".into(),
            detail: "a template object cannot reference another template".into(),
        });
    }

    Ok(ObjectTemplate { object: object_from_raw(raw), tileset })
}
