//! Shared vocabulary for walking TMX/TSX/TX element trees: attribute
//! access with schema errors, and the fragments (properties, images,
//! points, objects) that appear in more than one document kind.
//!
//! Attribute presence and types are checked here, once, at parse time;
//! nothing downstream re-checks them.

use roxmltree::Node;
use std::fmt::Display;
use std::str::FromStr;

use crate::color::Color;
use crate::error::MapError;
use crate::geom::{vec2, Vec2};
use crate::gid::Gid;
use crate::object::{ObjectShape, TileObject};
use crate::properties::{Properties, PropertyValue};
use crate::tileset::Image;

fn malformed(node: &Node, attribute: &str, detail: String) -> MapError {
    MapError::MalformedDocument {
        element: node.tag_name().name().to_string(),
        attribute: attribute.to_string(),
        detail,
    }
}

/// A required attribute, parsed.
pub(crate) fn require_attr<T>(node: &Node, name: &str) -> Result<T, MapError>
where
    T: FromStr,
    T::Err: Display,
{
    let text = node
        .attribute(name)
        .ok_or_else(|| malformed(node, name, "required attribute missing".into()))?;
    text.parse()
        .map_err(|e: T::Err| malformed(node, name, format!("invalid value '{}': {}", text, e)))
}

/// An optional attribute, parsed when present.
pub(crate) fn attr_opt<T>(node: &Node, name: &str) -> Result<Option<T>, MapError>
where
    T: FromStr,
    T::Err: Display,
{
    match node.attribute(name) {
        None => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|e: T::Err| malformed(node, name, format!("invalid value '{}': {}", text, e))),
    }
}

/// An optional attribute with a fallback.
pub(crate) fn attr_or<T>(node: &Node, name: &str, fallback: T) -> Result<T, MapError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(attr_opt(node, name)?.unwrap_or(fallback))
}

/// The format writes booleans as 0/1.
pub(crate) fn flag_attr(node: &Node, name: &str, fallback: bool) -> Result<bool, MapError> {
    Ok(attr_opt::<i32>(node, name)?.map(|v| v != 0).unwrap_or(fallback))
}

pub(crate) fn first_child<'a, 'input>(
    node: &Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.tag_name().name() == name)
}

/// Parse the `<properties>` child of `node`, if any.
pub(crate) fn parse_properties(node: &Node) -> Result<Properties, MapError> {
    let mut out = Properties::new();
    let Some(container) = first_child(node, "properties") else {
        return Ok(out);
    };
    for prop in container.children().filter(|c| c.tag_name().name() == "property") {
        let name: String = require_attr(&prop, "name")?;
        // multiline strings carry the value as element text instead
        let value_text = match prop.attribute("value") {
            Some(v) => v.to_string(),
            None => prop.text().unwrap_or_default().to_string(),
        };
        let value = parse_property_value(&prop, prop.attribute("type"), value_text)?;
        out.insert(name, value);
    }
    Ok(out)
}

fn parse_property_value(
    node: &Node,
    kind: Option<&str>,
    text: String,
) -> Result<PropertyValue, MapError> {
    let bad = |detail: String| malformed(node, "value", detail);
    match kind.unwrap_or("string") {
        "string" => Ok(PropertyValue::String(text)),
        "int" => text
            .parse()
            .map(PropertyValue::I64)
            .map_err(|_| bad(format!("invalid int '{}'", text))),
        "float" => text
            .parse()
            .map(PropertyValue::F32)
            .map_err(|_| bad(format!("invalid float '{}'", text))),
        "bool" => match text.as_str() {
            "true" => Ok(PropertyValue::Bool(true)),
            "false" => Ok(PropertyValue::Bool(false)),
            other => Err(bad(format!("invalid bool '{}'", other))),
        },
        "color" => {
            if text.is_empty() {
                Ok(PropertyValue::Color(Color::default()))
            } else {
                Ok(PropertyValue::Color(parse_color(node, "value", &text)?))
            }
        }
        "file" => Ok(PropertyValue::File(text)),
        "object" => text
            .parse()
            .map(PropertyValue::Object)
            .map_err(|_| bad(format!("invalid object reference '{}'", text))),
        other => Err(malformed(node, "type", format!("unknown property type '{}'", other))),
    }
}

/// Parse a color attribute value; the leading `#` is optional in some
/// attributes (`trans`), so tolerate both spellings.
pub(crate) fn parse_color(node: &Node, attribute: &str, text: &str) -> Result<Color, MapError> {
    let normalized = if text.starts_with('#') {
        text.to_string()
    } else {
        format!("#{}", text)
    };
    normalized.parse().map_err(|_| {
        malformed(node, attribute, format!("invalid color '{}'", text))
    })
}

/// Parse an `<image>` element.
pub(crate) fn parse_image(node: &Node) -> Result<Image, MapError> {
    let source: String = require_attr(node, "source")?;
    let transparent = match node.attribute("trans") {
        Some(text) => Some(parse_color(node, "trans", text)?),
        None => None,
    };
    Ok(Image {
        source,
        width: attr_or(node, "width", 0)?,
        height: attr_or(node, "height", 0)?,
        transparent,
    })
}

/// Parse a `points="x0,y0 x1,y1 ..."` list.
pub(crate) fn parse_points(node: &Node, text: &str) -> Result<Vec<Vec2>, MapError> {
    let mut points = Vec::new();
    for pair in text.split_ascii_whitespace() {
        let mut coords = pair.split(',');
        match (coords.next(), coords.next(), coords.next()) {
            (Some(x), Some(y), None) => {
                let x: f32 = x
                    .parse()
                    .map_err(|_| malformed(node, "points", format!("invalid point '{}'", pair)))?;
                let y: f32 = y
                    .parse()
                    .map_err(|_| malformed(node, "points", format!("invalid point '{}'", pair)))?;
                points.push(vec2(x, y));
            }
            _ => return Err(malformed(node, "points", format!("invalid point '{}'", pair))),
        }
    }
    Ok(points)
}

/// An `<object>` element as written, before defaults or template merging.
/// Each field records whether the instance actually set it, so a template's
/// value survives exactly when the instance is silent.
pub(crate) struct RawObject {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub user_type: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub visible: Option<bool>,
    pub template: Option<String>,
    pub shape: Option<ObjectShape>,
    pub properties: Properties,
}

pub(crate) fn read_raw_object(node: &Node) -> Result<RawObject, MapError> {
    // a gid attribute wins over shape children; both present is malformed
    let gid: Option<u32> = attr_opt(node, "gid")?;
    let child_shape = read_shape_child(node)?;
    let shape = match (gid, child_shape) {
        (Some(raw), None) => Some(ObjectShape::Tile { gid: Gid(raw) }),
        (Some(_), Some(_)) => {
            return Err(malformed(
                node,
                "gid",
                "tile objects cannot also declare a shape element".into(),
            ));
        }
        (None, other) => other,
    };

    // "class" replaced "type" in newer documents; accept either spelling
    let user_type = match node.attribute("type") {
        Some(t) => Some(t.to_string()),
        None => node.attribute("class").map(str::to_string),
    };

    Ok(RawObject {
        id: attr_opt(node, "id")?,
        name: node.attribute("name").map(str::to_string),
        user_type,
        x: attr_opt(node, "x")?,
        y: attr_opt(node, "y")?,
        width: attr_opt(node, "width")?,
        height: attr_opt(node, "height")?,
        rotation: attr_opt(node, "rotation")?,
        visible: attr_opt::<i32>(node, "visible")?.map(|v| v != 0),
        template: node.attribute("template").map(str::to_string),
        shape,
        properties: parse_properties(node)?,
    })
}

fn read_shape_child(node: &Node) -> Result<Option<ObjectShape>, MapError> {
    for child in node.children() {
        let shape = match child.tag_name().name() {
            "ellipse" => ObjectShape::Ellipse,
            "point" => ObjectShape::Point,
            "polygon" => ObjectShape::Polygon {
                points: parse_points(&child, &require_attr::<String>(&child, "points")?)?,
            },
            "polyline" => ObjectShape::Polyline {
                points: parse_points(&child, &require_attr::<String>(&child, "points")?)?,
            },
            "text" => ObjectShape::Text { content: child.text().unwrap_or_default().to_string() },
            _ => continue,
        };
        return Ok(Some(shape));
    }
    Ok(None)
}

/// Build an object from a raw element alone, filling format defaults.
pub(crate) fn object_from_raw(raw: RawObject) -> TileObject {
    let mut object = TileObject::blank();
    apply_raw_object(&mut object, raw);
    object
}

/// Overwrite `base` with every field `raw` explicitly sets. Properties
/// merge key by key; keys only the base carries survive.
pub(crate) fn apply_raw_object(base: &mut TileObject, raw: RawObject) {
    if let Some(id) = raw.id {
        base.id = id;
    }
    if let Some(name) = raw.name {
        base.name = name;
    }
    if let Some(user_type) = raw.user_type {
        base.user_type = user_type;
    }
    if let Some(x) = raw.x {
        base.pos.x = x;
    }
    if let Some(y) = raw.y {
        base.pos.y = y;
    }
    if let Some(width) = raw.width {
        base.size.x = width;
    }
    if let Some(height) = raw.height {
        base.size.y = height;
    }
    if let Some(rotation) = raw.rotation {
        base.rotation = rotation;
    }
    if let Some(visible) = raw.visible {
        base.visible = visible;
    }
    if let Some(shape) = raw.shape {
        base.shape = shape;
    }
    if let Some(template) = raw.template {
        base.template = Some(template.into());
    }
    for (name, value) in raw.properties.iter() {
        base.properties.insert(name.to_string(), value.clone());
    }
}
