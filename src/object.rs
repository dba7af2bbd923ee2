use std::path::PathBuf;

use crate::geom::Vec2;
use crate::gid::Gid;
use crate::properties::Properties;

/// The geometry kind of a placed object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    /// An axis-aligned rectangle, the default when no shape child is given.
    Rect,
    /// An ellipse inscribed in the object's rectangle.
    Ellipse,
    /// A marker with no extent.
    Point,
    /// A closed outline; points are relative to the object position.
    Polygon { points: Vec<Vec2> },
    /// An open outline; points are relative to the object position.
    Polyline { points: Vec<Vec2> },
    /// A text box; only the content survives parsing.
    Text { content: String },
    /// A tile stamp. The gid keeps its flip bits, so a stamped tile can be
    /// mirrored without a separate field.
    Tile { gid: Gid },
}

/// One object placed on an object layer, or one collision shape attached to
/// a tileset tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileObject {
    pub id: u32,
    pub name: String,
    /// The user-assigned type (also called class in newer documents).
    pub user_type: String,
    /// Position in local pixels, top-left origin.
    pub pos: Vec2,
    pub size: Vec2,
    /// Rotation in degrees, clockwise.
    pub rotation: f32,
    pub visible: bool,
    pub shape: ObjectShape,
    /// The template document this object was instantiated from, if any,
    /// as authored in the instance.
    pub template: Option<PathBuf>,
    pub properties: Properties,
}

impl TileObject {
    /// A blank rectangle object; template parsing starts from this before
    /// the template and instance fields are layered on.
    pub(crate) fn blank() -> Self {
        TileObject {
            id: 0,
            name: String::new(),
            user_type: String::new(),
            pos: Vec2::ZERO,
            size: Vec2::ZERO,
            rotation: 0.0,
            visible: true,
            shape: ObjectShape::Rect,
            template: None,
            properties: Properties::new(),
        }
    }
}
