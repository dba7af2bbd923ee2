//! Tile-grid geometry: mapping tile coordinates to local pixel positions
//! and back, for all four projections.
//!
//! Both directions consult the same configuration, so for every integer
//! `(col, row)` the round trip `local_to_tile(tile_to_local(col, row))`
//! returns `(col, row)` exactly. Positions use the document's convention:
//! top-left origin, row and y growing downward.

use std::str::FromStr;

use crate::error::MapError;
use crate::geom::{vec2, Vec2};

/// The map's projection kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Orthogonal,
    Isometric,
    /// Staggered isometric. Geometrically a hexagonal grid with side
    /// length zero, and implemented as exactly that.
    Staggered,
    Hexagonal,
}

impl FromStr for Projection {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, MapError> {
        match s {
            "orthogonal" => Ok(Projection::Orthogonal),
            "isometric" => Ok(Projection::Isometric),
            "staggered" => Ok(Projection::Staggered),
            "hexagonal" => Ok(Projection::Hexagonal),
            other => Err(MapError::UnsupportedProjection { value: other.into() }),
        }
    }
}

/// Which axis alternates the half-tile offset in staggered/hexagonal maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerAxis {
    X,
    Y,
}

impl FromStr for StaggerAxis {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, MapError> {
        match s {
            "x" => Ok(StaggerAxis::X),
            "y" => Ok(StaggerAxis::Y),
            other => Err(MapError::MalformedDocument {
                element: "map".into(),
                attribute: "staggeraxis".into(),
                detail: format!("expected 'x' or 'y', got '{}'", other),
            }),
        }
    }
}

/// Whether even or odd indices along the stagger axis are offset.
///
/// This is declared configuration, never derived; both transform
/// directions read the same flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerIndex {
    Even,
    Odd,
}

impl FromStr for StaggerIndex {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, MapError> {
        match s {
            "even" => Ok(StaggerIndex::Even),
            "odd" => Ok(StaggerIndex::Odd),
            other => Err(MapError::MalformedDocument {
                element: "map".into(),
                attribute: "staggerindex".into(),
                detail: format!("expected 'even' or 'odd', got '{}'", other),
            }),
        }
    }
}

/// All geometry a transform needs, captured once at parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub projection: Projection,
    pub tile_width: u32,
    pub tile_height: u32,
    pub stagger_axis: StaggerAxis,
    pub stagger_index: StaggerIndex,
    /// Edge length along the stagger axis for hexagonal maps; ignored by
    /// the other projections.
    pub hex_side_length: u32,
}

impl Grid {
    /// An orthogonal grid, the common case.
    pub fn orthogonal(tile_width: u32, tile_height: u32) -> Self {
        Grid {
            projection: Projection::Orthogonal,
            tile_width,
            tile_height,
            stagger_axis: StaggerAxis::Y,
            stagger_index: StaggerIndex::Odd,
            hex_side_length: 0,
        }
    }

    fn do_stagger(&self, index: i32) -> bool {
        match self.stagger_index {
            StaggerIndex::Odd => index.rem_euclid(2) == 1,
            StaggerIndex::Even => index.rem_euclid(2) == 0,
        }
    }

    fn side_length(&self) -> f32 {
        match self.projection {
            Projection::Hexagonal => self.hex_side_length as f32,
            _ => 0.0,
        }
    }

    /// The local pixel position of the tile at `(col, row)`.
    pub fn tile_to_local(&self, col: i32, row: i32) -> Vec2 {
        let tw = self.tile_width as f32;
        let th = self.tile_height as f32;
        match self.projection {
            Projection::Orthogonal => vec2(col as f32 * tw, row as f32 * th),
            Projection::Isometric => vec2(
                (col - row) as f32 * tw / 2.0,
                (col + row) as f32 * th / 2.0,
            ),
            Projection::Staggered | Projection::Hexagonal => {
                let side = self.side_length();
                match self.stagger_axis {
                    StaggerAxis::Y => {
                        let row_pitch = (th + side) / 2.0;
                        let shift = if self.do_stagger(row) { tw / 2.0 } else { 0.0 };
                        vec2(col as f32 * tw + shift, row as f32 * row_pitch)
                    }
                    StaggerAxis::X => {
                        let col_pitch = (tw + side) / 2.0;
                        let shift = if self.do_stagger(col) { th / 2.0 } else { 0.0 };
                        vec2(col as f32 * col_pitch, row as f32 * th + shift)
                    }
                }
            }
        }
    }

    /// The tile containing the local pixel position `point`.
    ///
    /// Boundary ties resolve toward the lower coordinate on each axis
    /// (floor semantics), the same in both directions.
    pub fn local_to_tile(&self, point: Vec2) -> (i32, i32) {
        let tw = self.tile_width as f32;
        let th = self.tile_height as f32;
        match self.projection {
            Projection::Orthogonal => (
                (point.x / tw).floor() as i32,
                (point.y / th).floor() as i32,
            ),
            Projection::Isometric => {
                // invert col - row = 2x/tw, col + row = 2y/th
                let cx = point.x / (tw / 2.0);
                let cy = point.y / (th / 2.0);
                (
                    ((cx + cy) / 2.0).floor() as i32,
                    ((cy - cx) / 2.0).floor() as i32,
                )
            }
            Projection::Staggered | Projection::Hexagonal => {
                let side = self.side_length();
                match self.stagger_axis {
                    StaggerAxis::Y => {
                        let row_pitch = (th + side) / 2.0;
                        let row = (point.y / row_pitch).floor() as i32;
                        let shift = if self.do_stagger(row) { tw / 2.0 } else { 0.0 };
                        let col = ((point.x - shift) / tw).floor() as i32;
                        (col, row)
                    }
                    StaggerAxis::X => {
                        let col_pitch = (tw + side) / 2.0;
                        let col = (point.x / col_pitch).floor() as i32;
                        let shift = if self.do_stagger(col) { th / 2.0 } else { 0.0 };
                        let row = ((point.y - shift) / th).floor() as i32;
                        (col, row)
                    }
                }
            }
        }
    }
}
