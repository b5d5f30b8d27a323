//! Footprint courtyard resolution.
//!
//! A footprint's courtyard is the union of the bounding boxes of its
//! graphics on `F.CrtYd` / `B.CrtYd`. It is never stored: a footprint without
//! courtyard graphics has an *undefined* courtyard (`None`), which callers
//! must treat as "unknown size" rather than as an empty rectangle.

use serde::{Deserialize, Serialize};

use crate::board::geometry::quarter_turns;
use crate::board::{Board, Footprint, Layer, Rect};

/// How footprint orientation is applied to the courtyard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Rotate the merged courtyard only for exact multiples of 90 degrees
    /// (width and height swap at 90 and 270). Other angles leave the box
    /// unrotated.
    #[default]
    QuarterTurn,
    /// Rotate every courtyard graphic by the real orientation and take the
    /// axis-aligned hull.
    Oriented,
}

/// Returns the board-space courtyard rectangle of a footprint, or `None`
/// if it has no courtyard graphics.
#[must_use]
pub fn footprint_courtyard(fp: &Footprint, mode: RotationMode) -> Option<Rect> {
    match mode {
        RotationMode::QuarterTurn => {
            let local = fp
                .courtyard_graphics()
                .filter_map(|g| g.local_bounding_box())
                .reduce(|acc, r| acc.merge(&r))?;
            let placed = if quarter_turns(fp.orientation).is_some() {
                local.rotated(fp.orientation)
            } else {
                local
            };
            Some(placed.translated(fp.position))
        }
        RotationMode::Oriented => fp
            .courtyard_graphics()
            .filter_map(|g| {
                g.geometry
                    .placed(fp.orientation, fp.position)
                    .bounding_box()
                    .map(|r| r.inflate(g.width / 2))
            })
            .reduce(|acc, r| acc.merge(&r)),
    }
}

/// Courtyard width and height in millimetres, or `None` if undefined.
#[must_use]
pub fn footprint_size_mm(fp: &Footprint, mode: RotationMode) -> Option<(f64, f64)> {
    footprint_courtyard(fp, mode).map(|r| r.size_mm())
}

/// Returns the board outline: the union of all `Edge.Cuts` drawing boxes.
#[must_use]
pub fn board_outline(board: &Board) -> Option<Rect> {
    board
        .drawings
        .iter()
        .filter(|d| d.layer() == Layer::EdgeCuts)
        .filter_map(crate::board::Drawing::bounding_box)
        .reduce(|acc, r| acc.merge(&r))
}
