//! Power density and board area utilisation.
//!
//! Three areas are compared:
//!
//! - **footprint area**: sum of all courtyard areas,
//! - **effective area**: bounding box of everything except the board outline,
//! - **board area**: bounding box of everything.
//!
//! A low footprint ratio means the parts are spread out; a low effective
//! ratio means the outline is much larger than what is placed inside it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardError, BoardResult};

use super::courtyard::{footprint_courtyard, RotationMode};

/// Advisory thresholds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DensityThresholds {
    /// Below this footprint ratio the placement is considered loose.
    #[serde(default = "default_footprint_ratio")]
    pub footprint_ratio: f64,
    /// Below this effective ratio the board has significant unused area.
    #[serde(default = "default_effective_ratio")]
    pub effective_ratio: f64,
    /// Below this per-axis ratio that axis is named for optimisation.
    #[serde(default = "default_axis_ratio")]
    pub axis_ratio: f64,
}

const fn default_footprint_ratio() -> f64 {
    40.0
}

const fn default_effective_ratio() -> f64 {
    40.0
}

const fn default_axis_ratio() -> f64 {
    60.0
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            footprint_ratio: default_footprint_ratio(),
            effective_ratio: default_effective_ratio(),
            axis_ratio: default_axis_ratio(),
        }
    }
}

/// Result of [`compute`].
#[derive(Debug, Clone, PartialEq)]
pub struct DensityReport {
    /// Sum of courtyard areas in mm².
    pub footprint_area_mm2: f64,
    /// Effective (content) size in mm.
    pub effective_size_mm: (f64, f64),
    /// Board size in mm.
    pub board_size_mm: (f64, f64),
    /// `footprint / effective * 100`.
    pub footprint_ratio: f64,
    /// `effective / board * 100`.
    pub effective_ratio: f64,
    /// Effective width over board width, in percent.
    pub width_ratio: f64,
    /// Effective height over board height, in percent.
    pub height_ratio: f64,
    /// Footprints without a courtyard, left out of the footprint area.
    pub undefined_courtyards: Vec<String>,
    /// Thresholds the advice is based on.
    pub thresholds: DensityThresholds,
}

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

impl DensityReport {
    /// Derives the ratios from raw areas and sizes.
    #[must_use]
    pub fn from_areas(
        footprint_area_mm2: f64,
        effective_size_mm: (f64, f64),
        board_size_mm: (f64, f64),
        thresholds: DensityThresholds,
    ) -> Self {
        let effective_area = effective_size_mm.0 * effective_size_mm.1;
        let board_area = board_size_mm.0 * board_size_mm.1;
        Self {
            footprint_area_mm2,
            effective_size_mm,
            board_size_mm,
            footprint_ratio: percent(footprint_area_mm2, effective_area),
            effective_ratio: percent(effective_area, board_area),
            width_ratio: percent(effective_size_mm.0, board_size_mm.0),
            height_ratio: percent(effective_size_mm.1, board_size_mm.1),
            undefined_courtyards: Vec::new(),
            thresholds,
        }
    }

    /// Effective area in mm².
    #[must_use]
    pub fn effective_area_mm2(&self) -> f64 {
        self.effective_size_mm.0 * self.effective_size_mm.1
    }

    /// Board area in mm².
    #[must_use]
    pub fn board_area_mm2(&self) -> f64 {
        self.board_size_mm.0 * self.board_size_mm.1
    }

    /// Footprints are spread too far apart.
    #[must_use]
    pub fn is_loose(&self) -> bool {
        self.footprint_ratio < self.thresholds.footprint_ratio
    }

    /// The outline encloses a lot of empty board.
    #[must_use]
    pub fn has_unused_area(&self) -> bool {
        self.effective_ratio < self.thresholds.effective_ratio
    }

    /// Advice on the footprint ratio.
    #[must_use]
    pub fn placement_advice(&self) -> &'static str {
        if self.is_loose() {
            "Warning: modules are placed too loosely, please move them closer to each other!"
        } else {
            "The modules are placed appropriately."
        }
    }

    /// Advice on the effective ratio, naming the axes to optimise.
    #[must_use]
    pub fn area_advice(&self) -> String {
        if !self.has_unused_area() {
            return "The board area is utilised effectively.".to_string();
        }
        let mut advice = "Warning: significant unused board area detected!".to_string();
        if self.width_ratio < self.thresholds.axis_ratio {
            advice.push_str(&format!(" Please optimise the width usage: {:.2}%", self.width_ratio));
        }
        if self.height_ratio < self.thresholds.axis_ratio {
            advice.push_str(&format!(" Please optimise the height usage: {:.2}%", self.height_ratio));
        }
        advice
    }
}

impl fmt::Display for DensityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Footprint area: {:.2} mm². Footprint area ratio: {:.2}% (footprint area / effective area). {}",
            self.footprint_area_mm2,
            self.footprint_ratio,
            self.placement_advice()
        )?;
        writeln!(
            f,
            "Effective area: {:.2} mm². Effective area ratio: {:.2}% (effective area / board area). {}",
            self.effective_area_mm2(),
            self.effective_ratio,
            self.area_advice()
        )?;
        write!(
            f,
            "Board area: {:.2} mm², size: {:.2} mm x {:.2} mm.",
            self.board_area_mm2(),
            self.board_size_mm.0,
            self.board_size_mm.1
        )?;
        if !self.undefined_courtyards.is_empty() {
            write!(
                f,
                "\nWarning: no courtyard defined for {}; their area is not counted.",
                self.undefined_courtyards.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Computes the density report for a board.
///
/// The board is not modified: the effective area is computed by leaving
/// `Edge.Cuts` drawings out of the bounding box.
///
/// # Errors
///
/// Returns [`BoardError::MissingGeometry`] for a board with no items.
pub fn compute(
    board: &Board,
    thresholds: &DensityThresholds,
    mode: RotationMode,
) -> BoardResult<DensityReport> {
    let board_box = board.bounding_box().ok_or(BoardError::MissingGeometry)?;
    let effective_size = board
        .content_bounding_box()
        .map_or((0.0, 0.0), |r| r.size_mm());

    let mut footprint_area = 0.0;
    let mut undefined = Vec::new();
    for fp in &board.footprints {
        match footprint_courtyard(fp, mode) {
            Some(court) => footprint_area += court.area_mm2(),
            None => {
                tracing::warn!(reference = %fp.reference, "No courtyard, excluded from footprint area");
                undefined.push(fp.reference.clone());
            }
        }
    }

    let mut report =
        DensityReport::from_areas(footprint_area, effective_size, board_box.size_mm(), *thresholds);
    report.undefined_courtyards = undefined;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Drawing, Footprint, Graphic, Layer, Point, Rect, Shape};

    #[test]
    fn half_filled_is_appropriate() {
        let report = DensityReport::from_areas(40.0, (10.0, 8.0), (10.0, 8.0), DensityThresholds::default());
        assert!((report.footprint_ratio - 50.0).abs() < 1e-9);
        assert!(!report.is_loose());
        assert_eq!(report.placement_advice(), "The modules are placed appropriately.");
    }

    #[test]
    fn quarter_filled_is_loose() {
        let report = DensityReport::from_areas(20.0, (10.0, 8.0), (10.0, 8.0), DensityThresholds::default());
        assert!((report.footprint_ratio - 25.0).abs() < 1e-9);
        assert!(report.is_loose());
        assert!(report.placement_advice().starts_with("Warning: modules are placed too loosely"));
    }

    #[test]
    fn unused_area_names_axes() {
        // 10 x 8 content on a 20 x 30 board: 13.3% overall, 50% wide, 26.7% high.
        let report = DensityReport::from_areas(40.0, (10.0, 8.0), (20.0, 30.0), DensityThresholds::default());
        assert!(report.has_unused_area());
        let advice = report.area_advice();
        assert!(advice.contains("width usage: 50.00%"));
        assert!(advice.contains("height usage: 26.67%"));

        let wide = DensityReport::from_areas(40.0, (19.0, 8.0), (20.0, 30.0), DensityThresholds::default());
        assert!(!wide.area_advice().contains("width usage"));
    }

    #[test]
    fn zero_divisors_give_zero() {
        let report = DensityReport::from_areas(5.0, (0.0, 0.0), (0.0, 0.0), DensityThresholds::default());
        assert_eq!(report.footprint_ratio, 0.0);
        assert_eq!(report.effective_ratio, 0.0);
        assert_eq!(report.width_ratio, 0.0);
    }

    #[test]
    fn thresholds_are_configurable() {
        let strict = DensityThresholds {
            footprint_ratio: 60.0,
            ..DensityThresholds::default()
        };
        let report = DensityReport::from_areas(40.0, (10.0, 8.0), (10.0, 8.0), strict);
        assert!(report.is_loose());
    }

    #[test]
    fn computed_from_board() {
        let mut a = Footprint::new("U1", 2.0, 2.0);
        a.add_graphic(Graphic::courtyard(4.0, 4.0));
        let mut b = Footprint::new("U2", 8.0, 2.0);
        b.add_graphic(Graphic::courtyard(4.0, 4.0));
        let tp = Footprint::new("TP1", 5.0, 2.0);

        let board = Board {
            footprints: vec![a, b, tp],
            drawings: vec![Drawing::Shape(Shape::rect(
                Layer::EdgeCuts,
                Rect::from_corners(Point::from_mm(0.0, 0.0), Point::from_mm(20.0, 20.0)),
                0,
            ))],
            ..Board::default()
        };
        let report = compute(&board, &DensityThresholds::default(), RotationMode::QuarterTurn).unwrap();

        assert!((report.footprint_area_mm2 - 32.0).abs() < 1e-9);
        assert_eq!(report.effective_size_mm, (10.0, 4.0));
        assert_eq!(report.board_size_mm, (20.0, 20.0));
        assert!((report.footprint_ratio - 80.0).abs() < 1e-9);
        assert_eq!(report.undefined_courtyards, ["TP1"]);
        assert!(report.to_string().contains("no courtyard defined for TP1"));
        // The outline is still on the board.
        assert_eq!(board.drawings.len(), 1);
    }

    #[test]
    fn empty_board_is_an_error() {
        assert!(matches!(
            compute(&Board::default(), &DensityThresholds::default(), RotationMode::QuarterTurn),
            Err(BoardError::MissingGeometry)
        ));
    }
}
