//! Courtyard clearance and board-bounds checks.
//!
//! The clearance test inflates one courtyard by the full margin and tests it
//! against the other courtyard un-inflated. Touching counts as a violation,
//! so two courtyards whose gap is at most the margin collide.

use std::fmt;

use crate::board::units::from_mm;
use crate::board::{Board, BoardError, BoardResult, Drawing, Footprint, Rect};

use super::courtyard::{board_outline, footprint_courtyard, RotationMode};

/// Default minimum courtyard clearance in millimetres.
pub const DEFAULT_MIN_CLEARANCE_MM: f64 = 0.2;

/// The item an on-board violation refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A footprint, by reference.
    Footprint(String),
    /// A user-layer shape, by shape kind.
    Shape(&'static str),
    /// A user-layer text, by content.
    Text(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Footprint(reference) => f.write_str(reference),
            Self::Shape(kind) => write!(f, "Shape ({kind})"),
            Self::Text(text) => write!(f, "Text ({text})"),
        }
    }
}

/// An item lying outside the board outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OnBoardViolation {
    /// Offending item.
    pub subject: Subject,
    /// Item size (width, height) in mm.
    pub size_mm: (f64, f64),
    /// Item position in mm.
    pub position_mm: (f64, f64),
}

impl fmt::Display for OnBoardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.size_mm;
        let (x, y) = self.position_mm;
        write!(
            f,
            "On-Board Issue: {} is out of board bounds. Size: {w:.2} mm x {h:.2} mm, \
             Position: ({x:.2} mm, {y:.2} mm)",
            self.subject
        )
    }
}

/// One side of a clearance violation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFootprint {
    /// Footprint reference.
    pub reference: String,
    /// Courtyard size (width, height) in mm.
    pub size_mm: (f64, f64),
    /// Footprint position in mm.
    pub position_mm: (f64, f64),
}

impl PlacedFootprint {
    fn new(fp: &Footprint, courtyard: &Rect) -> Self {
        Self {
            reference: fp.reference.clone(),
            size_mm: courtyard.size_mm(),
            position_mm: fp.position.to_mm(),
        }
    }
}

impl fmt::Display for PlacedFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.size_mm;
        let (x, y) = self.position_mm;
        write!(
            f,
            "{}: Size: {w:.2} mm x {h:.2} mm, Position: ({x:.2} mm, {y:.2} mm)",
            self.reference
        )
    }
}

/// Two footprints whose courtyards are closer than the clearance margin.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearanceViolation {
    /// The footprint whose courtyard was inflated.
    pub first: PlacedFootprint,
    /// The footprint it collided with.
    pub second: PlacedFootprint,
}

impl fmt::Display for ClearanceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Clearance Issue: {} and {} too close. {}. {}.",
            self.first.reference, self.second.reference, self.first, self.second
        )
    }
}

/// Footprints with a defined courtyard, in board order.
fn courtyards(board: &Board, mode: RotationMode) -> Vec<(&Footprint, Rect)> {
    board
        .footprints
        .iter()
        .filter_map(|fp| match footprint_courtyard(fp, mode) {
            Some(court) => Some((fp, court)),
            None => {
                tracing::debug!(reference = %fp.reference, "Skipping footprint without courtyard");
                None
            }
        })
        .collect()
}

/// Reports footprints and user-layer drawings outside the board outline.
///
/// Footprints with an undefined courtyard are skipped.
///
/// # Errors
///
/// Returns [`BoardError::MissingOutline`] when the board has no `Edge.Cuts`
/// geometry.
pub fn check_onboard(board: &Board, mode: RotationMode) -> BoardResult<Vec<OnBoardViolation>> {
    let outline = board_outline(board).ok_or(BoardError::MissingOutline)?;
    let mut violations = Vec::new();

    for (fp, court) in courtyards(board, mode) {
        if !outline.contains(&court) {
            violations.push(OnBoardViolation {
                subject: Subject::Footprint(fp.reference.clone()),
                size_mm: court.size_mm(),
                position_mm: fp.position.to_mm(),
            });
        }
    }

    for drawing in board.drawings.iter().filter(|d| d.layer().is_user()) {
        let Some(bbox) = drawing.bounding_box() else {
            continue;
        };
        if outline.contains(&bbox) {
            continue;
        }
        let subject = match drawing {
            Drawing::Shape(shape) => Subject::Shape(shape.geometry.kind()),
            Drawing::Text(text) => Subject::Text(text.text.clone()),
        };
        violations.push(OnBoardViolation {
            subject,
            size_mm: bbox.size_mm(),
            position_mm: drawing.position().to_mm(),
        });
    }

    Ok(violations)
}

/// Pairwise courtyard clearance check over all footprints.
///
/// For each pair `i < j` in board order, footprint `i`'s courtyard is
/// inflated by `min_clearance_mm` and tested against footprint `j`'s.
#[must_use]
pub fn check_clearance(
    board: &Board,
    min_clearance_mm: f64,
    mode: RotationMode,
) -> Vec<ClearanceViolation> {
    let margin = from_mm(min_clearance_mm);
    let placed = courtyards(board, mode);
    let mut violations = Vec::new();

    for (i, (fp_a, court_a)) in placed.iter().enumerate() {
        let inflated = court_a.inflate(margin);
        for (fp_b, court_b) in &placed[i + 1..] {
            if inflated.intersects(court_b) {
                violations.push(ClearanceViolation {
                    first: PlacedFootprint::new(fp_a, court_a),
                    second: PlacedFootprint::new(fp_b, court_b),
                });
            }
        }
    }

    violations
}

/// Checks one footprint (inflated) against every other footprint.
///
/// A target without a courtyard has no violations.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown reference.
pub fn check_footprint_clearance(
    board: &Board,
    reference: &str,
    min_clearance_mm: f64,
    mode: RotationMode,
) -> BoardResult<Vec<ClearanceViolation>> {
    let target = board.require_footprint(reference)?;
    let Some(court) = footprint_courtyard(target, mode) else {
        tracing::warn!(reference, "Footprint has no courtyard, clearance not checked");
        return Ok(Vec::new());
    };
    let inflated = court.inflate(from_mm(min_clearance_mm));

    Ok(courtyards(board, mode)
        .into_iter()
        .filter(|(fp, other)| fp.reference != reference && inflated.intersects(other))
        .map(|(fp, other)| ClearanceViolation {
            first: PlacedFootprint::new(target, &court),
            second: PlacedFootprint::new(fp, &other),
        })
        .collect())
}
