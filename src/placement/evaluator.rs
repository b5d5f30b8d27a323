//! Orientation sweep for a single footprint.
//!
//! The evaluator tries each candidate orientation in turn, rechecks
//! courtyard clearance and pad connectivity, and classifies each angle by
//! its most severe problem. The footprint's orientation is mutated on the
//! live board during the sweep; [`PlacementOptions::restore_orientation`]
//! decides whether it is put back afterwards.

use std::fmt;

use crate::board::{Board, BoardResult};

use super::clearance::{check_footprint_clearance, ClearanceViolation, DEFAULT_MIN_CLEARANCE_MM};
use super::connectivity::{analyze, ConnectivityAnalysis};
use super::courtyard::RotationMode;

/// Orientations tried by the sweep, in order.
pub const CANDIDATE_ANGLES: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

/// Finding severity. Orders as `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// No problems found.
    Info,
    /// Placement works but wiring will be awkward.
    Warning,
    /// Placement is not usable.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

/// Options for [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementOptions {
    /// Courtyard clearance margin in mm.
    pub min_clearance_mm: f64,
    /// Courtyard rotation policy.
    pub rotation_mode: RotationMode,
    /// Put the original orientation back after the sweep. When false the
    /// footprint is left at the last candidate angle.
    pub restore_orientation: bool,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            min_clearance_mm: DEFAULT_MIN_CLEARANCE_MM,
            rotation_mode: RotationMode::default(),
            restore_orientation: true,
        }
    }
}

/// Result of evaluating one candidate angle.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Candidate orientation in degrees.
    pub angle: f64,
    /// Most severe problem at this angle.
    pub severity: Severity,
    /// Human-readable detail.
    pub detail: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Angle {} degrees: [{}] {}", self.angle, self.severity, self.detail)
    }
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementReport {
    /// Evaluated footprint.
    pub reference: String,
    /// Clearance margin used, in mm.
    pub min_clearance_mm: f64,
    /// Orientation before the sweep.
    pub original_orientation: f64,
    /// One finding per candidate angle, in sweep order.
    pub findings: Vec<Finding>,
    /// Whether the original orientation was restored.
    pub restored: bool,
}

impl PlacementReport {
    /// Findings ordered best first: lowest severity, then sweep order.
    #[must_use]
    pub fn ranking(&self) -> Vec<&Finding> {
        let mut ranked: Vec<&Finding> = self.findings.iter().collect();
        ranked.sort_by_key(|f| f.severity);
        ranked
    }

    /// The best candidate.
    #[must_use]
    pub fn recommended(&self) -> Option<&Finding> {
        self.findings.iter().min_by_key(|f| f.severity)
    }

    /// The footprint's orientation after the sweep.
    #[must_use]
    pub fn final_orientation(&self) -> f64 {
        if self.restored {
            self.original_orientation
        } else {
            self.findings.last().map_or(self.original_orientation, |f| f.angle)
        }
    }
}

impl fmt::Display for PlacementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Placement evaluation of {} (min clearance {:.2} mm):",
            self.reference, self.min_clearance_mm
        )?;
        for finding in &self.findings {
            writeln!(f, "- {finding}")?;
        }
        if let Some(best) = self.recommended() {
            writeln!(f, "Recommended angle: {} degrees ({}).", best.angle, best.severity)?;
        }
        if self.restored {
            write!(f, "Orientation restored to {} degrees.", self.original_orientation)
        } else {
            write!(f, "Orientation left at {} degrees.", self.final_orientation())
        }
    }
}

/// Classifies one angle. Overlaps dominate; alignment issues come before
/// crossings.
fn classify(overlaps: &[ClearanceViolation], analysis: &ConnectivityAnalysis) -> (Severity, String) {
    if !overlaps.is_empty() {
        let others: Vec<&str> = overlaps.iter().map(|v| v.second.reference.as_str()).collect();
        return (
            Severity::Error,
            format!("Courtyard overlaps with {}.", others.join(", ")),
        );
    }

    let misaligned: Vec<String> = analysis
        .alignment_issues()
        .map(|(peer, link)| {
            format!(
                "{}.{} -> {}.{} ({})",
                analysis.reference, link.pad, peer.reference, link.peer_pad, link.net
            )
        })
        .collect();
    if !misaligned.is_empty() {
        return (
            Severity::Warning,
            format!(
                "{} pad pair(s) farther apart than their modules: {}.",
                misaligned.len(),
                misaligned.join(", ")
            ),
        );
    }

    if !analysis.crossings.is_empty() {
        let pairs: Vec<String> = analysis
            .crossings
            .iter()
            .map(|c| format!("{} x {}", c.first_net, c.second_net))
            .collect();
        return (
            Severity::Warning,
            format!(
                "{} crossing connection(s): {}.",
                pairs.len(),
                pairs.join(", ")
            ),
        );
    }

    (Severity::Info, "No placement issues found.".to_string())
}

fn evaluate_angle(board: &Board, reference: &str, options: &PlacementOptions) -> BoardResult<(Severity, String)> {
    let overlaps = check_footprint_clearance(
        board,
        reference,
        options.min_clearance_mm,
        options.rotation_mode,
    )?;
    let analysis = analyze(board, reference)?;
    Ok(classify(&overlaps, &analysis))
}

/// Sweeps [`CANDIDATE_ANGLES`] for one footprint.
///
/// Always produces one finding per angle. A check that fails at an angle
/// becomes an `Error` finding carrying the error text.
///
/// # Errors
///
/// Returns [`crate::board::BoardError::NotFound`] for an unknown reference.
pub fn evaluate(
    board: &mut Board,
    reference: &str,
    options: &PlacementOptions,
) -> BoardResult<PlacementReport> {
    let original_orientation = board.require_footprint(reference)?.orientation;
    let mut findings = Vec::with_capacity(CANDIDATE_ANGLES.len());

    for angle in CANDIDATE_ANGLES {
        set_orientation(board, reference, angle)?;

        let (severity, detail) = evaluate_angle(board, reference, options)
            .unwrap_or_else(|e| (Severity::Error, format!("Check failed: {e}")));
        tracing::debug!(reference, angle, %severity, "Evaluated orientation");
        findings.push(Finding {
            angle,
            severity,
            detail,
        });
    }

    if options.restore_orientation {
        set_orientation(board, reference, original_orientation)?;
    }

    Ok(PlacementReport {
        reference: reference.to_string(),
        min_clearance_mm: options.min_clearance_mm,
        original_orientation,
        findings,
        restored: options.restore_orientation,
    })
}

fn set_orientation(board: &mut Board, reference: &str, angle: f64) -> BoardResult<()> {
    board
        .footprint_mut(reference)
        .map(|fp| fp.orientation = angle)
        .ok_or_else(|| crate::board::BoardError::footprint_not_found(reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardError, Footprint, Graphic, Pad};

    fn part(reference: &str, x: f64, y: f64, w: f64, h: f64) -> Footprint {
        let mut fp = Footprint::new(reference, x, y);
        fp.add_graphic(Graphic::courtyard(w, h));
        fp
    }

    #[test]
    fn four_findings_one_severity_each() {
        let mut board = Board {
            footprints: vec![part("U1", 0.0, 0.0, 2.0, 2.0), part("C1", 10.0, 0.0, 1.0, 1.0)],
            ..Board::default()
        };
        let report = evaluate(&mut board, "U1", &PlacementOptions::default()).unwrap();
        let angles: Vec<f64> = report.findings.iter().map(|f| f.angle).collect();
        assert_eq!(angles, CANDIDATE_ANGLES);
        assert!(report.findings.iter().all(|f| f.severity == Severity::Info));
    }

    #[test]
    fn rotation_into_neighbour_is_an_error() {
        // 6 x 1 mm part; rotated upright it reaches the part above it.
        let mut board = Board {
            footprints: vec![part("U1", 0.0, 0.0, 6.0, 1.0), part("C1", 0.0, 2.5, 1.0, 1.0)],
            ..Board::default()
        };
        let report = evaluate(&mut board, "U1", &PlacementOptions::default()).unwrap();
        let severities: Vec<Severity> = report.findings.iter().map(|f| f.severity).collect();
        assert_eq!(
            severities,
            [Severity::Info, Severity::Error, Severity::Info, Severity::Error]
        );
        assert!(report.findings[1].detail.contains("C1"));
        assert_eq!(report.recommended().unwrap().angle, 0.0);
    }

    #[test]
    fn alignment_warning_below_error() {
        let mut u1 = part("U1", 0.0, 0.0, 2.0, 1.0);
        u1.add_pad(Pad::smd("1", -1.0, 0.0, 0.5, 0.5).on_net("SIG"));
        let mut c1 = part("C1", 5.0, 0.0, 1.0, 1.0);
        c1.add_pad(Pad::smd("1", 0.0, 0.0, 0.5, 0.5).on_net("SIG"));

        let mut board = Board {
            footprints: vec![u1, c1],
            ..Board::default()
        };
        let report = evaluate(&mut board, "U1", &PlacementOptions::default()).unwrap();
        let severities: Vec<Severity> = report.findings.iter().map(|f| f.severity).collect();
        // Pad faces away at 0, sideways at 90/270, towards C1 at 180.
        assert_eq!(
            severities,
            [Severity::Warning, Severity::Warning, Severity::Info, Severity::Warning]
        );
        assert_eq!(report.recommended().unwrap().angle, 180.0);
        assert_eq!(report.ranking()[0].angle, 180.0);
        assert_eq!(report.ranking()[1].angle, 0.0);
    }

    #[test]
    fn orientation_restored_by_default() {
        let mut board = Board {
            footprints: vec![part("U1", 0.0, 0.0, 2.0, 2.0)],
            ..Board::default()
        };
        board.footprints[0].orientation = 45.0;

        let report = evaluate(&mut board, "U1", &PlacementOptions::default()).unwrap();
        assert!(report.restored);
        assert_eq!(board.footprints[0].orientation, 45.0);
        assert!(report.to_string().ends_with("Orientation restored to 45 degrees."));
    }

    #[test]
    fn orientation_left_at_last_angle_when_not_restoring() {
        let mut board = Board {
            footprints: vec![part("U1", 0.0, 0.0, 2.0, 2.0)],
            ..Board::default()
        };
        let options = PlacementOptions {
            restore_orientation: false,
            ..PlacementOptions::default()
        };
        let report = evaluate(&mut board, "U1", &options).unwrap();
        assert_eq!(board.footprints[0].orientation, 270.0);
        assert_eq!(report.final_orientation(), 270.0);
    }

    #[test]
    fn unknown_reference() {
        let mut board = Board::default();
        assert!(matches!(
            evaluate(&mut board, "U1", &PlacementOptions::default()),
            Err(BoardError::NotFound { .. })
        ));
    }
}
