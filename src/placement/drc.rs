//! Design rule check: on-board and clearance checks in one report.

use std::fmt;

use crate::board::Board;

use super::clearance::{check_clearance, check_onboard, ClearanceViolation, OnBoardViolation};
use super::courtyard::RotationMode;

const SEPARATOR: &str = "============================================================";

/// Result of [`run_drc`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrcReport {
    /// Items outside the board outline.
    pub onboard: Vec<OnBoardViolation>,
    /// Footprint pairs closer than the clearance margin.
    pub clearance: Vec<ClearanceViolation>,
    /// Checks that could not run, with the reason.
    pub errors: Vec<String>,
}

impl DrcReport {
    /// Total number of violations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.onboard.len() + self.clearance.len()
    }

    /// True when every check ran and found nothing.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.total() == 0 && self.errors.is_empty()
    }
}

fn write_section<T: fmt::Display>(f: &mut fmt::Formatter<'_>, title: &str, items: &[T]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "{title}:")?;
    for (i, item) in items.iter().enumerate() {
        writeln!(f, "{}. {item}", i + 1)?;
    }
    writeln!(f, "{SEPARATOR}")
}

impl fmt::Display for DrcReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            writeln!(f, "Design Rule Check (DRC) passed! No violations found.")?;
            return writeln!(f, "{SEPARATOR}");
        }

        writeln!(f, "Design Rule Check (DRC) error! Here is the error summary:")?;
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "Total DRC Violations: {}", self.total())?;
        writeln!(f, "On-Board Violations: {}", self.onboard.len())?;
        writeln!(f, "Clearance Violations: {}", self.clearance.len())?;
        for error in &self.errors {
            writeln!(f, "Error: {error}")?;
        }
        writeln!(f, "{SEPARATOR}")?;

        write_section(f, "On-Board Violations", &self.onboard)?;
        write_section(f, "Clearance Violations", &self.clearance)
    }
}

/// Runs the on-board and clearance checks.
///
/// A check that fails is recorded in [`DrcReport::errors`]; the other
/// check still runs.
#[must_use]
pub fn run_drc(board: &Board, min_clearance_mm: f64, mode: RotationMode) -> DrcReport {
    let mut report = DrcReport::default();

    match check_onboard(board, mode) {
        Ok(violations) => report.onboard = violations,
        Err(e) => {
            tracing::warn!(error = %e, "On-board check failed");
            report.errors.push(format!("On-board check failed: {e}"));
        }
    }
    report.clearance = check_clearance(board, min_clearance_mm, mode);

    tracing::info!(
        onboard = report.onboard.len(),
        clearance = report.clearance.len(),
        errors = report.errors.len(),
        "DRC finished"
    );
    report
}
