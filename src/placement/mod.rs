//! Module placement validation.
//!
//! - [`courtyard`]: effective occupied rectangle of a footprint
//! - [`clearance`]: courtyard collisions and board-bounds checks
//! - [`connectivity`]: pad-to-pad wiring distances across nets
//! - [`intersect`]: crossing detection between pad-to-pad connections
//! - [`evaluator`]: orientation sweep combining the checks above
//! - [`density`]: power density and area utilisation
//! - [`drc`]: aggregated design rule check report
//!
//! All checks work on a [`crate::board::Board`] and produce structured
//! results; the `Display` impls render the text reports returned by the
//! MCP tools.

pub mod clearance;
pub mod connectivity;
pub mod courtyard;
pub mod density;
pub mod drc;
pub mod evaluator;
pub mod intersect;

pub use clearance::{
    check_clearance, check_footprint_clearance, check_onboard, ClearanceViolation,
    OnBoardViolation, Subject, DEFAULT_MIN_CLEARANCE_MM,
};
pub use connectivity::{analyze, ConnectivityAnalysis};
pub use courtyard::{board_outline, footprint_courtyard, footprint_size_mm, RotationMode};
pub use density::{DensityReport, DensityThresholds};
pub use drc::{run_drc, DrcReport};
pub use evaluator::{evaluate, PlacementOptions, PlacementReport, Severity, CANDIDATE_ANGLES};
pub use intersect::{find_crossings, Crossing, Segment};
