//! Text reports describing a board.
//!
//! Every report starts with a title line followed by one line per item,
//! sorted the same way a designer scans a layout: modules by reference,
//! nets by code, tracks and vias by net.

use std::fmt::{self, Write as _};

use crate::placement::courtyard::{board_outline, footprint_size_mm, RotationMode};

use super::{Board, BoardError, BoardResult, Point, Rect};

/// Overall board summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSummary {
    /// Board outline, if `Edge.Cuts` geometry exists.
    pub outline: Option<Rect>,
    /// Bounding box of every item.
    pub bounding_box: Rect,
    /// Number of footprints.
    pub modules: usize,
    /// Number of nets, excluding the code-0 entry.
    pub nets: usize,
    /// Number of tracks.
    pub tracks: usize,
    /// Number of vias.
    pub vias: usize,
}

impl BoardSummary {
    /// Summarises a board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::MissingGeometry`] for a board with no items.
    pub fn new(board: &Board) -> BoardResult<Self> {
        Ok(Self {
            outline: board_outline(board),
            bounding_box: board.bounding_box().ok_or(BoardError::MissingGeometry)?,
            modules: board.footprints.len(),
            nets: board.connected_nets().count(),
            tracks: board.tracks.len(),
            vias: board.vias.len(),
        })
    }
}

impl fmt::Display for BoardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board Information:")?;
        match &self.outline {
            Some(outline) => {
                let (w, h) = outline.size_mm();
                writeln!(f, "Board Courtyard - Size: {w:.2} mm x {h:.2} mm")?;
            }
            None => writeln!(f, "Board Courtyard - The board courtyard has not been defined.")?,
        }
        let (cx, cy) = self.bounding_box.center().to_mm();
        let (w, h) = self.bounding_box.size_mm();
        writeln!(
            f,
            "Bounding Box - Center: ({cx:.2} mm, {cy:.2} mm), Size: {w:.2} mm x {h:.2} mm"
        )?;
        writeln!(f, "Module - Number: {}", self.modules)?;
        writeln!(f, "Net - Number: {}", self.nets)?;
        writeln!(f, "Track - Number: {}", self.tracks)?;
        write!(f, "Via - Number: {}", self.vias)
    }
}

fn fmt_point(p: Point) -> String {
    let (x, y) = p.to_mm();
    format!("({x:.2} mm, {y:.2} mm)")
}

fn net_or_none(net: &str) -> &str {
    if net.is_empty() {
        "None"
    } else {
        net
    }
}

/// One line per footprint, sorted by reference.
#[must_use]
pub fn module_info(board: &Board, mode: RotationMode) -> String {
    let mut out = String::from("Module Information:\n");
    if board.footprints.is_empty() {
        out.push_str("No valid module found\n");
        return out;
    }

    let mut footprints: Vec<_> = board.footprints.iter().collect();
    footprints.sort_by(|a, b| a.reference.cmp(&b.reference));

    for fp in footprints {
        let size = footprint_size_mm(fp, mode)
            .map_or_else(|| "unknown".to_string(), |(w, h)| format!("{w:.2} mm x {h:.2} mm"));
        let pads: Vec<String> = fp
            .pads
            .iter()
            .filter(|p| p.is_connected())
            .map(|p| format!("{}({})", p.number, p.net))
            .collect();
        let pads = if pads.is_empty() {
            "No pads".to_string()
        } else {
            pads.join(", ")
        };
        let _ = writeln!(
            out,
            "Module - Ref: {}, Footprint: {}, Position: {}, Angle: {:.2} degrees, Size: {size}, \
             Locked: {}, Pads: {pads}",
            fp.reference,
            fp.footprint,
            fmt_point(fp.position),
            fp.orientation,
            if fp.locked { "yes" } else { "no" },
        );
    }
    out
}

/// One line per net (code 0 excluded), sorted by code.
#[must_use]
pub fn net_info(board: &Board) -> String {
    let mut out = String::from("Net Information:\n");
    let mut nets: Vec<_> = board.connected_nets().collect();
    if nets.is_empty() {
        out.push_str("No valid net found\n");
        return out;
    }
    nets.sort_by_key(|n| n.code);

    for net in nets {
        let pads: Vec<String> = board
            .footprints
            .iter()
            .flat_map(|fp| {
                fp.pads
                    .iter()
                    .filter(|p| p.net == net.name)
                    .map(move |p| format!("{}.{}", fp.reference, p.number))
            })
            .collect();
        let pads = if pads.is_empty() {
            "No pads".to_string()
        } else {
            pads.join(", ")
        };
        let _ = writeln!(
            out,
            "Net - Code: {}, Name: {}, Connected Pads: {pads}",
            net.code, net.name
        );
    }
    out
}

/// One line per track, sorted by net name.
#[must_use]
pub fn track_info(board: &Board) -> String {
    let mut out = String::from("Track Information:\n");
    if board.tracks.is_empty() {
        out.push_str("No valid track found\n");
        return out;
    }
    let mut tracks: Vec<_> = board.tracks.iter().collect();
    tracks.sort_by(|a, b| net_or_none(&a.net).cmp(net_or_none(&b.net)));

    for track in tracks {
        let _ = writeln!(
            out,
            "Track - Net: {}, Start Position: {}, End Position: {}, Width: {:.2} mm, Layer: {}",
            net_or_none(&track.net),
            fmt_point(track.start),
            fmt_point(track.end),
            super::units::to_mm(track.width),
            track.layer
        );
    }
    out
}

/// One line per via, sorted by net name.
#[must_use]
pub fn via_info(board: &Board) -> String {
    let mut out = String::from("Via Information:\n");
    if board.vias.is_empty() {
        out.push_str("No valid via found\n");
        return out;
    }
    let mut vias: Vec<_> = board.vias.iter().collect();
    vias.sort_by(|a, b| net_or_none(&a.net).cmp(net_or_none(&b.net)));

    for via in vias {
        let _ = writeln!(
            out,
            "Via - Net: {}, Position: {}, Diameter: {:.2} mm, Drill: {:.2} mm",
            net_or_none(&via.net),
            fmt_point(via.position),
            super::units::to_mm(via.diameter),
            super::units::to_mm(via.drill)
        );
    }
    out
}

/// The full inspection report: summary, modules, nets, tracks and vias.
///
/// # Errors
///
/// Returns [`BoardError::MissingGeometry`] for a board with no items.
pub fn full_report(board: &Board, mode: RotationMode) -> BoardResult<String> {
    let summary = BoardSummary::new(board)?;
    Ok(format!(
        "{summary}\n\n{}\n{}\n{}\n{}",
        module_info(board, mode),
        net_info(board),
        track_info(board),
        via_info(board)
    ))
}
