//! In-memory PCB board document.
//!
//! A board is stored on disk as a JSON document with all lengths in
//! millimetres. In memory every length is an integer nanometre
//! ([`units::Coord`]) so that placement checks are exact.
//!
//! # Example
//!
//! ```no_run
//! use pcb_layout_mcp::board::Board;
//!
//! let board = Board::load("layout.json")?;
//! for fp in &board.footprints {
//!     println!("{} at {:?}", fp.reference, fp.position.to_mm());
//! }
//! # Ok::<(), pcb_layout_mcp::board::BoardError>(())
//! ```

pub mod edit;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod info;
pub mod primitives;
pub mod units;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::{BoardError, BoardResult};
pub use geometry::{Point, Rect};
pub use primitives::{
    Drawing, Footprint, Graphic, Layer, Net, Pad, PadShape, Shape, ShapeGeometry, Text, Track,
    Via, Zone,
};

/// Net name that the placement checks treat as the ground plane.
pub const GROUND_NET: &str = "GND";

/// A PCB layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Net table. Code 0 is the reserved "no net" entry.
    #[serde(default)]
    pub nets: Vec<Net>,
    /// Placed footprints.
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    /// Board-level graphics and text.
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    /// Copper tracks.
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Vias.
    #[serde(default)]
    pub vias: Vec<Via>,
    /// Copper zones.
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl Board {
    /// Loads a board document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a valid board
    /// document, holds a length outside the document range, or violates the
    /// model (duplicate references, net codes, net names or pad numbers).
    pub fn load(path: impl AsRef<Path>) -> BoardResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| BoardError::file_read(path, e))?;
        let board: Self = serde_json::from_str(&text).map_err(|source| BoardError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        board.validate()?;
        tracing::debug!(
            path = %path.display(),
            footprints = board.footprints.len(),
            nets = board.nets.len(),
            "Loaded board"
        );
        Ok(board)
    }

    /// Saves the board document.
    ///
    /// The document is written to a sibling temporary file and renamed into
    /// place. With `backup` set, an existing file is first copied to
    /// `<name>.<timestamp>.bak`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or any file operation fails.
    pub fn save(&self, path: impl AsRef<Path>, backup: bool) -> BoardResult<()> {
        let path = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).map_err(|source| BoardError::Serialise { source })?;

        if backup && path.exists() {
            let backup_path = backup_path(path);
            fs::copy(path, &backup_path).map_err(|e| BoardError::file_write(&backup_path, e))?;
            tracing::info!(backup = %backup_path.display(), "Backed up board");
        }

        let tmp = sibling_with_suffix(path, "tmp");
        fs::write(&tmp, json).map_err(|e| BoardError::file_write(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            BoardError::file_write(path, e)
        })?;

        tracing::info!(path = %path.display(), "Saved board");
        Ok(())
    }

    /// Checks model invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] describing the first problem found.
    pub fn validate(&self) -> BoardResult<()> {
        let mut references = HashSet::new();
        for fp in &self.footprints {
            if !references.insert(fp.reference.as_str()) {
                return Err(BoardError::validation(format!(
                    "Duplicate footprint reference '{}'",
                    fp.reference
                )));
            }
            let mut numbers = HashSet::new();
            for pad in &fp.pads {
                if !numbers.insert(pad.number.as_str()) {
                    return Err(BoardError::validation(format!(
                        "Duplicate pad number '{}' in footprint '{}'",
                        pad.number, fp.reference
                    )));
                }
            }
        }

        // Pads and tracks refer to nets by name, so names must be unique too.
        let mut codes = HashSet::new();
        let mut names = HashSet::new();
        for net in &self.nets {
            if !codes.insert(net.code) {
                return Err(BoardError::validation(format!(
                    "Duplicate net code {}",
                    net.code
                )));
            }
            if !names.insert(net.name.as_str()) {
                return Err(BoardError::validation(format!(
                    "Duplicate net name '{}'",
                    net.name
                )));
            }
        }
        Ok(())
    }

    /// Looks up a footprint by reference.
    #[must_use]
    pub fn footprint(&self, reference: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|fp| fp.reference == reference)
    }

    /// Looks up a footprint by reference for mutation.
    pub fn footprint_mut(&mut self, reference: &str) -> Option<&mut Footprint> {
        self.footprints
            .iter_mut()
            .find(|fp| fp.reference == reference)
    }

    /// Looks up a footprint by reference, failing with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for an unknown reference.
    pub fn require_footprint(&self, reference: &str) -> BoardResult<&Footprint> {
        self.footprint(reference)
            .ok_or_else(|| BoardError::footprint_not_found(reference))
    }

    /// Looks up a net by name.
    #[must_use]
    pub fn net(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }

    /// Nets other than the reserved code-0 entry.
    pub fn connected_nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.iter().filter(|n| !n.is_unconnected())
    }

    /// Bounding box of every item on the board.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        self.items_bounding_box(true)
    }

    /// Bounding box of every item except `Edge.Cuts` drawings.
    #[must_use]
    pub fn content_bounding_box(&self) -> Option<Rect> {
        self.items_bounding_box(false)
    }

    fn items_bounding_box(&self, include_outline: bool) -> Option<Rect> {
        let drawings = self
            .drawings
            .iter()
            .filter(|d| include_outline || d.layer() != Layer::EdgeCuts)
            .filter_map(Drawing::bounding_box);
        let footprints = self.footprints.iter().filter_map(Footprint::bounding_box);
        let tracks = self.tracks.iter().map(Track::bounding_box);
        let vias = self.vias.iter().map(Via::bounding_box);
        let zones = self.zones.iter().filter_map(Zone::bounding_box);

        drawings
            .chain(footprints)
            .chain(tracks)
            .chain(vias)
            .chain(zones)
            .reduce(|acc, r| acc.merge(&r))
    }
}

/// Appends `.suffix` to the file name of `path`.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    sibling_with_suffix(path, &format!("{stamp}.bak"))
}
