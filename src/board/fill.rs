//! Copper zone filling.
//!
//! Real copper pours (clearance knock-outs, thermal reliefs, island removal)
//! are the job of a dedicated fill engine. The board editor only needs
//! something that marks zones as filled, so the bundled [`OutlineFiller`]
//! fills each zone with its own outline.

use super::{Board, BoardError, BoardResult};

/// A copper fill engine.
pub trait ZoneFiller {
    /// Fills every zone on the board.
    ///
    /// # Errors
    ///
    /// Returns an error if a zone cannot be filled.
    fn fill(&self, board: &mut Board) -> BoardResult<()>;
}

/// Fills each zone with its outline polygon.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineFiller;

impl ZoneFiller for OutlineFiller {
    fn fill(&self, board: &mut Board) -> BoardResult<()> {
        for zone in &mut board.zones {
            if zone.outline.len() < 3 {
                return Err(BoardError::collaborator(
                    "Zone filler",
                    format!("zone {} has fewer than three outline points", zone.id),
                ));
            }
            zone.filled_polygons = vec![zone.outline.clone()];
            tracing::debug!(zone = %zone.id, layer = %zone.layer, net = %zone.net, "Filled zone");
        }
        Ok(())
    }
}
