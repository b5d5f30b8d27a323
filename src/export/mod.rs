//! Board image export.
//!
//! A [`Plotter`] renders selected layers of a board, cropped to a view
//! rectangle. [`export_image`] picks the board bounding box as the view and
//! names the output after the board file and its size.

pub mod svg;

use std::path::{Path, PathBuf};

use crate::board::{Board, BoardError, BoardResult, Layer, Rect};

pub use svg::SvgPlotter;

/// Layers plotted when the caller does not choose any.
pub const DEFAULT_LAYERS: [Layer; 4] = [
    Layer::FrontCopper,
    Layer::FrontSilk,
    Layer::FrontMask,
    Layer::EdgeCuts,
];

/// A vector image exporter.
pub trait Plotter {
    /// Writes an image of `layers`, cropped to `view`, to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Collaborator`] if the image cannot be written.
    fn plot(&self, board: &Board, layers: &[Layer], view: Rect, path: &Path) -> BoardResult<()>;
}

/// Result of [`export_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageExport {
    /// Written image file.
    pub path: PathBuf,
    /// Board size in mm.
    pub size_mm: (f64, f64),
}

/// Output path for an image of a board: `<stem>_<w>x<h>.svg` next to the
/// board file.
#[must_use]
pub fn image_path(board_path: &Path, size_mm: (f64, f64)) -> PathBuf {
    let stem = board_path
        .file_stem()
        .map_or_else(|| "board".into(), |s| s.to_string_lossy());
    board_path.with_file_name(format!("{stem}_{:.2}x{:.2}.svg", size_mm.0, size_mm.1))
}

/// Plots a board cropped to its bounding box, replacing any existing image
/// of the same name.
///
/// # Errors
///
/// Returns [`BoardError::MissingGeometry`] for an empty board, or the
/// plotter's error.
pub fn export_image(
    board: &Board,
    board_path: &Path,
    layers: &[Layer],
    plotter: &dyn Plotter,
) -> BoardResult<ImageExport> {
    let view = board.bounding_box().ok_or(BoardError::MissingGeometry)?;
    let size_mm = view.size_mm();
    let path = image_path(board_path, size_mm);
    let layers = if layers.is_empty() {
        &DEFAULT_LAYERS[..]
    } else {
        layers
    };

    plotter.plot(board, layers, view, &path)?;
    tracing::info!(path = %path.display(), ?size_mm, "Exported board image");
    Ok(ImageExport { path, size_mm })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Drawing, Point, Shape};

    #[test]
    fn image_named_after_board_and_size() {
        let path = image_path(Path::new("/work/amp.json"), (25.0, 12.5));
        assert_eq!(path, PathBuf::from("/work/amp_25.00x12.50.svg"));
    }

    #[test]
    fn export_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let board_path = dir.path().join("amp.json");
        let board = Board {
            drawings: vec![Drawing::Shape(Shape::rect(
                Layer::EdgeCuts,
                Rect::from_corners(Point::default(), Point::from_mm(20.0, 10.0)),
                0,
            ))],
            ..Board::default()
        };
        let stale = dir.path().join("amp_20.00x10.00.svg");
        std::fs::write(&stale, "stale").unwrap();

        let export = export_image(&board, &board_path, &[], &SvgPlotter).unwrap();
        assert_eq!(export.path, stale);
        assert_eq!(export.size_mm, (20.0, 10.0));
        let svg = std::fs::read_to_string(&stale).unwrap();
        assert!(svg.contains("<g id=\"Edge.Cuts\""));
    }

    #[test]
    fn empty_board_cannot_be_exported() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_image(&Board::default(), &dir.path().join("x.json"), &[], &SvgPlotter)
            .unwrap_err();
        assert!(matches!(err, BoardError::MissingGeometry));
    }
}
