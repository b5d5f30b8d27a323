//! Board editing operations.
//!
//! Every operation validates its arguments before touching the board, so a
//! rejected call leaves the board unchanged. Saving is the caller's job.

use std::collections::HashMap;

use super::fill::ZoneFiller;
use super::units::{from_mm, Coord};
use super::{
    Board, BoardError, BoardResult, Drawing, Layer, Point, Rect, Shape, Track, Zone, GROUND_NET,
};

/// Maximum absolute coordinate accepted from callers (mm).
pub const MAX_COORDINATE_MM: f64 = 5000.0;

/// Stroke width of generated outline and label rectangles (0.1 mm).
const LINE_WIDTH: Coord = 100_000;

fn validate_coordinate(name: &str, value: f64) -> BoardResult<()> {
    if !value.is_finite() {
        return Err(BoardError::validation(format!("{name} must be a finite number")));
    }
    if value.abs() > MAX_COORDINATE_MM {
        return Err(BoardError::validation(format!(
            "{name} = {value} mm is outside the allowed range of +/-{MAX_COORDINATE_MM} mm"
        )));
    }
    Ok(())
}

fn validate_size(name: &str, value: f64) -> BoardResult<()> {
    validate_coordinate(name, value)?;
    if value <= 0.0 {
        return Err(BoardError::validation(format!("{name} must be greater than 0")));
    }
    Ok(())
}

/// Removes every shape on `layer`, returning how many were removed.
fn remove_shapes_on(board: &mut Board, layer: Layer) -> usize {
    let before = board.drawings.len();
    board
        .drawings
        .retain(|d| !matches!(d, Drawing::Shape(shape) if shape.layer == layer));
    before - board.drawings.len()
}

/// Replaces the board outline with a rectangle around all other items.
///
/// Returns the new outline rectangle.
///
/// # Errors
///
/// Returns [`BoardError::MissingGeometry`] if the board has no items besides
/// the outline.
pub fn fit_board_outline(board: &mut Board) -> BoardResult<Rect> {
    let content = board
        .content_bounding_box()
        .ok_or(BoardError::MissingGeometry)?;

    let removed = remove_shapes_on(board, Layer::EdgeCuts);
    board
        .drawings
        .push(Drawing::Shape(Shape::rect(Layer::EdgeCuts, content, LINE_WIDTH)));

    tracing::info!(removed, size = ?content.size_mm(), "Fitted board outline");
    Ok(content)
}

/// Result of [`add_ground_zone`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundZone {
    /// Zone extent.
    pub area: Rect,
    /// Net the zone was attached to; `None` when the board has no GND net.
    pub net: Option<String>,
}

/// Replaces all zones with one `B.Cu` zone covering the board, attached to
/// `GND` when that net exists, and fills it.
///
/// # Errors
///
/// Returns [`BoardError::MissingGeometry`] for an empty board, or the
/// filler's error.
pub fn add_ground_zone(board: &mut Board, filler: &dyn ZoneFiller) -> BoardResult<GroundZone> {
    let area = board.bounding_box().ok_or(BoardError::MissingGeometry)?;
    let net = board.net(GROUND_NET).map(|n| n.name.clone());
    if net.is_none() {
        tracing::warn!("Board has no GND net, ground zone left unconnected");
    }

    board.zones.clear();
    board.zones.push(Zone::rect(
        Layer::BackCopper,
        net.clone().unwrap_or_default(),
        area,
    ));
    filler.fill(board)?;

    tracing::info!(size = ?area.size_mm(), net = ?net, "Added ground zone");
    Ok(GroundZone { area, net })
}

/// Moves and/or rotates a footprint. `None` keeps the current value.
///
/// Returns the new position and orientation.
///
/// # Errors
///
/// Returns [`BoardError::Validation`] for non-finite or out-of-range values
/// and [`BoardError::NotFound`] for an unknown reference.
pub fn move_footprint(
    board: &mut Board,
    reference: &str,
    x: Option<f64>,
    y: Option<f64>,
    angle: Option<f64>,
) -> BoardResult<(Point, f64)> {
    if let Some(x) = x {
        validate_coordinate("x", x)?;
    }
    if let Some(y) = y {
        validate_coordinate("y", y)?;
    }
    if let Some(angle) = angle {
        if !angle.is_finite() {
            return Err(BoardError::validation("angle must be a finite number"));
        }
    }

    let fp = board
        .footprint_mut(reference)
        .ok_or_else(|| BoardError::footprint_not_found(reference))?;
    if let Some(x) = x {
        fp.position.x = from_mm(x);
    }
    if let Some(y) = y {
        fp.position.y = from_mm(y);
    }
    if let Some(angle) = angle {
        fp.orientation = angle;
    }

    tracing::info!(
        reference,
        position = ?fp.position.to_mm(),
        orientation = fp.orientation,
        "Moved footprint"
    );
    Ok((fp.position, fp.orientation))
}

/// Track geometry for [`replace_net_tracks`], one entry per track (mm).
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackLists<'a> {
    /// Start X coordinates.
    pub start_x: &'a [f64],
    /// Start Y coordinates.
    pub start_y: &'a [f64],
    /// End X coordinates.
    pub end_x: &'a [f64],
    /// End Y coordinates.
    pub end_y: &'a [f64],
    /// Track widths.
    pub width: &'a [f64],
}

impl TrackLists<'_> {
    fn validate(&self) -> BoardResult<usize> {
        let count = self.start_x.len();
        let lengths = [
            self.start_y.len(),
            self.end_x.len(),
            self.end_y.len(),
            self.width.len(),
        ];
        if lengths.iter().any(|&len| len != count) {
            return Err(BoardError::validation(format!(
                "start_x, start_y, end_x, end_y and width must have the same length \
                 (got {count}, {}, {}, {}, {})",
                lengths[0], lengths[1], lengths[2], lengths[3]
            )));
        }
        for i in 0..count {
            validate_coordinate("start_x", self.start_x[i])?;
            validate_coordinate("start_y", self.start_y[i])?;
            validate_coordinate("end_x", self.end_x[i])?;
            validate_coordinate("end_y", self.end_y[i])?;
            validate_size("width", self.width[i])?;
        }
        Ok(count)
    }
}

/// Summary of [`replace_net_tracks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackReplacement {
    /// Tracks deleted from the net.
    pub removed: usize,
    /// Tracks added.
    pub added: usize,
}

/// Deletes a net's tracks and adds new `F.Cu` tracks for it.
///
/// # Errors
///
/// Returns [`BoardError::Validation`] for mismatched lists or bad values and
/// [`BoardError::NotFound`] when the net does not exist or is the code-0
/// entry.
pub fn replace_net_tracks(
    board: &mut Board,
    net: &str,
    tracks: &TrackLists<'_>,
) -> BoardResult<TrackReplacement> {
    let count = tracks.validate()?;
    match board.net(net) {
        Some(n) if !n.is_unconnected() => {}
        _ => return Err(BoardError::net_not_found(net)),
    }

    let before = board.tracks.len();
    board.tracks.retain(|t| t.net != net);
    let removed = before - board.tracks.len();

    for i in 0..count {
        board.tracks.push(Track::new(
            Point::from_mm(tracks.start_x[i], tracks.start_y[i]),
            Point::from_mm(tracks.end_x[i], tracks.end_y[i]),
            from_mm(tracks.width[i]),
            Layer::FrontCopper,
            net,
        ));
    }

    tracing::info!(net, removed, added = count, "Replaced net tracks");
    Ok(TrackReplacement {
        removed,
        added: count,
    })
}

/// Resolves the layer used to label a functional area.
#[must_use]
pub fn label_layer(function: &str, layers: &HashMap<String, Layer>, default: Layer) -> Layer {
    layers.get(function).copied().unwrap_or(default)
}

/// Marks a functional area with a rectangle on `layer`, replacing any
/// shapes already on that layer.
///
/// # Errors
///
/// Returns [`BoardError::Validation`] for non-finite, out-of-range or
/// non-positive values.
pub fn label_area(
    board: &mut Board,
    layer: Layer,
    center: (f64, f64),
    size: (f64, f64),
) -> BoardResult<Rect> {
    validate_coordinate("center_x", center.0)?;
    validate_coordinate("center_y", center.1)?;
    validate_size("size_x", size.0)?;
    validate_size("size_y", size.1)?;

    let rect = Rect::from_center(
        Point::from_mm(center.0, center.1),
        from_mm(size.0),
        from_mm(size.1),
    );
    let removed = remove_shapes_on(board, layer);
    board
        .drawings
        .push(Drawing::Shape(Shape::rect(layer, rect, LINE_WIDTH)));

    tracing::info!(%layer, removed, "Labelled area");
    Ok(rect)
}
