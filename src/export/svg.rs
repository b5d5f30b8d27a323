//! Minimal SVG plotter.
//!
//! Plots tracks, vias, zones, pads, footprint graphics and board drawings
//! as plain SVG primitives in millimetre user units. One `<g>` group is
//! written per layer, in the order the layers were requested.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::board::units::to_mm;
use crate::board::{
    Board, BoardError, BoardResult, Drawing, Footprint, Layer, Pad, PadShape, Point, Rect,
    ShapeGeometry,
};

use super::Plotter;

/// Writes SVG files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgPlotter;

/// Layer stroke/fill colour (KiCad default theme).
const fn layer_colour(layer: Layer) -> &'static str {
    match layer {
        Layer::FrontCopper => "#c83434",
        Layer::BackCopper => "#4d7fc4",
        Layer::FrontSilk | Layer::BackSilk => "#f2eda1",
        Layer::FrontMask | Layer::BackMask => "#d864ff",
        Layer::FrontCourtyard | Layer::BackCourtyard => "#ff26e2",
        Layer::FrontFab | Layer::BackFab => "#afafaf",
        Layer::EdgeCuts => "#d0d236",
        _ => "#c2c2c2",
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| {
            let (x, y) = p.to_mm();
            format!("{x:.4},{y:.4}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_geometry(out: &mut String, geometry: &ShapeGeometry, width: f64, id: Option<&str>) {
    let id = id.map(|id| format!(" id=\"{id}\"")).unwrap_or_default();
    let stroke = format!("stroke-width=\"{:.4}\"", width.max(0.01));
    match geometry {
        ShapeGeometry::Segment { start, end } => {
            let ((x1, y1), (x2, y2)) = (start.to_mm(), end.to_mm());
            let _ = writeln!(
                out,
                "    <line{id} x1=\"{x1:.4}\" y1=\"{y1:.4}\" x2=\"{x2:.4}\" y2=\"{y2:.4}\" {stroke} fill=\"none\"/>"
            );
        }
        ShapeGeometry::Rect { start, end } => {
            let r = Rect::from_corners(*start, *end);
            let (x, y) = r.origin().to_mm();
            let (w, h) = r.size_mm();
            let _ = writeln!(
                out,
                "    <rect{id} x=\"{x:.4}\" y=\"{y:.4}\" width=\"{w:.4}\" height=\"{h:.4}\" {stroke} fill=\"none\"/>"
            );
        }
        ShapeGeometry::Circle { center, radius } => {
            let (cx, cy) = center.to_mm();
            let _ = writeln!(
                out,
                "    <circle{id} cx=\"{cx:.4}\" cy=\"{cy:.4}\" r=\"{:.4}\" {stroke} fill=\"none\"/>",
                to_mm(*radius)
            );
        }
        ShapeGeometry::Polygon { points } => {
            let _ = writeln!(
                out,
                "    <polygon{id} points=\"{}\" {stroke} fill=\"none\"/>",
                points_attr(points)
            );
        }
    }
}

fn write_pad(out: &mut String, fp: &Footprint, pad: &Pad) {
    let center = fp.pad_position(pad);
    if pad.shape == PadShape::Circle {
        let (cx, cy) = center.to_mm();
        let _ = writeln!(
            out,
            "    <circle cx=\"{cx:.4}\" cy=\"{cy:.4}\" r=\"{:.4}\" stroke=\"none\"/>",
            to_mm(pad.width) / 2.0
        );
        return;
    }
    let corners = Rect::from_center(pad.position, pad.width, pad.height)
        .corners()
        .map(|c| fp.to_board(c));
    let _ = writeln!(
        out,
        "    <polygon points=\"{}\" stroke=\"none\"/>",
        points_attr(&corners)
    );
}

fn write_layer(out: &mut String, board: &Board, layer: Layer) {
    let colour = layer_colour(layer);
    let _ = writeln!(
        out,
        "  <g id=\"{layer}\" stroke=\"{colour}\" fill=\"{colour}\" stroke-linecap=\"round\">"
    );

    if layer.is_copper() {
        for zone in board.zones.iter().filter(|z| z.layer == layer) {
            for polygon in &zone.filled_polygons {
                let _ = writeln!(
                    out,
                    "    <polygon id=\"{}\" points=\"{}\" stroke=\"none\" fill-opacity=\"0.4\"/>",
                    zone.id,
                    points_attr(polygon)
                );
            }
        }
        for track in board.tracks.iter().filter(|t| t.layer == layer) {
            let ((x1, y1), (x2, y2)) = (track.start.to_mm(), track.end.to_mm());
            let _ = writeln!(
                out,
                "    <line id=\"{}\" x1=\"{x1:.4}\" y1=\"{y1:.4}\" x2=\"{x2:.4}\" y2=\"{y2:.4}\" stroke-width=\"{:.4}\"/>",
                track.id,
                to_mm(track.width)
            );
        }
        for via in &board.vias {
            let (cx, cy) = via.position.to_mm();
            let _ = writeln!(
                out,
                "    <circle id=\"{}\" cx=\"{cx:.4}\" cy=\"{cy:.4}\" r=\"{:.4}\" stroke=\"none\"/>",
                via.id,
                to_mm(via.diameter) / 2.0
            );
        }
    }

    // Pads land on the copper and mask layers of the footprint's side.
    for fp in &board.footprints {
        let front = fp.layer != Layer::BackCopper;
        let pads_here = match layer {
            Layer::FrontCopper | Layer::FrontMask => front,
            Layer::BackCopper | Layer::BackMask => !front,
            _ => false,
        };
        if pads_here {
            for pad in &fp.pads {
                write_pad(out, fp, pad);
            }
        }
        for graphic in fp.graphics.iter().filter(|g| g.layer == layer) {
            let placed = graphic.geometry.placed(fp.orientation, fp.position);
            write_geometry(out, &placed, to_mm(graphic.width), None);
        }
    }

    for drawing in board.drawings.iter().filter(|d| d.layer() == layer) {
        match drawing {
            Drawing::Shape(shape) => {
                let id = shape.id.to_string();
                write_geometry(out, &shape.geometry, to_mm(shape.width), Some(&id));
            }
            Drawing::Text(text) => {
                let (x, y) = text.position.to_mm();
                let _ = writeln!(
                    out,
                    "    <text id=\"{}\" x=\"{x:.4}\" y=\"{y:.4}\" font-size=\"{:.4}\" stroke=\"none\" \
                     text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
                    text.id,
                    to_mm(text.size),
                    xml_escape(&text.text)
                );
            }
        }
    }

    out.push_str("  </g>\n");
}

/// Renders the selected layers of a board as an SVG document.
#[must_use]
pub fn render(board: &Board, layers: &[Layer], view: Rect) -> String {
    let (x, y) = view.origin().to_mm();
    let (w, h) = view.size_mm();
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w:.4}mm\" height=\"{h:.4}mm\" \
         viewBox=\"{x:.4} {y:.4} {w:.4} {h:.4}\">"
    );
    for &layer in layers {
        write_layer(&mut out, board, layer);
    }
    out.push_str("</svg>\n");
    out
}

impl Plotter for SvgPlotter {
    fn plot(&self, board: &Board, layers: &[Layer], view: Rect, path: &Path) -> BoardResult<()> {
        let svg = render(board, layers, view);
        fs::write(path, svg).map_err(|e| {
            BoardError::collaborator_with("SVG plotter", format!("cannot write {}", path.display()), e)
        })?;
        tracing::debug!(path = %path.display(), layers = layers.len(), "Plotted SVG");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::units::from_mm;
    use crate::board::{Graphic, Shape, Text, Track};
    use uuid::Uuid;

    fn board() -> Board {
        let mut u1 = Footprint::new("U1", 5.0, 5.0);
        u1.add_graphic(Graphic {
            layer: Layer::FrontSilk,
            ..Graphic::courtyard(2.0, 2.0)
        });
        u1.add_pad(Pad::smd("1", -0.5, 0.0, 0.4, 0.4));
        Board {
            footprints: vec![u1],
            tracks: vec![Track::new(
                Point::from_mm(0.0, 0.0),
                Point::from_mm(10.0, 0.0),
                from_mm(0.25),
                Layer::FrontCopper,
                "SIG",
            )],
            drawings: vec![
                Drawing::Shape(Shape::rect(
                    Layer::EdgeCuts,
                    Rect::from_corners(Point::default(), Point::from_mm(10.0, 10.0)),
                    0,
                )),
                Drawing::Text(Text {
                    id: Uuid::new_v4(),
                    layer: Layer::FrontSilk,
                    position: Point::from_mm(5.0, 9.0),
                    text: "A<B".into(),
                    size: from_mm(1.0),
                }),
            ],
            ..Board::default()
        }
    }

    #[test]
    fn view_box_matches_bounding_box() {
        let board = board();
        let view = board.bounding_box().unwrap();
        let svg = render(&board, &[Layer::EdgeCuts], view);
        let (x, y) = view.origin().to_mm();
        assert!(svg.contains(&format!("viewBox=\"{x:.4} {y:.4} ")));
        assert!(svg.contains("<g id=\"Edge.Cuts\""));
        assert!(!svg.contains("<g id=\"F.Cu\""));
    }

    #[test]
    fn copper_layer_has_tracks_and_pads() {
        let board = board();
        let svg = render(&board, &[Layer::FrontCopper], board.bounding_box().unwrap());
        assert!(svg.contains("<line id="));
        assert!(svg.contains("stroke-width=\"0.2500\""));
        assert_eq!(svg.matches("<polygon points=").count(), 1);
    }

    #[test]
    fn text_is_escaped() {
        let board = board();
        let svg = render(&board, &[Layer::FrontSilk], board.bounding_box().unwrap());
        assert!(svg.contains(">A&lt;B</text>"));
        assert!(svg.contains("<rect x="));
    }

    #[test]
    fn plot_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        let board = board();
        SvgPlotter
            .plot(&board, &[Layer::FrontCopper], board.bounding_box().unwrap(), &path)
            .unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml"));
        assert!(written.trim_end().ends_with("</svg>"));
    }
}
