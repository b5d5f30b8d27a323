//! Board item types: footprints, pads, nets, tracks, vias, zones and
//! drawings.
//!
//! Footprint pads and graphics are stored in footprint-local coordinates at
//! orientation 0 and placed on the board through [`Footprint::to_board`].
//! Everything else is stored in board coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::{Point, Rect};
use super::units::{from_mm, Coord};

/// Default text glyph height (1 mm).
const DEFAULT_TEXT_SIZE: Coord = 1_000_000;

/// Board layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Layer {
    // Copper
    /// Front copper.
    #[default]
    #[serde(rename = "F.Cu", alias = "F_Cu")]
    FrontCopper,
    /// Back copper.
    #[serde(rename = "B.Cu", alias = "B_Cu")]
    BackCopper,

    // Silkscreen
    /// Front silkscreen.
    #[serde(rename = "F.SilkS", alias = "F_SilkS")]
    FrontSilk,
    /// Back silkscreen.
    #[serde(rename = "B.SilkS", alias = "B_SilkS")]
    BackSilk,

    // Solder mask
    /// Front solder mask.
    #[serde(rename = "F.Mask", alias = "F_Mask")]
    FrontMask,
    /// Back solder mask.
    #[serde(rename = "B.Mask", alias = "B_Mask")]
    BackMask,

    // Courtyard
    /// Front courtyard (component keep-clear outline).
    #[serde(rename = "F.CrtYd", alias = "F_CrtYd")]
    FrontCourtyard,
    /// Back courtyard.
    #[serde(rename = "B.CrtYd", alias = "B_CrtYd")]
    BackCourtyard,

    // Fabrication
    /// Front fabrication outline.
    #[serde(rename = "F.Fab", alias = "F_Fab")]
    FrontFab,
    /// Back fabrication outline.
    #[serde(rename = "B.Fab", alias = "B_Fab")]
    BackFab,

    /// Board outline.
    #[serde(rename = "Edge.Cuts", alias = "Edge_Cuts")]
    EdgeCuts,

    // User annotation layers
    /// User layer 1.
    #[serde(rename = "User.1", alias = "User_1")]
    User1,
    /// User layer 2.
    #[serde(rename = "User.2", alias = "User_2")]
    User2,
    /// User layer 3.
    #[serde(rename = "User.3", alias = "User_3")]
    User3,
    /// User layer 4.
    #[serde(rename = "User.4", alias = "User_4")]
    User4,
    /// User drawings.
    #[serde(rename = "Dwgs.User", alias = "Dwgs_User")]
    DrawingsUser,
    /// User comments.
    #[serde(rename = "Cmts.User", alias = "Cmts_User")]
    CommentsUser,
}

impl Layer {
    /// Every layer, in stack order.
    pub const ALL: [Self; 17] = [
        Self::FrontCopper,
        Self::BackCopper,
        Self::FrontSilk,
        Self::BackSilk,
        Self::FrontMask,
        Self::BackMask,
        Self::FrontCourtyard,
        Self::BackCourtyard,
        Self::FrontFab,
        Self::BackFab,
        Self::EdgeCuts,
        Self::User1,
        Self::User2,
        Self::User3,
        Self::User4,
        Self::DrawingsUser,
        Self::CommentsUser,
    ];

    /// Returns the canonical layer name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FrontCopper => "F.Cu",
            Self::BackCopper => "B.Cu",
            Self::FrontSilk => "F.SilkS",
            Self::BackSilk => "B.SilkS",
            Self::FrontMask => "F.Mask",
            Self::BackMask => "B.Mask",
            Self::FrontCourtyard => "F.CrtYd",
            Self::BackCourtyard => "B.CrtYd",
            Self::FrontFab => "F.Fab",
            Self::BackFab => "B.Fab",
            Self::EdgeCuts => "Edge.Cuts",
            Self::User1 => "User.1",
            Self::User2 => "User.2",
            Self::User3 => "User.3",
            Self::User4 => "User.4",
            Self::DrawingsUser => "Dwgs.User",
            Self::CommentsUser => "Cmts.User",
        }
    }

    /// Parses a layer name. Accepts `F.Cu` and `F_Cu` spellings,
    /// case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().replace('_', ".");
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(&wanted))
    }

    /// Returns true for the front and back courtyard layers.
    #[must_use]
    pub const fn is_courtyard(&self) -> bool {
        matches!(self, Self::FrontCourtyard | Self::BackCourtyard)
    }

    /// Returns true for the four numbered user layers.
    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User1 | Self::User2 | Self::User3 | Self::User4)
    }

    /// Returns true for copper layers.
    #[must_use]
    pub const fn is_copper(&self) -> bool {
        matches!(self, Self::FrontCopper | Self::BackCopper)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown layer '{s}'"))
    }
}

/// Geometry of a graphic shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeGeometry {
    /// Straight line.
    Segment {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
    },
    /// Axis-aligned rectangle given by two opposite corners.
    Rect {
        /// First corner.
        start: Point,
        /// Opposite corner.
        end: Point,
    },
    /// Circle.
    Circle {
        /// Centre.
        center: Point,
        /// Radius in mm.
        #[serde(with = "super::units::mm")]
        radius: Coord,
    },
    /// Closed polygon.
    Polygon {
        /// Vertices in order.
        points: Vec<Point>,
    },
}

impl ShapeGeometry {
    /// Short shape name used in reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Segment { .. } => "Line",
            Self::Rect { .. } => "Rect",
            Self::Circle { .. } => "Circle",
            Self::Polygon { .. } => "Polygon",
        }
    }

    /// Bounding box of the geometry (without stroke width).
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Self::Segment { start, end } | Self::Rect { start, end } => {
                Some(Rect::from_corners(*start, *end))
            }
            Self::Circle { center, radius } => {
                Some(Rect::from_center(*center, 2 * radius, 2 * radius))
            }
            Self::Polygon { points } => Rect::bounding(points.iter().copied()),
        }
    }

    /// Returns this geometry rotated by `degrees` and then translated by
    /// `offset`. Rectangles that are not rotated by a quarter turn become
    /// polygons.
    #[must_use]
    pub fn placed(&self, degrees: f64, offset: Point) -> Self {
        let place = |p: Point| p.rotated(degrees).offset(offset);
        match self {
            Self::Segment { start, end } => Self::Segment {
                start: place(*start),
                end: place(*end),
            },
            Self::Rect { start, end } => {
                if super::geometry::quarter_turns(degrees).is_some() {
                    Self::Rect {
                        start: place(*start),
                        end: place(*end),
                    }
                } else {
                    let corners = Rect::from_corners(*start, *end).corners();
                    Self::Polygon {
                        points: corners.iter().map(|c| place(*c)).collect(),
                    }
                }
            }
            Self::Circle { center, radius } => Self::Circle {
                center: place(*center),
                radius: *radius,
            },
            Self::Polygon { points } => Self::Polygon {
                points: points.iter().map(|p| place(*p)).collect(),
            },
        }
    }
}

/// A graphic shape on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Item identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Layer the shape is drawn on.
    pub layer: Layer,
    /// Shape geometry.
    pub geometry: ShapeGeometry,
    /// Stroke width in mm.
    #[serde(default, with = "super::units::mm")]
    pub width: Coord,
}

impl Shape {
    /// Creates a rectangle shape on `layer`.
    #[must_use]
    pub fn rect(layer: Layer, rect: Rect, width: Coord) -> Self {
        Self {
            id: Uuid::new_v4(),
            layer,
            geometry: ShapeGeometry::Rect {
                start: rect.origin(),
                end: rect.end(),
            },
            width,
        }
    }

    /// Bounding box including half the stroke width.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        self.geometry
            .bounding_box()
            .map(|r| r.inflate(self.width / 2))
    }
}

/// A free text item on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Item identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Layer the text is drawn on.
    pub layer: Layer,
    /// Anchor (centre of the text block).
    pub position: Point,
    /// The text.
    pub text: String,
    /// Glyph height in mm.
    #[serde(default = "default_text_size", with = "super::units::mm")]
    pub size: Coord,
}

const fn default_text_size() -> Coord {
    DEFAULT_TEXT_SIZE
}

impl Text {
    /// Approximate bounding box: one glyph height per character wide,
    /// one line tall, centred on the anchor.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn bounding_box(&self) -> Rect {
        let chars = self.text.chars().count().max(1) as Coord;
        Rect::from_center(self.position, chars * self.size, self.size)
    }
}

/// A board-level drawing item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drawing {
    /// A graphic shape.
    Shape(Shape),
    /// A text item.
    Text(Text),
}

impl Drawing {
    /// Layer of the item.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        match self {
            Self::Shape(shape) => shape.layer,
            Self::Text(text) => text.layer,
        }
    }

    /// Item identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Shape(shape) => shape.id,
            Self::Text(text) => text.id,
        }
    }

    /// Reference position: shape start or centre, text anchor.
    #[must_use]
    pub fn position(&self) -> Point {
        match self {
            Self::Shape(shape) => match &shape.geometry {
                ShapeGeometry::Segment { start, .. } | ShapeGeometry::Rect { start, .. } => *start,
                ShapeGeometry::Circle { center, .. } => *center,
                ShapeGeometry::Polygon { points } => points.first().copied().unwrap_or_default(),
            },
            Self::Text(text) => text.position,
        }
    }

    /// Bounding box of the item.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Self::Shape(shape) => shape.bounding_box(),
            Self::Text(text) => Some(text.bounding_box()),
        }
    }
}

/// A graphic belonging to a footprint, in footprint-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    /// Layer the graphic is drawn on.
    pub layer: Layer,
    /// Local geometry.
    pub geometry: ShapeGeometry,
    /// Stroke width in mm.
    #[serde(default, with = "super::units::mm")]
    pub width: Coord,
}

impl Graphic {
    /// Creates a courtyard rectangle centred on the footprint origin.
    #[must_use]
    pub fn courtyard(width_mm: f64, height_mm: f64) -> Self {
        let rect = Rect::from_center(Point::default(), from_mm(width_mm), from_mm(height_mm));
        Self {
            layer: Layer::FrontCourtyard,
            geometry: ShapeGeometry::Rect {
                start: rect.origin(),
                end: rect.end(),
            },
            width: 0,
        }
    }

    /// Local bounding box including half the stroke width.
    #[must_use]
    pub fn local_bounding_box(&self) -> Option<Rect> {
        self.geometry
            .bounding_box()
            .map(|r| r.inflate(self.width / 2))
    }
}

/// Pad copper shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    /// Rectangular pad.
    #[default]
    Rect,
    /// Rectangle with rounded corners.
    RoundRect,
    /// Circular pad.
    Circle,
    /// Oval pad.
    Oval,
}

/// A footprint pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    /// Pad number, unique within its footprint (e.g. "1", "A3").
    pub number: String,
    /// Position relative to the footprint origin.
    pub position: Point,
    /// Pad width in mm.
    #[serde(default, with = "super::units::mm")]
    pub width: Coord,
    /// Pad height in mm.
    #[serde(default, with = "super::units::mm")]
    pub height: Coord,
    /// Copper shape.
    #[serde(default)]
    pub shape: PadShape,
    /// Net name; empty when unconnected.
    #[serde(default)]
    pub net: String,
}

impl Pad {
    /// Creates an SMD pad at a local position (mm).
    #[must_use]
    pub fn smd(number: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            number: number.into(),
            position: Point::from_mm(x, y),
            width: from_mm(width),
            height: from_mm(height),
            shape: PadShape::Rect,
            net: String::new(),
        }
    }

    /// Returns this pad assigned to `net`.
    #[must_use]
    pub fn on_net(mut self, net: impl Into<String>) -> Self {
        self.net = net.into();
        self
    }

    /// Returns true if the pad is attached to a net.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.net.is_empty()
    }
}

/// A placed footprint (module).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Reference designator, unique on the board (e.g. "U1").
    pub reference: String,
    /// Value field (e.g. "TPS62130RGTR").
    #[serde(default)]
    pub value: String,
    /// Library footprint name.
    #[serde(default)]
    pub footprint: String,
    /// Board position of the footprint origin.
    pub position: Point,
    /// Orientation in degrees.
    #[serde(default)]
    pub orientation: f64,
    /// Locked footprints are not moved by placement tools.
    #[serde(default)]
    pub locked: bool,
    /// Placement side (`F.Cu` or `B.Cu`).
    #[serde(default)]
    pub layer: Layer,
    /// Pads, in footprint order.
    #[serde(default)]
    pub pads: Vec<Pad>,
    /// Graphics (courtyard, silkscreen, fabrication).
    #[serde(default)]
    pub graphics: Vec<Graphic>,
}

impl Footprint {
    /// Creates an empty footprint at a board position (mm).
    #[must_use]
    pub fn new(reference: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            reference: reference.into(),
            value: String::new(),
            footprint: String::new(),
            position: Point::from_mm(x, y),
            orientation: 0.0,
            locked: false,
            layer: Layer::FrontCopper,
            pads: Vec::new(),
            graphics: Vec::new(),
        }
    }

    /// Adds a pad.
    pub fn add_pad(&mut self, pad: Pad) {
        self.pads.push(pad);
    }

    /// Adds a graphic.
    pub fn add_graphic(&mut self, graphic: Graphic) {
        self.graphics.push(graphic);
    }

    /// Maps a footprint-local point to board coordinates.
    #[must_use]
    pub fn to_board(&self, local: Point) -> Point {
        local.rotated(self.orientation).offset(self.position)
    }

    /// Board position of a pad.
    #[must_use]
    pub fn pad_position(&self, pad: &Pad) -> Point {
        self.to_board(pad.position)
    }

    /// Looks up a pad by number.
    #[must_use]
    pub fn pad(&self, number: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.number == number)
    }

    /// Graphics on the courtyard layers.
    pub fn courtyard_graphics(&self) -> impl Iterator<Item = &Graphic> {
        self.graphics.iter().filter(|g| g.layer.is_courtyard())
    }

    /// Exact board-space bounding box of all pads and graphics.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        let graphics = self
            .graphics
            .iter()
            .filter_map(Graphic::local_bounding_box);
        let pads = self
            .pads
            .iter()
            .map(|p| Rect::from_center(p.position, p.width, p.height));

        graphics
            .chain(pads)
            .map(|local| local.rotated(self.orientation).translated(self.position))
            .reduce(|acc, r| acc.merge(&r))
    }
}

/// An electrical net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    /// Net code; 0 is reserved for "no net".
    pub code: u32,
    /// Net name.
    pub name: String,
}

impl Net {
    /// Returns true for the reserved "no net" entry.
    #[must_use]
    pub const fn is_unconnected(&self) -> bool {
        self.code == 0
    }
}

/// A copper track segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Item identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Track width in mm.
    #[serde(with = "super::units::mm")]
    pub width: Coord,
    /// Copper layer.
    #[serde(default)]
    pub layer: Layer,
    /// Net name; empty when unconnected.
    #[serde(default)]
    pub net: String,
}

impl Track {
    /// Creates a track from millimetre values.
    #[must_use]
    pub fn new(start: Point, end: Point, width: Coord, layer: Layer, net: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            width,
            layer,
            net: net.into(),
        }
    }

    /// Bounding box including half the track width.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        Rect::from_corners(self.start, self.end).inflate(self.width / 2)
    }
}

/// A via.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    /// Item identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Centre.
    pub position: Point,
    /// Copper diameter in mm.
    #[serde(with = "super::units::mm")]
    pub diameter: Coord,
    /// Drill diameter in mm.
    #[serde(with = "super::units::mm")]
    pub drill: Coord,
    /// Net name; empty when unconnected.
    #[serde(default)]
    pub net: String,
}

impl Via {
    /// Bounding box of the copper ring.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        Rect::from_center(self.position, self.diameter, self.diameter)
    }
}

/// A copper zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Item identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Copper layer.
    pub layer: Layer,
    /// Net name; empty when unconnected.
    #[serde(default)]
    pub net: String,
    /// Outline polygon.
    pub outline: Vec<Point>,
    /// Filled copper polygons, as produced by the fill engine.
    #[serde(default)]
    pub filled_polygons: Vec<Vec<Point>>,
}

impl Zone {
    /// Creates an unfilled rectangular zone.
    #[must_use]
    pub fn rect(layer: Layer, net: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            layer,
            net: net.into(),
            outline: rect.corners().to_vec(),
            filled_polygons: Vec::new(),
        }
    }

    /// Returns true once the zone has been filled.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        !self.filled_polygons.is_empty()
    }

    /// Bounding box of the outline.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        Rect::bounding(self.outline.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_names_round_trip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_name(layer.as_str()), Some(layer));
        }
        assert_eq!(Layer::from_name("F_Cu"), Some(Layer::FrontCopper));
        assert_eq!(Layer::from_name("edge_cuts"), Some(Layer::EdgeCuts));
        assert_eq!(Layer::from_name("Mechanical 1"), None);
    }

    #[test]
    fn layer_serde_accepts_aliases() {
        let layer: Layer = serde_json::from_str("\"User_2\"").unwrap();
        assert_eq!(layer, Layer::User2);
        assert_eq!(serde_json::to_string(&Layer::User2).unwrap(), "\"User.2\"");
    }

    #[test]
    fn drawing_is_tagged() {
        let json = r#"{
            "kind": "text",
            "layer": "User.1",
            "position": {"x": 10.0, "y": 5.0},
            "text": "VIN"
        }"#;
        let drawing: Drawing = serde_json::from_str(json).unwrap();
        assert!(matches!(drawing, Drawing::Text(_)));
        assert_eq!(drawing.layer(), Layer::User1);
        let bbox = drawing.bounding_box().unwrap();
        assert_eq!(bbox.size_mm(), (3.0, 1.0));
    }

    #[test]
    fn shape_bbox_includes_stroke() {
        let shape = Shape {
            id: Uuid::new_v4(),
            layer: Layer::EdgeCuts,
            geometry: ShapeGeometry::Segment {
                start: Point::from_mm(0.0, 0.0),
                end: Point::from_mm(10.0, 0.0),
            },
            width: from_mm(0.2),
        };
        let bbox = shape.bounding_box().unwrap();
        assert_eq!(bbox.origin(), Point::from_mm(-0.1, -0.1));
        assert_eq!(bbox.size_mm(), (10.2, 0.2));
    }

    #[test]
    fn pads_follow_footprint_transform() {
        let mut fp = Footprint::new("R1", 10.0, 10.0);
        fp.add_pad(Pad::smd("1", 1.0, 0.0, 0.5, 0.5));
        assert_eq!(fp.pad_position(&fp.pads[0]), Point::from_mm(11.0, 10.0));

        fp.orientation = 90.0;
        assert_eq!(fp.pad_position(&fp.pads[0]), Point::from_mm(10.0, 9.0));
    }

    #[test]
    fn footprint_bbox_rotates() {
        let mut fp = Footprint::new("C1", 0.0, 0.0);
        fp.add_graphic(Graphic::courtyard(4.0, 2.0));
        assert_eq!(fp.bounding_box().unwrap().size_mm(), (4.0, 2.0));
        fp.orientation = 270.0;
        assert_eq!(fp.bounding_box().unwrap().size_mm(), (2.0, 4.0));
    }

    #[test]
    fn rect_placed_off_axis_becomes_polygon() {
        let rect = ShapeGeometry::Rect {
            start: Point::from_mm(-1.0, -1.0),
            end: Point::from_mm(1.0, 1.0),
        };
        assert!(matches!(
            rect.placed(45.0, Point::default()),
            ShapeGeometry::Polygon { .. }
        ));
        assert!(matches!(
            rect.placed(180.0, Point::default()),
            ShapeGeometry::Rect { .. }
        ));
    }
}
