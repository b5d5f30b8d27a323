//! Crossing detection between inferred pad-to-pad connections.

use std::fmt;

use crate::board::geometry::ccw;
use crate::board::Point;

/// A straight pad-to-pad connection candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Net the connection belongs to.
    pub net: String,
}

impl Segment {
    /// Creates a segment.
    #[must_use]
    pub fn new(start: Point, end: Point, net: impl Into<String>) -> Self {
        Self {
            start,
            end,
            net: net.into(),
        }
    }

    /// Returns true if the two segments properly cross.
    #[must_use]
    pub fn crosses(&self, other: &Self) -> bool {
        let (a, b) = (self.start, self.end);
        let (c, d) = (other.start, other.end);
        ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
    }
}

/// Two crossing segments on different nets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    /// Index of the first segment in the input.
    pub first: usize,
    /// Index of the second segment in the input.
    pub second: usize,
    /// Net of the first segment.
    pub first_net: String,
    /// Net of the second segment.
    pub second_net: String,
}

impl fmt::Display for Crossing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connection #{} ({}) crosses connection #{} ({})",
            self.first + 1,
            self.first_net,
            self.second + 1,
            self.second_net
        )
    }
}

/// Returns every crossing pair `i < j` whose segments belong to different
/// nets, in input order.
#[must_use]
pub fn find_crossings(segments: &[Segment]) -> Vec<Crossing> {
    let mut crossings = Vec::new();
    for (i, a) in segments.iter().enumerate() {
        for (j, b) in segments.iter().enumerate().skip(i + 1) {
            if a.net != b.net && a.crosses(b) {
                crossings.push(Crossing {
                    first: i,
                    second: j,
                    first_net: a.net.clone(),
                    second_net: b.net.clone(),
                });
            }
        }
    }
    crossings
}
