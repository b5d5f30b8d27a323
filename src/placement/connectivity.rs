//! Pad-to-pad connectivity analysis for one footprint.
//!
//! For each connected pad of the target footprint, every other unlocked
//! footprint with a pad on the same net is a peer. A pad pair whose
//! pad-to-pad distance exceeds the distance between the two footprint
//! origins is flagged as an alignment issue: the pads face away from each
//! other, which usually means the footprint is rotated badly.

use std::fmt;

use indexmap::IndexMap;

use crate::board::{Board, BoardResult, Footprint, GROUND_NET};

use super::intersect::{find_crossings, Crossing, Segment};

/// One pad-to-pad connection between the target and a peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PadLink {
    /// Pad number on the target footprint.
    pub pad: String,
    /// Pad number on the peer footprint.
    pub peer_pad: String,
    /// Shared net.
    pub net: String,
    /// Pad-to-pad distance in mm.
    pub pad_distance_mm: f64,
    /// Pad-to-pad distance exceeds module-to-module distance.
    pub misaligned: bool,
    /// The connection as a straight segment.
    pub segment: Segment,
}

/// All connections between the target and one peer footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerConnection {
    /// Peer reference.
    pub reference: String,
    /// Distance between the footprint origins in mm.
    pub module_distance_mm: f64,
    /// Pad pairs in discovery order.
    pub links: Vec<PadLink>,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityAnalysis {
    /// Target reference.
    pub reference: String,
    /// Peers in discovery order.
    pub peers: Vec<PeerConnection>,
    /// Crossings between connections of different nets. Indices refer to
    /// [`ConnectivityAnalysis::segments`].
    pub crossings: Vec<Crossing>,
}

impl ConnectivityAnalysis {
    /// Every pad pair, peer by peer.
    pub fn links(&self) -> impl Iterator<Item = (&PeerConnection, &PadLink)> {
        self.peers
            .iter()
            .flat_map(|peer| peer.links.iter().map(move |link| (peer, link)))
    }

    /// Connection segments in the order the crossing indices use.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        self.links().map(|(_, link)| link.segment.clone()).collect()
    }

    /// Pad pairs flagged as misaligned.
    pub fn alignment_issues(&self) -> impl Iterator<Item = (&PeerConnection, &PadLink)> {
        self.links().filter(|(_, link)| link.misaligned)
    }

    /// Returns true if any pad pair is misaligned.
    #[must_use]
    pub fn has_alignment_issues(&self) -> bool {
        self.alignment_issues().next().is_some()
    }

    fn describe_link(&self, index: usize) -> String {
        self.links().nth(index).map_or_else(
            || format!("#{}", index + 1),
            |(peer, link)| {
                format!(
                    "{}.{} -> {}.{}",
                    self.reference, link.pad, peer.reference, link.peer_pad
                )
            },
        )
    }
}

impl fmt::Display for ConnectivityAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connectivity of {}:", self.reference)?;
        if self.peers.is_empty() {
            return write!(f, "No connected modules.");
        }

        for peer in &self.peers {
            writeln!(
                f,
                "- {}: Module distance: {:.2} mm",
                peer.reference, peer.module_distance_mm
            )?;
            for link in &peer.links {
                write!(
                    f,
                    "  - Pad {}.{} -> {}.{} ({}): Pad distance: {:.2} mm",
                    self.reference,
                    link.pad,
                    peer.reference,
                    link.peer_pad,
                    link.net,
                    link.pad_distance_mm
                )?;
                if link.misaligned {
                    write!(f, " [alignment issue]")?;
                }
                writeln!(f)?;
            }
        }

        let issues = self.alignment_issues().count();
        write!(f, "Alignment issues: {issues}. Crossing connections: {}.", self.crossings.len())?;
        for crossing in &self.crossings {
            write!(
                f,
                "\n- {} ({}) crosses {} ({})",
                crossing.first_net,
                self.describe_link(crossing.first),
                crossing.second_net,
                self.describe_link(crossing.second)
            )?;
        }
        Ok(())
    }
}

/// Returns true if the pad takes part in connectivity analysis.
fn is_analysed_net(net: &str) -> bool {
    !net.is_empty() && net != GROUND_NET
}

/// Analyses the pad-to-pad connections of one footprint.
///
/// # Errors
///
/// Returns [`crate::board::BoardError::NotFound`] for an unknown reference.
pub fn analyze(board: &Board, reference: &str) -> BoardResult<ConnectivityAnalysis> {
    let target = board.require_footprint(reference)?;
    let peers_of = |fp: &&Footprint| fp.reference != target.reference && !fp.locked;

    let mut peers: IndexMap<&str, PeerConnection> = IndexMap::new();

    for pad in target.pads.iter().filter(|p| is_analysed_net(&p.net)) {
        let pad_pos = target.pad_position(pad);

        for peer in board.footprints.iter().filter(peers_of) {
            let module_distance_mm = target.position.distance_mm(peer.position);

            for peer_pad in peer.pads.iter().filter(|p| p.net == pad.net) {
                let peer_pos = peer.pad_position(peer_pad);
                let pad_distance_mm = pad_pos.distance_mm(peer_pos);
                let misaligned = pad_distance_mm > module_distance_mm;
                tracing::debug!(
                    target = %target.reference,
                    pad = %pad.number,
                    peer = %peer.reference,
                    peer_pad = %peer_pad.number,
                    net = %pad.net,
                    pad_distance_mm,
                    module_distance_mm,
                    misaligned,
                    "Pad link"
                );

                peers
                    .entry(peer.reference.as_str())
                    .or_insert_with(|| PeerConnection {
                        reference: peer.reference.clone(),
                        module_distance_mm,
                        links: Vec::new(),
                    })
                    .links
                    .push(PadLink {
                        pad: pad.number.clone(),
                        peer_pad: peer_pad.number.clone(),
                        net: pad.net.clone(),
                        pad_distance_mm,
                        misaligned,
                        segment: Segment::new(pad_pos, peer_pos, pad.net.clone()),
                    });
            }
        }
    }

    let mut analysis = ConnectivityAnalysis {
        reference: target.reference.clone(),
        peers: peers.into_values().collect(),
        crossings: Vec::new(),
    };
    analysis.crossings = find_crossings(&analysis.segments());
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardError, Pad};

    fn two_pin(reference: &str, x: f64, y: f64, net1: &str, net2: &str) -> Footprint {
        let mut fp = Footprint::new(reference, x, y);
        fp.add_pad(Pad::smd("1", -1.0, 0.0, 0.6, 0.6).on_net(net1));
        fp.add_pad(Pad::smd("2", 1.0, 0.0, 0.6, 0.6).on_net(net2));
        fp
    }

    #[test]
    fn facing_pads_are_aligned() {
        let board = Board {
            footprints: vec![
                two_pin("R1", 0.0, 0.0, "IN", "MID"),
                two_pin("R2", 5.0, 0.0, "MID", "OUT"),
            ],
            ..Board::default()
        };
        let analysis = analyze(&board, "R1").unwrap();
        assert_eq!(analysis.peers.len(), 1);
        let link = &analysis.peers[0].links[0];
        assert_eq!((link.pad.as_str(), link.peer_pad.as_str()), ("2", "1"));
        assert!((link.pad_distance_mm - 3.0).abs() < 1e-9);
        assert!(!analysis.has_alignment_issues());
    }

    #[test]
    fn pads_facing_away_are_flagged() {
        let mut r1 = two_pin("R1", 0.0, 0.0, "IN", "MID");
        r1.orientation = 180.0;
        let board = Board {
            footprints: vec![r1, two_pin("R2", 5.0, 0.0, "MID", "OUT")],
            ..Board::default()
        };
        let analysis = analyze(&board, "R1").unwrap();
        let link = &analysis.peers[0].links[0];
        assert!((link.pad_distance_mm - 5.0).abs() < 1e-9);
        assert!(!link.misaligned, "equal distances are not an issue");

        let board = Board {
            footprints: vec![
                two_pin("R1", 0.0, 0.0, "MID", "IN"),
                two_pin("R2", 5.0, 0.0, "OUT", "MID"),
            ],
            ..Board::default()
        };
        let analysis = analyze(&board, "R1").unwrap();
        assert!(analysis.has_alignment_issues());
        assert!((analysis.peers[0].links[0].pad_distance_mm - 7.0).abs() < 1e-9);
    }

    #[test]
    fn ground_locked_and_unconnected_excluded() {
        let mut locked = two_pin("U2", 0.0, 5.0, "SIG", "");
        locked.locked = true;
        let board = Board {
            footprints: vec![
                two_pin("U1", 0.0, 0.0, "GND", "SIG"),
                two_pin("C1", 5.0, 0.0, "GND", ""),
                locked,
            ],
            ..Board::default()
        };
        let analysis = analyze(&board, "U1").unwrap();
        assert!(analysis.peers.is_empty());
        assert!(analysis.to_string().contains("No connected modules."));
    }

    #[test]
    fn peers_grouped_in_discovery_order() {
        let board = Board {
            footprints: vec![
                two_pin("U1", 0.0, 0.0, "A", "B"),
                two_pin("C2", 0.0, 5.0, "B", "A"),
                two_pin("C1", 0.0, -5.0, "A", "X"),
            ],
            ..Board::default()
        };
        let analysis = analyze(&board, "U1").unwrap();
        let refs: Vec<_> = analysis.peers.iter().map(|p| p.reference.as_str()).collect();
        assert_eq!(refs, ["C2", "C1"]);
        assert_eq!(analysis.peers[0].links.len(), 2);
        assert_eq!(analysis.segments().len(), 3);
    }

    #[test]
    fn crossing_connections_detected() {
        // U1 pad 1 (-1,0) goes to C1 at the right, pad 2 (1,0) to C2 at the left.
        let board = Board {
            footprints: vec![
                two_pin("U1", 0.0, 0.0, "A", "B"),
                two_pin("C1", 10.0, 1.0, "A", "Z"),
                two_pin("C2", -10.0, 1.0, "Y", "B"),
            ],
            ..Board::default()
        };
        let analysis = analyze(&board, "U1").unwrap();
        assert_eq!(analysis.crossings.len(), 1);
        let text = analysis.to_string();
        assert!(text.contains("A (U1.1 -> C1.1) crosses B (U1.2 -> C2.2)"), "{text}");
    }

    #[test]
    fn unknown_reference() {
        assert!(matches!(
            analyze(&Board::default(), "U1"),
            Err(BoardError::NotFound { .. })
        ));
    }
}
