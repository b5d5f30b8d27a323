//! Net routing through an external autorouter.
//!
//! The board is exported as a [`RoutingProblem`] JSON file next to the
//! board (`<stem>.routing.json`). The autorouter reads it and writes a
//! [`RoutingResult`] (`<stem>.routed.json`) whose tracks and vias are
//! imported back into the board.

use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardError, BoardResult, Layer, Point, Rect, Track, Via};
use crate::placement::courtyard::board_outline;

/// A pad as seen by the autorouter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPad {
    /// Footprint reference.
    pub reference: String,
    /// Pad number.
    pub number: String,
    /// Board position.
    pub position: Point,
    /// Pad width in mm.
    #[serde(with = "crate::board::units::mm")]
    pub width: i64,
    /// Pad height in mm.
    #[serde(with = "crate::board::units::mm")]
    pub height: i64,
    /// Copper layer.
    pub layer: Layer,
    /// Net to route; empty for pads that are obstacles only.
    pub net: String,
}

/// Input handed to the autorouter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingProblem {
    /// Board outline corners, if defined.
    pub outline: Vec<Point>,
    /// Nets with at least two pads to connect.
    pub nets: Vec<String>,
    /// Every pad on the board.
    pub pads: Vec<RoutingPad>,
    /// Existing tracks to keep.
    pub tracks: Vec<Track>,
    /// Existing vias to keep.
    pub vias: Vec<Via>,
}

impl RoutingProblem {
    /// Builds the routing problem for a board.
    ///
    /// When `keep_connections` is non-empty, only the listed
    /// `(reference, pad)` pairs keep their nets; every other pad is exported
    /// as an unconnected obstacle. The board itself is not modified.
    #[must_use]
    pub fn from_board(board: &Board, keep_connections: &[(String, String)]) -> Self {
        let keep: HashSet<(&str, &str)> = keep_connections
            .iter()
            .map(|(r, p)| (r.as_str(), p.as_str()))
            .collect();

        let pads: Vec<RoutingPad> = board
            .footprints
            .iter()
            .flat_map(|fp| {
                let keep = &keep;
                fp.pads.iter().map(move |pad| {
                    let kept = keep.is_empty()
                        || keep.contains(&(fp.reference.as_str(), pad.number.as_str()));
                    let size = Rect::from_center(pad.position, pad.width, pad.height)
                        .rotated(fp.orientation);
                    RoutingPad {
                        reference: fp.reference.clone(),
                        number: pad.number.clone(),
                        position: fp.pad_position(pad),
                        width: size.width,
                        height: size.height,
                        layer: fp.layer,
                        net: if kept { pad.net.clone() } else { String::new() },
                    }
                })
            })
            .collect();

        let nets = board
            .connected_nets()
            .filter(|net| pads.iter().filter(|p| p.net == net.name).count() >= 2)
            .map(|net| net.name.clone())
            .collect();

        Self {
            outline: board_outline(board)
                .map(|r| r.corners().to_vec())
                .unwrap_or_default(),
            nets,
            pads,
            tracks: board.tracks.clone(),
            vias: board.vias.clone(),
        }
    }
}

/// Routed copper returned by the autorouter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    /// New tracks.
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// New vias.
    #[serde(default)]
    pub vias: Vec<Via>,
}

/// An external routing engine.
pub trait Autorouter {
    /// Routes the problem in `input`, writing a [`RoutingResult`] to
    /// `output`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Collaborator`] if routing fails.
    fn route(&self, input: &Path, output: &Path) -> impl Future<Output = BoardResult<()>>;
}

/// Runs a configured command as the autorouter.
///
/// `{input}` and `{output}` in the arguments are replaced by the problem and
/// result paths. The process is killed if it outlives the timeout.
#[derive(Debug, Clone)]
pub struct ProcessRouter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessRouter {
    /// Creates a router running `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl Autorouter for ProcessRouter {
    async fn route(&self, input: &Path, output: &Path) -> BoardResult<()> {
        let args = self.expand_args(input, output);
        tracing::info!(program = %self.program, ?args, "Starting autorouter");

        let child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BoardError::collaborator_with(
                    "Autorouter",
                    format!("failed to start '{}'", self.program),
                    e,
                )
            })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                BoardError::collaborator(
                    "Autorouter",
                    format!("timed out after {} s", self.timeout.as_secs_f64()),
                )
            })?
            .map_err(|e| BoardError::collaborator_with("Autorouter", "process I/O failed", e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(BoardError::collaborator(
                "Autorouter",
                format!("exited with {}: {}", result.status, stderr.trim()),
            ));
        }
        Ok(())
    }
}

/// Summary of [`route_board`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSummary {
    /// Problem file handed to the router.
    pub problem_path: PathBuf,
    /// Result file read back.
    pub result_path: PathBuf,
    /// Tracks imported.
    pub tracks_added: usize,
    /// Vias imported.
    pub vias_added: usize,
}

fn sibling(board_path: &Path, suffix: &str) -> PathBuf {
    let stem = board_path
        .file_stem()
        .map_or_else(|| "board".into(), |s| s.to_string_lossy());
    board_path.with_file_name(format!("{stem}.{suffix}"))
}

/// Routes a board and imports the result. The caller saves the board.
///
/// # Errors
///
/// Returns file errors for the exchange files, the router's error, or
/// [`BoardError::Validation`] when the result references unknown nets.
pub async fn route_board<R: Autorouter>(
    board: &mut Board,
    board_path: &Path,
    router: &R,
    keep_connections: &[(String, String)],
) -> BoardResult<RoutingSummary> {
    let problem = RoutingProblem::from_board(board, keep_connections);
    let problem_path = sibling(board_path, "routing.json");
    let result_path = sibling(board_path, "routed.json");

    let json =
        serde_json::to_string_pretty(&problem).map_err(|source| BoardError::Serialise { source })?;
    fs::write(&problem_path, json).map_err(|e| BoardError::file_write(&problem_path, e))?;
    if result_path.exists() {
        fs::remove_file(&result_path).map_err(|e| BoardError::file_write(&result_path, e))?;
    }

    router.route(&problem_path, &result_path).await?;

    let text = fs::read_to_string(&result_path).map_err(|e| BoardError::file_read(&result_path, e))?;
    let result: RoutingResult = serde_json::from_str(&text).map_err(|source| BoardError::Parse {
        path: result_path.clone(),
        source,
    })?;

    let unknown = result
        .tracks
        .iter()
        .map(|t| t.net.as_str())
        .chain(result.vias.iter().map(|v| v.net.as_str()))
        .find(|net| !net.is_empty() && board.net(net).is_none());
    if let Some(net) = unknown {
        return Err(BoardError::validation(format!(
            "Routing result references unknown net '{net}'"
        )));
    }

    let summary = RoutingSummary {
        problem_path,
        result_path,
        tracks_added: result.tracks.len(),
        vias_added: result.vias.len(),
    };
    board.tracks.extend(result.tracks);
    board.vias.extend(result.vias);

    tracing::info!(
        tracks = summary.tracks_added,
        vias = summary.vias_added,
        "Imported routing result"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::units::from_mm;
    use crate::board::{Footprint, Net, Pad};

    fn board() -> Board {
        let mut r1 = Footprint::new("R1", 0.0, 0.0);
        r1.add_pad(Pad::smd("1", -1.0, 0.0, 0.6, 0.8).on_net("A"));
        r1.add_pad(Pad::smd("2", 1.0, 0.0, 0.6, 0.8).on_net("B"));
        let mut r2 = Footprint::new("R2", 5.0, 0.0);
        r2.add_pad(Pad::smd("1", -1.0, 0.0, 0.6, 0.8).on_net("B"));
        r2.add_pad(Pad::smd("2", 1.0, 0.0, 0.6, 0.8).on_net("C"));
        Board {
            nets: vec![
                Net { code: 0, name: String::new() },
                Net { code: 1, name: "A".into() },
                Net { code: 2, name: "B".into() },
                Net { code: 3, name: "C".into() },
            ],
            footprints: vec![r1, r2],
            ..Board::default()
        }
    }

    /// Writes a fixed result instead of routing.
    struct FixedRouter(RoutingResult);

    impl Autorouter for FixedRouter {
        async fn route(&self, input: &Path, output: &Path) -> BoardResult<()> {
            assert!(input.exists());
            fs::write(output, serde_json::to_string(&self.0).unwrap()).unwrap();
            Ok(())
        }
    }

    #[test]
    fn problem_lists_routable_nets() {
        let problem = RoutingProblem::from_board(&board(), &[]);
        assert_eq!(problem.nets, ["B"]);
        assert_eq!(problem.pads.len(), 4);
        assert_eq!(problem.pads[1].position, Point::from_mm(1.0, 0.0));
    }

    #[test]
    fn keep_connections_strip_other_pads() {
        let board = board();
        let keep = vec![("R1".to_string(), "2".to_string())];
        let problem = RoutingProblem::from_board(&board, &keep);
        let nets: Vec<&str> = problem.pads.iter().map(|p| p.net.as_str()).collect();
        assert_eq!(nets, ["", "B", "", ""]);
        assert!(problem.nets.is_empty());
        // Board untouched.
        assert_eq!(board.footprints[1].pads[0].net, "B");
    }

    #[test]
    fn rotated_pads_swap_size() {
        let mut board = board();
        board.footprints[0].orientation = 90.0;
        let problem = RoutingProblem::from_board(&board, &[]);
        assert_eq!(problem.pads[0].width, from_mm(0.8));
        assert_eq!(problem.pads[0].height, from_mm(0.6));
    }

    #[tokio::test]
    async fn result_imported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amp.json");
        let mut board = board();
        let router = FixedRouter(RoutingResult {
            tracks: vec![Track::new(
                Point::from_mm(1.0, 0.0),
                Point::from_mm(4.0, 0.0),
                from_mm(0.25),
                Layer::FrontCopper,
                "B",
            )],
            vias: Vec::new(),
        });

        let summary = route_board(&mut board, &path, &router, &[]).await.unwrap();
        assert_eq!(summary.tracks_added, 1);
        assert_eq!(summary.problem_path, dir.path().join("amp.routing.json"));
        assert_eq!(board.tracks.len(), 1);
    }

    #[tokio::test]
    async fn unknown_net_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = board();
        let router = FixedRouter(RoutingResult {
            tracks: vec![Track::new(Point::default(), Point::from_mm(1.0, 0.0), from_mm(0.2), Layer::FrontCopper, "ZZ")],
            vias: Vec::new(),
        });
        let err = route_board(&mut board, &dir.path().join("b.json"), &router, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation { .. }));
        assert!(board.tracks.is_empty());
    }

    #[test]
    fn placeholders_expanded() {
        let router = ProcessRouter::new(
            "router",
            vec!["-de".into(), "{input}".into(), "-do={output}".into()],
            Duration::from_secs(1),
        );
        let args = router.expand_args(Path::new("/a/in.json"), Path::new("/a/out.json"));
        assert_eq!(args, ["-de", "/a/in.json", "-do=/a/out.json"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_process_is_a_collaborator_error() {
        let router = ProcessRouter::new(
            "sh",
            vec!["-c".into(), "echo no route >&2; exit 3".into()],
            Duration::from_secs(10),
        );
        let err = router
            .route(Path::new("in.json"), Path::new("out.json"))
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Autorouter failed"), "{text}");
        assert!(text.contains("no route"), "{text}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let router = ProcessRouter::new(
            "sh",
            vec!["-c".into(), "sleep 5".into()],
            Duration::from_millis(100),
        );
        let err = router
            .route(Path::new("in.json"), Path::new("out.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn missing_program_is_a_collaborator_error() {
        let router = ProcessRouter::new("definitely-not-a-router-binary", Vec::new(), Duration::from_secs(1));
        let err = router
            .route(Path::new("in.json"), Path::new("out.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Collaborator { .. }));
    }
}
