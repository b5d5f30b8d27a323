//! Integration tests for MCP protocol handling.
//!
//! These tests verify the MCP server's JSON-RPC 2.0 protocol implementation,
//! including request/response handling, error responses, lifecycle management
//! and tool calls against real board files.

use std::path::{Path, PathBuf};

use pcb_layout_mcp::board::{Board, Drawing, Footprint, Graphic, Layer, Net, Pad, Point, Rect, Shape};
use pcb_layout_mcp::config::Config;
use pcb_layout_mcp::mcp::protocol::{parse_message, IncomingMessage, RequestId};
use pcb_layout_mcp::mcp::{McpServer, StdioTransport};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let IncomingMessage::Request(req) = parse_message(json).unwrap() else {
        panic!("Expected Request");
    };
    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, RequestId::Number(1));
}

#[test]
fn test_parse_tool_call_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": "call-7",
        "method": "tools/call",
        "params": { "name": "check_design_rule", "arguments": { "file_path": "board.json" } }
    }"#;

    let IncomingMessage::Request(req) = parse_message(json).unwrap() else {
        panic!("Expected Request");
    };
    assert_eq!(req.id, RequestId::String("call-7".to_string()));
    assert_eq!(req.params.unwrap()["name"], "check_design_rule");
}

#[test]
fn test_parse_notification() {
    let json = r#"{ "jsonrpc": "2.0", "method": "notifications/initialized" }"#;

    let IncomingMessage::Notification(notif) = parse_message(json).unwrap() else {
        panic!("Expected Notification");
    };
    assert_eq!(notif.method, "notifications/initialized");
}

#[test]
fn test_parse_invalid_json() {
    let err = parse_message("not valid json").unwrap_err();
    assert_eq!(err.error.code, -32700);
}

// =============================================================================
// Session Tests
// =============================================================================

fn write_board(dir: &Path) -> PathBuf {
    let mut u1 = Footprint::new("U1", 10.0, 10.0);
    u1.value = "TPS5430".into();
    u1.add_graphic(Graphic::courtyard(4.0, 4.0));
    u1.add_pad(Pad::smd("1", 1.5, 0.0, 0.6, 0.6).on_net("VIN"));
    u1.add_pad(Pad::smd("2", 0.0, 1.5, 0.6, 0.6).on_net("GND"));

    let mut c1 = Footprint::new("C1", 16.0, 10.0);
    c1.add_graphic(Graphic::courtyard(2.0, 1.0));
    c1.add_pad(Pad::smd("1", -0.5, 0.0, 0.5, 0.5).on_net("VIN"));
    c1.add_pad(Pad::smd("2", 0.5, 0.0, 0.5, 0.5).on_net("GND"));

    let board = Board {
        nets: vec![
            Net { code: 0, name: String::new() },
            Net { code: 1, name: "VIN".into() },
            Net { code: 2, name: "GND".into() },
        ],
        footprints: vec![u1, c1],
        drawings: vec![Drawing::Shape(Shape::rect(
            Layer::EdgeCuts,
            Rect::from_corners(Point::from_mm(0.0, 0.0), Point::from_mm(30.0, 20.0)),
            0,
        ))],
        ..Board::default()
    };
    let path = dir.join("session.json");
    board.save(&path, false).unwrap();
    path
}

fn request(id: i64, method: &str, params: &Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
}

fn tool_call(id: i64, name: &str, arguments: &Value) -> String {
    request(id, "tools/call", &json!({ "name": name, "arguments": arguments }))
}

/// Runs a server over in-memory pipes until input ends and returns every
/// line it wrote, parsed.
async fn run_session(config: Config, lines: &[String]) -> Vec<Value> {
    let mut input = lines.join("\n");
    input.push('\n');

    let (mut client, server_side) = tokio::io::duplex(1 << 20);
    let transport = StdioTransport::from_io(std::io::Cursor::new(input.into_bytes()), server_side);
    let mut server = McpServer::with_transport(config, transport);
    server.run().await.unwrap();
    drop(server);

    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn handshake() -> Vec<String> {
    vec![
        request(
            1,
            "initialize",
            &json!({ "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": { "name": "test" } }),
        ),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
    ]
}

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.allowed_paths = vec![dir.to_path_buf()];
    config
}

fn tool_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

fn is_error(response: &Value) -> bool {
    response["result"]["isError"].as_bool().unwrap_or(false)
}

#[tokio::test]
async fn test_requests_before_initialisation_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let responses = run_session(config_for(dir.path()), &[request(1, "tools/list", &json!({}))]).await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], -32600);
    assert_eq!(responses[0]["error"]["message"], "Server not initialised");
}

#[tokio::test]
async fn test_initialise_and_list_tools() {
    let dir = tempfile::tempdir().unwrap();
    let mut lines = handshake();
    lines.push(request(2, "tools/list", &json!({})));
    lines.push(request(3, "ping", &json!({})));
    lines.push(request(4, "resources/list", &json!({})));

    let responses = run_session(config_for(dir.path()), &lines).await;
    assert_eq!(responses.len(), 4);

    let init = &responses[0]["result"];
    assert_eq!(init["protocolVersion"], "2024-11-05");
    assert_eq!(init["serverInfo"]["name"], "pcb-layout-mcp");
    assert!(init["capabilities"]["tools"].is_object());

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 12);
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));

    assert_eq!(responses[2]["result"], json!({}));
    assert_eq!(responses[3]["error"]["code"], -32601);
}

#[tokio::test]
async fn test_second_initialise_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut lines = handshake();
    lines.push(handshake().remove(0));

    let responses = run_session(config_for(dir.path()), &lines).await;
    assert_eq!(responses[1]["error"]["message"], "Server already initialised");
}

#[tokio::test]
async fn test_inspection_and_check_tools() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_board(dir.path());
    let file = json!({ "file_path": path });

    let mut lines = handshake();
    lines.push(tool_call(2, "get_pcb_info", &file));
    lines.push(tool_call(3, "check_design_rule", &file));
    lines.push(tool_call(4, "check_power_density", &file));
    lines.push(tool_call(
        5,
        "analyze_connectivity",
        &json!({ "file_path": path, "module_ref": "U1" }),
    ));
    lines.push(tool_call(
        6,
        "evaluate_placement",
        &json!({ "file_path": path, "module_ref": "C1" }),
    ));

    let responses = run_session(config_for(dir.path()), &lines).await;
    assert_eq!(responses.len(), 6);
    for response in &responses[1..] {
        assert!(!is_error(response), "{response}");
    }

    assert!(tool_text(&responses[1]).contains("U1"));
    assert!(tool_text(&responses[2]).starts_with("Design Rule Check (DRC) passed!"));
    assert!(tool_text(&responses[3]).contains('%'));
    assert!(tool_text(&responses[4]).starts_with("Connectivity of U1:"));
    assert!(tool_text(&responses[5]).contains("Angle 270 degrees"));

    // The sweep restores the orientation, so the file is unchanged.
    let board = Board::load(&path).unwrap();
    assert!(board.footprint("C1").unwrap().orientation.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_editing_tools_save_the_board() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_board(dir.path());

    let mut lines = handshake();
    lines.push(tool_call(
        2,
        "adjust_module",
        &json!({ "file_path": path, "module_ref": "C1", "pos_x": 13.0, "angle": 90 }),
    ));
    lines.push(tool_call(
        3,
        "adjust_net_track",
        &json!({
            "file_path": path, "net": "VIN",
            "start_x": [11.5], "start_y": [10.0], "end_x": [13.0], "end_y": [9.5], "width": [0.3]
        }),
    ));
    lines.push(tool_call(4, "set_board", &json!({ "file_path": path })));
    lines.push(tool_call(5, "check_design_rule", &json!({ "file_path": path })));

    let responses = run_session(config_for(dir.path()), &lines).await;
    for response in &responses[1..4] {
        assert!(!is_error(response), "{response}");
    }

    let moved: Value = serde_json::from_str(tool_text(&responses[1])).unwrap();
    assert_eq!(moved["status"], "success");
    assert_eq!(moved["position_mm"], json!([13.0, 10.0]));

    let tracks: Value = serde_json::from_str(tool_text(&responses[2])).unwrap();
    assert_eq!(tracks["added"], 1);

    let fitted: Value = serde_json::from_str(tool_text(&responses[3])).unwrap();
    assert_eq!(fitted["ground_zone"]["net"], "GND");

    // C1 rotated upright now sits 0.5 mm from U1's courtyard.
    let drc = tool_text(&responses[4]);
    assert!(drc.starts_with("Design Rule Check (DRC) passed!"), "{drc}");

    let board = Board::load(&path).unwrap();
    assert_eq!(board.footprint("C1").unwrap().position, Point::from_mm(13.0, 10.0));
    assert_eq!(board.tracks.len(), 1);
    assert_eq!(board.zones.len(), 1);
}

#[tokio::test]
async fn test_tool_failures_are_tool_errors() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let path = write_board(dir.path());
    let stray = write_board(outside.path());

    let mut lines = handshake();
    lines.push(tool_call(2, "get_pcb_info", &json!({ "file_path": dir.path().join("missing.json") })));
    lines.push(tool_call(3, "get_pcb_info", &json!({ "file_path": stray })));
    lines.push(tool_call(
        4,
        "adjust_module",
        &json!({ "file_path": path, "module_ref": "Q7", "pos_x": 1.0 }),
    ));
    lines.push(tool_call(5, "no_such_tool", &json!({})));

    let responses = run_session(config_for(dir.path()), &lines).await;
    assert_eq!(responses.len(), 5);
    for response in &responses[1..] {
        assert!(is_error(response), "{response}");
    }
    assert!(tool_text(&responses[1]).starts_with("Error: Failed to read file"));
    assert_eq!(
        tool_text(&responses[2]),
        "Access denied: path is outside the configured allowed directories"
    );
    assert_eq!(tool_text(&responses[3]), "Error: Footprint not found: Q7");
    assert_eq!(tool_text(&responses[4]), "Unknown tool: no_such_tool");
}

#[tokio::test]
async fn test_malformed_lines_answered_with_errors() {
    let dir = tempfile::tempdir().unwrap();
    let lines = vec![
        "{ broken".to_string(),
        String::new(),
        json!({ "jsonrpc": "1.0", "id": 9, "method": "ping" }).to_string(),
    ];

    let responses = run_session(config_for(dir.path()), &lines).await;
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["error"]["code"], -32600);
}
