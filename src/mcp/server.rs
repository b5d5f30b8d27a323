//! MCP server for PCB layout inspection, placement checking and editing.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and other requests
//! 3. **Shutdown**: Graceful connection termination
//!
//! # Tools
//!
//! Every tool takes a `file_path` to a board document inside the configured
//! allowed directories. Inspection and check tools return text reports;
//! editing tools save the board and return a JSON status object. Failures
//! are reported as tool results with `isError: true`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::board::edit::{self, TrackLists};
use crate::board::fill::OutlineFiller;
use crate::board::info;
use crate::board::{Board, BoardError, Layer};
use crate::config::Config;
use crate::datasheet::DatasheetClient;
use crate::export::{self, SvgPlotter};
use crate::mcp::protocol::{
    ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::transport::StdioTransport;
use crate::placement::{self, density};
use crate::routing::{self, ProcessRouter};

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // skip_serializing_if passes &T
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: Some(description.to_string()),
            input_schema,
        }
    }
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates a successful result holding pretty-printed JSON.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        Self::text(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()))
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

impl From<BoardError> for ToolCallResult {
    fn from(e: BoardError) -> Self {
        let mut message = format!("Error: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            let _ = write!(message, ": {cause}");
            source = std::error::Error::source(cause);
        }
        Self::error(message)
    }
}

/// Handler outcome; the error side is already a tool result.
type ToolOutcome = Result<ToolCallResult, ToolCallResult>;

fn required_str<'a>(arguments: &'a Value, name: &str) -> Result<&'a str, ToolCallResult> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolCallResult::error(format!("Missing required parameter: {name}")))
}

fn optional_f64(arguments: &Value, name: &str) -> Result<Option<f64>, ToolCallResult> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| ToolCallResult::error(format!("Parameter {name} must be a number"))),
    }
}

fn required_f64(arguments: &Value, name: &str) -> Result<f64, ToolCallResult> {
    optional_f64(arguments, name)?
        .ok_or_else(|| ToolCallResult::error(format!("Missing required parameter: {name}")))
}

fn f64_list(arguments: &Value, name: &str) -> Result<Vec<f64>, ToolCallResult> {
    let items = arguments
        .get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| ToolCallResult::error(format!("Missing required parameter: {name}")))?;
    items
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                ToolCallResult::error(format!("Parameter {name} must be a list of numbers"))
            })
        })
        .collect()
}

fn pad_number(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn keep_connections(arguments: &Value) -> Result<Vec<(String, String)>, ToolCallResult> {
    let Some(items) = arguments.get("keep_connections") else {
        return Ok(Vec::new());
    };
    let invalid = || {
        ToolCallResult::error(
            "Parameter keep_connections must be a list of {\"reference\", \"pad\"} objects",
        )
    };
    items
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| {
            let reference = item.get("reference").and_then(Value::as_str);
            let pad = item.get("pad").and_then(pad_number);
            match (reference, pad) {
                (Some(r), Some(p)) => Ok((r.to_string(), p)),
                _ => Err(invalid()),
            }
        })
        .collect()
}

fn mm_pair(value: (f64, f64)) -> Value {
    json!([round2(value.0), round2(value.1)])
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The MCP server for PCB layout work.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// The transport layer.
    transport: StdioTransport,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Validated configuration.
    config: Config,
}

impl McpServer {
    /// Creates a server speaking over stdio.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, StdioTransport::new())
    }

    /// Creates a server over the given transport.
    ///
    /// An empty `allowed_paths` list allows the current directory only.
    #[must_use]
    pub fn with_transport(mut config: Config, transport: StdioTransport) -> Self {
        if config.allowed_paths.is_empty() {
            config.allowed_paths.push(PathBuf::from("."));
        }
        Self {
            state: ServerState::AwaitingInit,
            transport,
            protocol_version: None,
            config,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Validates that a path is within one of the allowed paths.
    fn validate_path(&self, filepath: &str) -> Result<PathBuf, ToolCallResult> {
        let path = Path::new(filepath);

        // Files that don't exist yet are resolved through their parent.
        let canonical_path = if path.exists() {
            path.canonicalize().map_err(|e| {
                ToolCallResult::error(format!("Failed to resolve path '{}': {e}", path.display()))
            })?
        } else {
            let parent = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let filename = path.file_name().ok_or_else(|| {
                ToolCallResult::error(format!(
                    "Invalid path '{}': no filename specified",
                    path.display()
                ))
            })?;
            let canonical_parent = parent.canonicalize().map_err(|e| {
                ToolCallResult::error(format!(
                    "Parent directory '{}' does not exist or is inaccessible: {e}",
                    parent.display()
                ))
            })?;
            canonical_parent.join(filename)
        };

        let allowed = self.config.allowed_paths.iter().any(|allowed| {
            allowed
                .canonicalize()
                .is_ok_and(|root| canonical_path.starts_with(root))
        });
        if allowed {
            Ok(canonical_path)
        } else {
            // Don't echo the resolved path back to the client.
            Err(ToolCallResult::error(
                "Access denied: path is outside the configured allowed directories",
            ))
        }
    }

    /// Validates `file_path` and loads the board it names.
    fn open_board(&self, arguments: &Value) -> Result<(PathBuf, Board), ToolCallResult> {
        let filepath = required_str(arguments, "file_path")?;
        let path = self.validate_path(filepath)?;
        let board = Board::load(&path)?;
        Ok((path, board))
    }

    fn save_board(&self, board: &Board, path: &Path) -> Result<(), ToolCallResult> {
        board.save(path, self.config.board.backup_on_save)?;
        Ok(())
    }

    /// Clearance from the `min_clearance` argument or the configuration.
    fn min_clearance(&self, arguments: &Value) -> Result<f64, ToolCallResult> {
        match optional_f64(arguments, "min_clearance")? {
            Some(value) if !value.is_finite() || value < 0.0 => Err(ToolCallResult::error(
                "Parameter min_clearance must be a non-negative number",
            )),
            Some(value) if value > edit::MAX_COORDINATE_MM => Err(ToolCallResult::error(format!(
                "Parameter min_clearance must not exceed {} mm",
                edit::MAX_COORDINATE_MM
            ))),
            Some(value) => Ok(value),
            None => Ok(self.config.checks.min_clearance_mm),
        }
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("Input closed");
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        match crate::mcp::protocol::parse_message(&line) {
            Ok(IncomingMessage::Request(req)) => self.handle_request(req).await?,
            Ok(IncomingMessage::Notification(ref notif)) => self.handle_notification(notif),
            Err(error) => self.transport.send(&error).await?,
        }

        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> std::io::Result<()> {
        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "ping" => Ok(Self::handle_ping(&req)),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        match response {
            Ok(resp) => self.transport.send(&resp).await,
            Err(error) => self.transport.send(&error).await,
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
            tracing::info!(version = ?self.protocol_version, "Session initialised");
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let params: InitializeParams = req.parse_params("initialize")?;
        tracing::debug!(
            requested = %params.protocol_version,
            client = ?params.client_info.as_ref().map(|c| &c.name),
            "Initialize request"
        );

        let negotiated_version = MCP_PROTOCOL_VERSION.to_string();
        self.protocol_version = Some(negotiated_version.clone());
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": negotiated_version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;
        let result = json!({ "tools": Self::get_tool_definitions() });
        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = req.parse_params("tool call")?;
        tracing::info!(tool = %params.name, "Tool call");

        let args = &params.arguments;
        let outcome = match params.name.as_str() {
            // Inspection
            "get_pcb_info" => self.call_get_pcb_info(args),
            "get_pcb_image" => self.call_get_pcb_image(args),
            // Editing
            "set_board" => self.call_set_board(args),
            "adjust_module" => self.call_adjust_module(args),
            "adjust_net_track" => self.call_adjust_net_track(args),
            "label_area" => self.call_label_area(args),
            // Checks
            "check_power_density" => self.call_check_power_density(args),
            "check_design_rule" => self.call_check_design_rule(args),
            "evaluate_placement" => self.call_evaluate_placement(args),
            "analyze_connectivity" => self.call_analyze_connectivity(args),
            // Collaborators
            "route_board" => self.call_route_board(args).await,
            "get_datasheet_info" => self.call_get_datasheet_info(args).await,
            _ => Err(ToolCallResult::error(format!("Unknown tool: {}", params.name))),
        };
        let result = outcome.unwrap_or_else(|failure| failure);
        if result.is_error {
            tracing::warn!(tool = %params.name, "Tool call failed");
        }

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            ));
        }
        Ok(())
    }

    /// Returns the list of available tools.
    #[allow(clippy::too_many_lines)]
    fn get_tool_definitions() -> Vec<ToolDefinition> {
        let file_path = json!({
            "type": "string",
            "description": "Path to the board document (.json)"
        });
        let module_ref = json!({
            "type": "string",
            "description": "Reference of the module, e.g. \"U1\""
        });
        let min_clearance = json!({
            "type": "number",
            "description": "Optional: minimum clearance between module courtyards in mm (default from configuration, 0.2 mm)"
        });
        let coordinate_list = |what: &str| {
            json!({
                "type": "array",
                "items": { "type": "number" },
                "description": what
            })
        };

        vec![
            // === Inspection ===
            ToolDefinition::new(
                "get_pcb_info",
                "Analyze basic information of the board, its modules, nets, tracks and vias. \
                 All positions and sizes are in millimetres.",
                json!({
                    "type": "object",
                    "properties": { "file_path": file_path },
                    "required": ["file_path"]
                }),
            ),
            ToolDefinition::new(
                "get_pcb_image",
                "Export an SVG image of the board, cropped to its bounding box. The image is \
                 written next to the board file as <name>_<width>x<height>.svg.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "layers": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Optional: layers to plot, e.g. [\"F.Cu\", \"Edge.Cuts\"] (default from configuration)"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            // === Editing ===
            ToolDefinition::new(
                "set_board",
                "Fit the board outline (Edge.Cuts) to the current effective area and add a \
                 GND copper zone on B.Cu covering the board.",
                json!({
                    "type": "object",
                    "properties": { "file_path": file_path },
                    "required": ["file_path"]
                }),
            ),
            ToolDefinition::new(
                "adjust_module",
                "Adjust the position and angle of a module. Omitted values keep their current \
                 setting.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "module_ref": module_ref,
                        "pos_x": { "type": "number", "description": "Optional: new X position in mm" },
                        "pos_y": { "type": "number", "description": "Optional: new Y position in mm" },
                        "angle": { "type": "number", "description": "Optional: new angle in degrees" }
                    },
                    "required": ["file_path", "module_ref"]
                }),
            ),
            ToolDefinition::new(
                "adjust_net_track",
                "Replace the tracks of a net. Existing tracks of the net are deleted and one \
                 F.Cu track is added per list entry; all lists must have the same length.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "net": { "type": "string", "description": "Net name" },
                        "start_x": coordinate_list("Track start X coordinates in mm"),
                        "start_y": coordinate_list("Track start Y coordinates in mm"),
                        "end_x": coordinate_list("Track end X coordinates in mm"),
                        "end_y": coordinate_list("Track end Y coordinates in mm"),
                        "width": coordinate_list("Track widths in mm")
                    },
                    "required": ["file_path", "net", "start_x", "start_y", "end_x", "end_y", "width"]
                }),
            ),
            ToolDefinition::new(
                "label_area",
                "Label a rectangular area by its function on the user layer configured for \
                 that function. Existing shapes on that layer are replaced.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "func": { "type": "string", "description": "Function of the area, e.g. \"power\"" },
                        "center_x": { "type": "number", "description": "Centre X in mm" },
                        "center_y": { "type": "number", "description": "Centre Y in mm" },
                        "size_x": { "type": "number", "description": "Width in mm" },
                        "size_y": { "type": "number", "description": "Height in mm" }
                    },
                    "required": ["file_path", "func", "center_x", "center_y", "size_x", "size_y"]
                }),
            ),
            // === Checks ===
            ToolDefinition::new(
                "check_power_density",
                "Check the power density of the board by calculating the footprint area ratio \
                 and the effective area ratio.",
                json!({
                    "type": "object",
                    "properties": { "file_path": file_path },
                    "required": ["file_path"]
                }),
            ),
            ToolDefinition::new(
                "check_design_rule",
                "Run a design rule check: modules outside the board outline and module \
                 courtyards closer than the minimum clearance.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "min_clearance": min_clearance
                    },
                    "required": ["file_path"]
                }),
            ),
            ToolDefinition::new(
                "evaluate_placement",
                "Try a module at 0, 90, 180 and 270 degrees and rank the orientations by \
                 board-bounds, clearance, alignment and crossing-connection problems.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "module_ref": module_ref,
                        "min_clearance": min_clearance
                    },
                    "required": ["file_path", "module_ref"]
                }),
            ),
            ToolDefinition::new(
                "analyze_connectivity",
                "List the pad-to-pad connections between a module and the unlocked modules it \
                 shares nets with (GND excluded), with distances, misaligned pads and crossing \
                 connections.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "module_ref": module_ref
                    },
                    "required": ["file_path", "module_ref"]
                }),
            ),
            // === Collaborators ===
            ToolDefinition::new(
                "route_board",
                "Route the board with the configured external autorouter and import the \
                 resulting tracks and vias.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": file_path,
                        "keep_connections": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "reference": { "type": "string" },
                                    "pad": { "type": "string" }
                                },
                                "required": ["reference", "pad"]
                            },
                            "description": "Optional: only these pads keep their nets for routing"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            ToolDefinition::new(
                "get_datasheet_info",
                "Fetch description, pin and layout guideline sections from the datasheets of \
                 the ICs (references starting with U) on the board.",
                json!({
                    "type": "object",
                    "properties": { "file_path": file_path },
                    "required": ["file_path"]
                }),
            ),
        ]
    }

    // ==================== Inspection ====================

    fn call_get_pcb_info(&self, arguments: &Value) -> ToolOutcome {
        let (_, board) = self.open_board(arguments)?;
        let report = info::full_report(&board, self.config.checks.rotation_mode)?;
        Ok(ToolCallResult::text(report))
    }

    fn call_get_pcb_image(&self, arguments: &Value) -> ToolOutcome {
        let (path, board) = self.open_board(arguments)?;

        let layers = match arguments.get("layers").and_then(Value::as_array) {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|name| {
                    name.as_str().and_then(Layer::from_name).ok_or_else(|| {
                        ToolCallResult::error(format!("Unknown layer: {name}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => self.config.export.layers.clone(),
        };

        let export = export::export_image(&board, &path, &layers, &SvgPlotter)?;
        Ok(ToolCallResult::json(&json!({
            "status": "success",
            "file_path": path.display().to_string(),
            "image_path": export.path.display().to_string(),
            "size_mm": mm_pair(export.size_mm),
            "layers": layers.iter().map(Layer::as_str).collect::<Vec<_>>(),
        })))
    }

    // ==================== Editing ====================

    fn call_set_board(&self, arguments: &Value) -> ToolOutcome {
        let (path, mut board) = self.open_board(arguments)?;

        let outline = edit::fit_board_outline(&mut board)?;
        let zone = edit::add_ground_zone(&mut board, &OutlineFiller)?;
        self.save_board(&board, &path)?;

        Ok(ToolCallResult::json(&json!({
            "status": "success",
            "file_path": path.display().to_string(),
            "outline": {
                "center_mm": mm_pair(outline.center().to_mm()),
                "size_mm": mm_pair(outline.size_mm()),
            },
            "ground_zone": {
                "layer": Layer::BackCopper.as_str(),
                "net": zone.net,
                "size_mm": mm_pair(zone.area.size_mm()),
            },
        })))
    }

    fn call_adjust_module(&self, arguments: &Value) -> ToolOutcome {
        let reference = required_str(arguments, "module_ref")?;
        let x = optional_f64(arguments, "pos_x")?;
        let y = optional_f64(arguments, "pos_y")?;
        let angle = optional_f64(arguments, "angle")?;
        let (path, mut board) = self.open_board(arguments)?;

        let (position, orientation) = edit::move_footprint(&mut board, reference, x, y, angle)?;
        self.save_board(&board, &path)?;

        Ok(ToolCallResult::json(&json!({
            "status": "success",
            "module_ref": reference,
            "position_mm": mm_pair(position.to_mm()),
            "angle": orientation,
        })))
    }

    fn call_adjust_net_track(&self, arguments: &Value) -> ToolOutcome {
        let net = required_str(arguments, "net")?;
        let start_x = f64_list(arguments, "start_x")?;
        let start_y = f64_list(arguments, "start_y")?;
        let end_x = f64_list(arguments, "end_x")?;
        let end_y = f64_list(arguments, "end_y")?;
        let width = f64_list(arguments, "width")?;
        let (path, mut board) = self.open_board(arguments)?;

        let lists = TrackLists {
            start_x: &start_x,
            start_y: &start_y,
            end_x: &end_x,
            end_y: &end_y,
            width: &width,
        };
        let replacement = edit::replace_net_tracks(&mut board, net, &lists)?;
        self.save_board(&board, &path)?;

        Ok(ToolCallResult::json(&json!({
            "status": "success",
            "net": net,
            "removed": replacement.removed,
            "added": replacement.added,
        })))
    }

    fn call_label_area(&self, arguments: &Value) -> ToolOutcome {
        let function = required_str(arguments, "func")?;
        let center = (
            required_f64(arguments, "center_x")?,
            required_f64(arguments, "center_y")?,
        );
        let size = (
            required_f64(arguments, "size_x")?,
            required_f64(arguments, "size_y")?,
        );
        let (path, mut board) = self.open_board(arguments)?;

        let labels = &self.config.labels;
        let layer = edit::label_layer(function, &labels.layers, labels.default_layer);
        let rect = edit::label_area(&mut board, layer, center, size)?;
        self.save_board(&board, &path)?;

        Ok(ToolCallResult::json(&json!({
            "status": "success",
            "func": function,
            "layer": layer.as_str(),
            "center_mm": mm_pair(rect.center().to_mm()),
            "size_mm": mm_pair(rect.size_mm()),
        })))
    }

    // ==================== Checks ====================

    fn call_check_power_density(&self, arguments: &Value) -> ToolOutcome {
        let (_, board) = self.open_board(arguments)?;
        let report = density::compute(
            &board,
            &self.config.density,
            self.config.checks.rotation_mode,
        )?;
        Ok(ToolCallResult::text(report.to_string()))
    }

    fn call_check_design_rule(&self, arguments: &Value) -> ToolOutcome {
        let min_clearance = self.min_clearance(arguments)?;
        let (_, board) = self.open_board(arguments)?;
        let report = placement::run_drc(&board, min_clearance, self.config.checks.rotation_mode);
        Ok(ToolCallResult::text(report.to_string()))
    }

    fn call_evaluate_placement(&self, arguments: &Value) -> ToolOutcome {
        let reference = required_str(arguments, "module_ref")?;
        let mut options = self.config.checks.placement_options();
        options.min_clearance_mm = self.min_clearance(arguments)?;
        let (path, mut board) = self.open_board(arguments)?;

        let report = placement::evaluate(&mut board, reference, &options)?;
        if !report.restored {
            self.save_board(&board, &path)?;
        }
        Ok(ToolCallResult::text(report.to_string()))
    }

    fn call_analyze_connectivity(&self, arguments: &Value) -> ToolOutcome {
        let reference = required_str(arguments, "module_ref")?;
        let (_, board) = self.open_board(arguments)?;
        let analysis = placement::analyze(&board, reference)?;
        Ok(ToolCallResult::text(analysis.to_string()))
    }

    // ==================== Collaborators ====================

    async fn call_route_board(&self, arguments: &Value) -> ToolOutcome {
        let keep = keep_connections(arguments)?;
        let (path, mut board) = self.open_board(arguments)?;

        let settings = &self.config.router;
        let router = ProcessRouter::new(&settings.command, settings.args.clone(), settings.timeout());
        let summary = routing::route_board(&mut board, &path, &router, &keep).await?;
        self.save_board(&board, &path)?;

        Ok(ToolCallResult::json(&json!({
            "status": "success",
            "tracks_added": summary.tracks_added,
            "vias_added": summary.vias_added,
            "problem_file": summary.problem_path.display().to_string(),
            "result_file": summary.result_path.display().to_string(),
        })))
    }

    async fn call_get_datasheet_info(&self, arguments: &Value) -> ToolOutcome {
        let (_, board) = self.open_board(arguments)?;
        let client = DatasheetClient::new(&self.config.datasheet)?;

        let results = client.lookup(&board).await;
        if results.is_empty() {
            return Ok(ToolCallResult::text(
                "No modules with reference starting with 'U' found",
            ));
        }
        let value = serde_json::to_value(&results)
            .map_err(|source| BoardError::Serialise { source })?;
        Ok(ToolCallResult::json(&value))
    }
}
