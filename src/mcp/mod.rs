//! Model Context Protocol (MCP) server implementation.
//!
//! Exposes board inspection, placement checks and layout edits as MCP tools.
//! The server talks JSON-RPC 2.0 over stdio, one message per line.
//!
//! # Architecture
//!
//! ```text
//!  stdin ──▶ StdioTransport ──▶ McpServer ──▶ tool handler
//!                                  │             │
//!                                  │             ├─▶ board (load / edit / save)
//!                                  │             ├─▶ placement (DRC, density, evaluation)
//!                                  │             ├─▶ export (SVG)
//!                                  │             └─▶ routing / datasheet (collaborators)
//!  stdout ◀── StdioTransport ◀─────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::StdioTransport;
