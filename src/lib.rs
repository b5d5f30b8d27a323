//! pcb-layout-mcp: MCP server for AI-assisted PCB layout
//!
//! This library loads PCB layouts, checks component placement and applies
//! layout edits on behalf of an AI assistant connected over MCP.
//!
//! # Architecture
//!
//! The server provides measurements and mechanical edits. The AI decides
//! where things go:
//!
//! - **Inspection**: board summary, module/net/track/via listings, SVG images
//! - **Placement checks**: on-board and clearance DRC, power density,
//!   orientation evaluation and pad connectivity analysis
//! - **Edits**: board outline, ground zone, module moves, net tracks and
//!   functional area labels
//! - **Collaborators**: an external autorouter and IC datasheet lookup
//!
//! # Modules
//!
//! - [`board`]: Board document model, geometry and edits
//! - [`placement`]: Placement validation
//! - [`export`]: Image export
//! - [`routing`]: External autorouter bridge
//! - [`datasheet`]: IC datasheet lookup
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Configuration error types
//! - [`mcp`]: MCP protocol implementation

pub mod board;
pub mod config;
pub mod datasheet;
pub mod error;
pub mod export;
pub mod mcp;
pub mod placement;
pub mod routing;
