//! The agent-facing tool surface: tool registry and MCP stdio server.
//!
//! The core stays protocol-agnostic; this module is the thin registration
//! layer that exposes the operation set to agent hosts over JSON-RPC.

pub mod protocol;
mod server;
mod tools;

pub use server::McpServer;
pub use tools::{ToolDefinition, ToolRegistry};
