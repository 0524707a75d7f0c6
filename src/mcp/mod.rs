//! MCP (Model Context Protocol) server for coursegen.
//!
//! Exposes the six content operations as tools to AI assistants.
//! Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
