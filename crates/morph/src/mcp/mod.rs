//! Model Context Protocol (MCP) server implementation.
//!
//! Provides an MCP server over stdio that exposes morph's file conversion
//! capabilities as MCP tools for integration with AI assistants.
//!
//! # Tools
//!
//! - **convert_file**: Convert base64-encoded content between two formats
//!   of the same media category
//! - **list_supported_formats**: List supported formats grouped by category
//!
//! # Example
//!
//! ```rust,no_run
//! use morph::mcp::start_mcp_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     start_mcp_server().await.map_err(|e| anyhow::anyhow!(e))?;
//!     Ok(())
//! }
//! ```

mod server;

pub use server::{start_mcp_server, start_mcp_server_with_config};

pub use server::{ConvertFileParams, MorphMcp};

// Re-export for testing
#[doc(hidden)]
pub use server::map_morph_error_to_mcp;
