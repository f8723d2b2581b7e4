//! REST and MCP-over-HTTP server for morph.
//!
//! Axum-based HTTP server exposing file conversion plus the JSON-RPC MCP
//! endpoint used by agent platforms.
//!
//! # Endpoints
//!
//! - `GET /` - server identity
//! - `GET /formats` - supported formats by category
//! - `POST /convert` - convert an uploaded file (multipart form data)
//! - `POST /mcp` - MCP tool calls (JSON-RPC 2.0)
//! - `POST /mcp/validate` - demo token validation stub
//!
//! # Examples
//!
//! ```no_run
//! use morph::api::serve;
//!
//! #[tokio::main]
//! async fn main() -> morph::Result<()> {
//!     serve("127.0.0.1", 8000).await?;
//!     Ok(())
//! }
//! ```
//!
//! # cURL examples
//!
//! ```bash
//! # Convert an image
//! curl -F "file=@photo.png" -F "output_format=jpg" -o photo.jpg \
//!      http://localhost:8000/convert
//!
//! # Supported formats
//! curl http://localhost:8000/formats
//!
//! # MCP tool call
//! curl -X POST http://localhost:8000/mcp \
//!      -H 'Content-Type: application/json' \
//!      -d '{"jsonrpc":"2.0","id":"1","method":"tools/list"}'
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{
    create_router, create_router_with_dispatcher, create_router_with_limits, serve, serve_with_config,
    serve_with_config_and_limits,
};
pub use types::{
    ApiSizeLimits, ApiState, ConvertFileArgs, ConvertFileResult, ErrorResponse, FormatsResponse, RpcError, RpcRequest,
    RpcResponse, ServerIdentityResponse, ValidateRequest, ValidateResponse, MCP_PROTOCOL_VERSION,
    VALIDATION_PHONE_NUMBER,
};
