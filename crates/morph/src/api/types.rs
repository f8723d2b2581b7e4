//! API request and response types.

use crate::core::dispatch::Dispatcher;
use crate::core::registry::Category;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Fixed identity returned by the validation endpoint. The literal value
/// and the unconditional acceptance of any non-empty token are a
/// compatibility contract with the calling agent platform, not a design
/// choice to improve.
pub const VALIDATION_PHONE_NUMBER: &str = "919876543210";

/// MCP protocol version advertised by the HTTP endpoint.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// API server state shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The conversion dispatcher; immutable, safe for concurrent use.
    pub dispatcher: Arc<Dispatcher>,
}

/// API server size limit configuration.
///
/// Applied at the router layer; requests exceeding the limit are rejected
/// with HTTP 413 before reaching any handler. Defaults to 100 MB,
/// configurable via `MORPH_MAX_REQUEST_BODY_BYTES` or
/// `MORPH_MAX_UPLOAD_SIZE_MB`.
#[derive(Debug, Clone, Copy)]
pub struct ApiSizeLimits {
    /// Maximum size of the entire request body in bytes.
    pub max_request_body_bytes: usize,
}

impl Default for ApiSizeLimits {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ApiSizeLimits {
    pub fn new(max_request_body_bytes: usize) -> Self {
        Self { max_request_body_bytes }
    }

    pub fn from_mb(max_request_body_mb: usize) -> Self {
        Self {
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
        }
    }
}

/// Server identity response for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerIdentityResponse {
    pub name: String,
    pub version: String,
}

/// Response for `GET /formats`.
pub type FormatsResponse = IndexMap<Category, Vec<&'static str>>;

/// Error response body shared by all REST endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error taxonomy kind token.
    pub error_kind: String,
    /// Human-readable message; never an internal stack trace.
    pub message: String,
}

/// Request body for `POST /mcp/validate`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

/// Response body for `POST /mcp/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub phone_number: String,
}

/// JSON-RPC error codes used by the `/mcp` endpoint.
pub const RPC_METHOD_NOT_FOUND: i32 = -32601;
pub const RPC_INVALID_PARAMS: i32 = -32602;
pub const RPC_INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 request envelope for `POST /mcp`.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// Echoed back verbatim; any JSON value is accepted.
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Arguments of the `convert_file` tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertFileArgs {
    pub input_format: String,
    pub output_format: String,
    /// Base64-encoded file content.
    pub file_content: String,
}

/// Result of the `convert_file` tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertFileResult {
    /// Base64-encoded converted bytes.
    pub file_content: String,
    pub output_format: String,
}
