//! MCP server implementation for morph.
//!
//! Exposes file conversion as tools for AI assistants via the Model
//! Context Protocol over stdio transport.

use base64::prelude::*;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde_json::json;
use std::sync::Arc;

use crate::core::config::ServiceConfig;
use crate::core::dispatch::{ConversionRequest, Dispatcher};
use crate::core::registry;
use crate::error::{ErrorKind, MorphError};

/// Request parameters for file conversion.
#[derive(Debug, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct ConvertFileParams {
    /// Input file format (e.g. png, pdf, mp3)
    pub input_format: String,
    /// Output file format (e.g. jpg, docx, wav)
    pub output_format: String,
    /// Base64-encoded file content
    pub file_content: String,
}

/// Map morph errors to MCP error responses with appropriate error codes.
///
/// Rejected requests (unknown formats, cross-category pairs, oversized or
/// malformed payloads) map to `INVALID_PARAMS` (-32602); conversion tool
/// failures map to `INTERNAL_ERROR` (-32603). The taxonomy message is
/// preserved verbatim.
#[doc(hidden)]
pub fn map_morph_error_to_mcp(error: MorphError) -> McpError {
    match error.kind() {
        ErrorKind::ConversionFailed => McpError::internal_error(error.to_string(), None),
        _ => McpError::invalid_params(error.to_string(), None),
    }
}

/// Morph MCP server.
///
/// Provides file conversion capabilities via MCP tools. The server loads
/// its service configuration from morph.toml via discovery.
#[derive(Clone)]
pub struct MorphMcp {
    tool_router: ToolRouter<MorphMcp>,
    /// Conversion dispatcher shared across tool calls.
    dispatcher: Arc<Dispatcher>,
}

#[tool_router]
impl MorphMcp {
    /// Create a new morph MCP server instance with discovered config.
    ///
    /// Uses `ServiceConfig::discover()` to search for morph.toml in current
    /// and parent directories. Falls back to default configuration if no
    /// config file is found.
    pub fn new() -> crate::Result<Self> {
        let config = match ServiceConfig::discover()? {
            Some(config) => {
                tracing::info!("Loaded service config from discovered file");
                config
            }
            None => {
                tracing::info!("No config file found, using default configuration");
                ServiceConfig::default()
            }
        };

        Ok(Self::with_config(config))
    }

    /// Create a new morph MCP server instance with explicit config.
    pub fn with_config(config: ServiceConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            dispatcher: Arc::new(Dispatcher::new(config)),
        }
    }

    /// Convert a file between two formats of the same media category.
    #[tool(
        description = "Convert a file between formats within the same media category (image, document, audio, video). Takes and returns base64-encoded content. Use list_supported_formats for the valid formats."
    )]
    async fn convert_file(&self, Parameters(params): Parameters<ConvertFileParams>) -> Result<CallToolResult, McpError> {
        let payload = BASE64_STANDARD
            .decode(&params.file_content)
            .map_err(|e| McpError::invalid_params(format!("Invalid base64: {}", e), None))?;

        let request = ConversionRequest::new(payload, &params.input_format, &params.output_format);
        let conversion = self.dispatcher.convert(request).await.map_err(map_morph_error_to_mcp)?;

        let response = json!({
            "file_content": BASE64_STANDARD.encode(&conversion.bytes),
            "output_format": conversion.output_format,
        });

        Ok(CallToolResult::success(vec![Content::text(response.to_string())]))
    }

    /// List all supported formats grouped by media category.
    #[tool(description = "List all supported formats grouped by media category (image, document, audio, video).")]
    fn list_supported_formats(&self, Parameters(_): Parameters<()>) -> Result<CallToolResult, McpError> {
        let formats = serde_json::to_value(registry::list_formats())
            .map_err(|e| McpError::internal_error(format!("Failed to serialize format list: {}", e), None))?;

        Ok(CallToolResult::success(vec![Content::text(formats.to_string())]))
    }
}

#[tool_handler]
impl ServerHandler for MorphMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "morph-mcp".to_string(),
                title: Some("Morph File Conversion MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Convert files between formats within the same media category. Supports images \
                 (png, jpg, webp, bmp, gif, tiff), documents (pdf, docx, txt), audio (mp3, wav, \
                 ogg, flac, aac), and video (mp4, mkv, avi, mov, webm). File content is \
                 base64-encoded in both directions."
                    .to_string(),
            ),
        }
    }
}

impl Default for MorphMcp {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::warn!("Failed to discover config, using default: {}", e);
            Self::with_config(ServiceConfig::default())
        })
    }
}

/// Start the morph MCP server.
///
/// This function initializes and runs the MCP server using stdio transport.
/// It will block until the server is shut down.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a fatal error.
///
/// # Example
///
/// ```rust,no_run
/// use morph::mcp::start_mcp_server;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     start_mcp_server().await.map_err(|e| anyhow::anyhow!(e))?;
///     Ok(())
/// }
/// ```
pub async fn start_mcp_server() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = MorphMcp::new()?.serve(stdio()).await?;

    service.waiting().await?;
    Ok(())
}

/// Start MCP server with custom service config.
pub async fn start_mcp_server_with_config(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = MorphMcp::with_config(config).serve(stdio()).await?;

    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_router_has_routes() {
        let router = MorphMcp::tool_router();
        assert!(router.has_route("convert_file"));
        assert!(router.has_route("list_supported_formats"));

        let tools = router.list_all();
        assert_eq!(tools.len(), 2);
    }

    #[test]
    fn test_server_info() {
        let server = MorphMcp::with_config(ServiceConfig::default());
        let info = server.get_info();

        assert_eq!(info.server_info.name, "morph-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_map_unknown_format_to_invalid_params() {
        let error = MorphError::UnknownFormat("xyz".to_string());
        let mcp_error = map_morph_error_to_mcp(error);

        assert_eq!(mcp_error.code.0, -32602);
        assert!(mcp_error.message.contains("xyz"));
    }

    #[test]
    fn test_map_validation_error_to_invalid_params() {
        let error = MorphError::validation("token must be a non-empty string");
        let mcp_error = map_morph_error_to_mcp(error);

        assert_eq!(mcp_error.code.0, -32602);
        assert!(mcp_error.message.contains("token must be a non-empty string"));
    }

    #[test]
    fn test_map_payload_too_large_to_invalid_params() {
        let error = MorphError::PayloadTooLarge { size: 2, limit: 1 };
        let mcp_error = map_morph_error_to_mcp(error);

        assert_eq!(mcp_error.code.0, -32602);
    }

    #[test]
    fn test_map_conversion_failure_to_internal_error() {
        let error = MorphError::conversion_failed("ffmpeg exited with status 1");
        let mcp_error = map_morph_error_to_mcp(error);

        assert_eq!(mcp_error.code.0, -32603);
        assert!(mcp_error.message.contains("ffmpeg exited with status 1"));
    }

    #[test]
    fn test_map_missing_tool_to_internal_error() {
        let error = MorphError::MissingTool("soffice".to_string());
        let mcp_error = map_morph_error_to_mcp(error);

        assert_eq!(mcp_error.code.0, -32603);
        assert!(mcp_error.message.contains("soffice"));
    }

    #[test]
    fn test_convert_file_params_deserialization() {
        let params: ConvertFileParams = serde_json::from_value(json!({
            "input_format": "png",
            "output_format": "jpg",
            "file_content": "aGVsbG8=",
        }))
        .unwrap();

        assert_eq!(params.input_format, "png");
        assert_eq!(params.output_format, "jpg");
        assert_eq!(params.file_content, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_convert_file_rejects_invalid_base64() {
        let server = MorphMcp::with_config(ServiceConfig::default());
        let result = server
            .convert_file(Parameters(ConvertFileParams {
                input_format: "png".to_string(),
                output_format: "jpg".to_string(),
                file_content: "not base64!!!".to_string(),
            }))
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.code.0, -32602);
    }

    #[tokio::test]
    async fn test_convert_file_rejects_cross_category_pair() {
        let server = MorphMcp::with_config(ServiceConfig::default());
        let result = server
            .convert_file(Parameters(ConvertFileParams {
                input_format: "png".to_string(),
                output_format: "mp3".to_string(),
                file_content: BASE64_STANDARD.encode(b"payload"),
            }))
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.code.0, -32602);
        assert!(error.message.contains("png"));
        assert!(error.message.contains("mp3"));
    }

    #[tokio::test]
    async fn test_convert_file_identity_passthrough_round_trips() {
        let server = MorphMcp::with_config(ServiceConfig::default());
        let payload = b"identity payload";
        let result = server
            .convert_file(Parameters(ConvertFileParams {
                input_format: "png".to_string(),
                output_format: "png".to_string(),
                file_content: BASE64_STANDARD.encode(payload),
            }))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
    }

    #[test]
    fn test_list_supported_formats_mentions_every_category() {
        let server = MorphMcp::with_config(ServiceConfig::default());
        let result = server.list_supported_formats(Parameters(())).unwrap();

        let text = serde_json::to_string(&result).unwrap();
        for category in ["image", "document", "audio", "video"] {
            assert!(text.contains(category), "missing category {}", category);
        }
    }
}
