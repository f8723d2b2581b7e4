//! API request handlers.
//!
//! REST handlers plus the JSON-RPC dispatch for the HTTP MCP endpoint.
//! Both paths decode into the same `ConversionRequest` and let the
//! dispatcher do all validation; handlers only translate taxonomy kinds
//! into their protocol's error shape.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::prelude::*;
use serde_json::{json, Value};
use std::path::Path;

use crate::core::dispatch::ConversionRequest;
use crate::core::registry;
use crate::error::ErrorKind;

use super::{
    error::ApiError,
    types::{
        ApiState, ConvertFileArgs, ConvertFileResult, FormatsResponse, RpcRequest, RpcResponse,
        ServerIdentityResponse, ValidateRequest, ValidateResponse, MCP_PROTOCOL_VERSION, RPC_INTERNAL_ERROR,
        RPC_INVALID_PARAMS, RPC_METHOD_NOT_FOUND, VALIDATION_PHONE_NUMBER,
    },
};

/// Server identity handler.
///
/// GET /
pub async fn root_handler() -> Json<ServerIdentityResponse> {
    Json(ServerIdentityResponse {
        name: "morph file converter".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Supported formats handler.
///
/// GET /formats
pub async fn formats_handler() -> Json<FormatsResponse> {
    Json(registry::list_formats())
}

/// Derive a format token from a filename extension.
fn format_from_filename(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(registry::normalize_format)
        .filter(|ext| !ext.is_empty())
}

/// Download filename for a converted upload: original stem plus the new
/// extension.
fn download_filename(original: Option<&str>, output_format: &str) -> String {
    let stem = original
        .map(Path::new)
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("converted");
    format!("{}.{}", stem, output_format)
}

/// Conversion endpoint handler.
///
/// POST /convert
///
/// Multipart form data:
/// - `file`: the upload; the input format is derived from its filename
///   extension unless an explicit `input_format` field is present
/// - `output_format`: target format token
/// - `input_format` (optional): overrides the extension-derived format
///
/// Returns the converted bytes as a download on success, or the shared
/// `{error_kind, message}` body with a taxonomy-mapped status on failure.
pub async fn convert_handler(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(Vec<u8>, Option<String>)> = None;
    let mut output_format: Option<String> = None;
    let mut input_format: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::invalid(format!("Failed to read file field: {}", e)))?;
                file = Some((data.to_vec(), file_name));
            }
            "output_format" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::invalid(format!("Failed to read output_format field: {}", e)))?;
                output_format = Some(value);
            }
            "input_format" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::invalid(format!("Failed to read input_format field: {}", e)))?;
                input_format = Some(value);
            }
            _ => {}
        }
    }

    let (payload, file_name) = file.ok_or_else(|| ApiError::invalid("file field is required"))?;
    let output_format = output_format
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::invalid("output_format field is required"))?;

    let input_format = match input_format.filter(|f| !f.trim().is_empty()) {
        Some(explicit) => explicit,
        None => file_name
            .as_deref()
            .and_then(format_from_filename)
            .ok_or_else(|| ApiError::invalid("input format could not be derived from the filename; pass an input_format field"))?,
    };

    let request = ConversionRequest::new(payload, &input_format, &output_format);
    let conversion = state.dispatcher.convert(request).await?;

    let filename = download_filename(file_name.as_deref(), &conversion.output_format);
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, conversion.bytes))
}

/// Token validation handler.
///
/// POST /mcp/validate
///
/// Any non-empty token is accepted and answered with the fixed phone
/// number; this is a demo stub whose contract must be preserved, not
/// genuine authentication.
pub async fn validate_handler(Json(request): Json<ValidateRequest>) -> Result<Json<ValidateResponse>, ApiError> {
    if request.token.trim().is_empty() {
        return Err(ApiError::invalid("token must be a non-empty string"));
    }

    Ok(Json(ValidateResponse {
        phone_number: VALIDATION_PHONE_NUMBER.to_string(),
    }))
}

/// JSON-RPC error code for a taxonomy kind.
fn rpc_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::ConversionFailed => RPC_INTERNAL_ERROR,
        _ => RPC_INVALID_PARAMS,
    }
}

/// MCP-over-HTTP handler.
///
/// POST /mcp
///
/// JSON-RPC 2.0 dispatch: `initialize`, `tools/list` and `tools/call`
/// with the `convert_file` and `list_supported_formats` tools. All errors
/// are reported in-band as JSON-RPC error objects.
pub async fn mcp_handler(State(state): State<ApiState>, Json(request): Json<RpcRequest>) -> Json<RpcResponse> {
    let RpcRequest { id, method, params, .. } = request;

    let response = match method.as_str() {
        "initialize" => RpcResponse::success(
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "morph",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "tools/list" => RpcResponse::success(id, json!({ "tools": tool_descriptors() })),
        "tools/call" => {
            let name = params.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
            let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
            handle_tool_call(&state, id, &name, arguments).await
        }
        other => RpcResponse::failure(id, RPC_METHOD_NOT_FOUND, format!("Unknown method: {}", other)),
    };

    Json(response)
}

fn tool_descriptors() -> Value {
    json!([
        {
            "name": "convert_file",
            "description": "Convert a file between formats within the same media category (image, document, audio, video). Use list_supported_formats for the valid formats.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "input_format": {
                        "type": "string",
                        "description": "Input file format (e.g. png, pdf, mp3)"
                    },
                    "output_format": {
                        "type": "string",
                        "description": "Output file format (e.g. jpg, docx, wav)"
                    },
                    "file_content": {
                        "type": "string",
                        "description": "Base64 encoded file content"
                    }
                },
                "required": ["input_format", "output_format", "file_content"]
            }
        },
        {
            "name": "list_supported_formats",
            "description": "List all supported formats grouped by media category",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "required": []
            }
        }
    ])
}

async fn handle_tool_call(state: &ApiState, id: Value, name: &str, arguments: Value) -> RpcResponse {
    match name {
        "convert_file" => handle_convert_file(state, id, arguments).await,
        "list_supported_formats" => {
            let formats = serde_json::to_value(registry::list_formats())
                .unwrap_or_else(|_| json!({}));
            RpcResponse::success(id, formats)
        }
        other => RpcResponse::failure(id, RPC_METHOD_NOT_FOUND, format!("Unknown tool: {}", other)),
    }
}

async fn handle_convert_file(state: &ApiState, id: Value, arguments: Value) -> RpcResponse {
    let args: ConvertFileArgs = match serde_json::from_value(arguments) {
        Ok(args) => args,
        Err(e) => {
            return RpcResponse::failure(id, RPC_INVALID_PARAMS, format!("Missing or invalid parameters: {}", e));
        }
    };

    let payload = match BASE64_STANDARD.decode(args.file_content.as_bytes()) {
        Ok(payload) => payload,
        Err(e) => {
            return RpcResponse::failure(id, RPC_INVALID_PARAMS, format!("Invalid base64 file content: {}", e));
        }
    };

    let request = ConversionRequest::new(payload, &args.input_format, &args.output_format);
    match state.dispatcher.convert(request).await {
        Ok(conversion) => {
            let result = ConvertFileResult {
                file_content: BASE64_STANDARD.encode(&conversion.bytes),
                output_format: conversion.output_format,
            };
            match serde_json::to_value(result) {
                Ok(value) => RpcResponse::success(id, value),
                Err(e) => RpcResponse::failure(id, RPC_INTERNAL_ERROR, format!("Failed to serialize result: {}", e)),
            }
        }
        Err(err) => RpcResponse::failure(id, rpc_code(err.kind()), err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(format_from_filename("photo.PNG").as_deref(), Some("png"));
        assert_eq!(format_from_filename("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(format_from_filename("noextension"), None);
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename(Some("photo.png"), "jpg"), "photo.jpg");
        assert_eq!(download_filename(None, "pdf"), "converted.pdf");
        assert_eq!(download_filename(Some(".hidden"), "txt"), ".hidden.txt");
    }

    #[test]
    fn test_rpc_code_mapping() {
        assert_eq!(rpc_code(ErrorKind::ConversionFailed), RPC_INTERNAL_ERROR);
        assert_eq!(rpc_code(ErrorKind::UnknownFormat), RPC_INVALID_PARAMS);
        assert_eq!(rpc_code(ErrorKind::UnsupportedPair), RPC_INVALID_PARAMS);
        assert_eq!(rpc_code(ErrorKind::PayloadTooLarge), RPC_INVALID_PARAMS);
    }
}
