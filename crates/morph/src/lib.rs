//! Morph - Network File Conversion Service
//!
//! Morph converts files between formats within a media category: images,
//! documents, audio, and video. It ships a REST API, an MCP server for AI
//! assistants, and a library API for embedding the conversion engine.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use morph::{ConversionRequest, Dispatcher, ServiceConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> morph::Result<()> {
//! let dispatcher = Dispatcher::new(ServiceConfig::default());
//! let png_bytes = std::fs::read("photo.png")?;
//! let request = ConversionRequest::new(png_bytes, "png", "jpg");
//! let conversion = dispatcher.convert(request).await?;
//! std::fs::write("photo.jpg", conversion.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): format registry, service config, conversion
//!   dispatch with category and pair validation
//! - **Converters** (`convert`): per-category engines - in-process image
//!   codecs, LibreOffice for documents, FFmpeg for audio and video
//! - **API** (`api`): axum REST server plus the JSON-RPC MCP endpoint
//! - **MCP** (`mcp`): stdio MCP server for agent hosts
//!
//! # Features
//!
//! - Same-category conversion across four media categories
//! - Unified error taxonomy shared by every entry point
//! - Per-request timeout with subprocess cleanup
//! - Config file discovery (morph.toml) with environment overrides

#![deny(unsafe_code)]

pub mod convert;
pub mod core;
pub mod error;

#[cfg(feature = "api")]
pub mod api;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use error::{ErrorKind, MorphError, Result};

pub use core::config::ServiceConfig;
pub use core::dispatch::{CategoryConverter, Conversion, ConversionRequest, Dispatcher};
pub use core::registry::{
    category_of, formats_in, is_supported_pair, list_formats, normalize_format, Category, AUDIO_FORMATS,
    DOCUMENT_FORMATS, IMAGE_FORMATS, VIDEO_FORMATS,
};

pub use convert::{AudioConverter, DocumentConverter, ImageConverter, VideoConverter};
