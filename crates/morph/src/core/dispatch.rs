//! Conversion dispatch.
//!
//! The dispatcher is the single entry point both transport adapters call.
//! It validates a request against the registry (unknown format,
//! cross-category, unsupported pair), enforces the payload ceiling before
//! any conversion work begins, routes to the category converter, and
//! reclassifies every converter-internal failure into the shared taxonomy.
//! Each call is a single-pass synchronous pipeline; there is no state
//! shared between requests and no retry logic.

use crate::convert::{AudioConverter, DocumentConverter, ImageConverter, VideoConverter};
use crate::core::config::ServiceConfig;
use crate::core::registry::{self, Category};
use crate::error::{MorphError, Result};
use ahash::AHashMap;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{timeout, Duration};

/// A single conversion request. Created fresh per incoming call, owned by
/// the request-handling scope, discarded after the response is produced.
#[derive(Debug)]
pub struct ConversionRequest {
    /// Raw input bytes.
    pub payload: Vec<u8>,
    /// Normalized input format token.
    pub input_format: String,
    /// Normalized output format token.
    pub output_format: String,
}

impl ConversionRequest {
    /// Build a request, normalizing both format tokens.
    pub fn new(payload: Vec<u8>, input_format: &str, output_format: &str) -> Self {
        Self {
            payload,
            input_format: registry::normalize_format(input_format),
            output_format: registry::normalize_format(output_format),
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// A successful conversion.
#[derive(Debug)]
pub struct Conversion {
    /// Converted output bytes.
    pub bytes: Vec<u8>,
    /// Normalized output format token.
    pub output_format: String,
}

/// Uniform contract every category converter implements.
///
/// Converters may return any error variant; the dispatcher folds whatever
/// they return into `ConversionFailed` at its boundary. They are only ever
/// invoked with pairs the registry enumerates as valid for their category.
#[async_trait]
pub trait CategoryConverter: Send + Sync {
    /// The category this converter serves.
    fn category(&self) -> Category;

    /// Convert `payload` from `input_format` to `output_format`.
    async fn run(&self, payload: &[u8], input_format: &str, output_format: &str) -> Result<Vec<u8>>;
}

/// Routes validated requests to the converter for their category.
pub struct Dispatcher {
    config: ServiceConfig,
    converters: AHashMap<Category, Arc<dyn CategoryConverter>>,
}

impl Dispatcher {
    /// Create a dispatcher with the default converter per category.
    pub fn new(config: ServiceConfig) -> Self {
        let converters: Vec<Arc<dyn CategoryConverter>> = vec![
            Arc::new(ImageConverter),
            Arc::new(DocumentConverter::new(&config)),
            Arc::new(AudioConverter::new(&config)),
            Arc::new(VideoConverter::new(&config)),
        ];

        let converters = converters
            .into_iter()
            .map(|converter| (converter.category(), converter))
            .collect();

        Self { config, converters }
    }

    /// Replace the converter for one category. Used by tests to install
    /// instrumented stubs.
    pub fn with_converter(mut self, converter: Arc<dyn CategoryConverter>) -> Self {
        self.converters.insert(converter.category(), converter);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validate and execute a conversion request.
    ///
    /// # Errors
    ///
    /// - `UnknownFormat` if either token is not recognized.
    /// - `CrossCategory` if the formats belong to different categories.
    /// - `UnsupportedPair` if the ordered pair is not enumerated.
    /// - `PayloadTooLarge` if the payload exceeds the configured maximum;
    ///   no converter is invoked in this case.
    /// - `ConversionFailed` for every converter-internal failure, including
    ///   timeouts, missing external tools and empty converter output.
    pub async fn convert(&self, request: ConversionRequest) -> Result<Conversion> {
        let input_category = registry::category_of(&request.input_format)?;
        let output_category = registry::category_of(&request.output_format)?;

        if input_category != output_category {
            return Err(MorphError::CrossCategory {
                input: request.input_format,
                input_category,
                output: request.output_format,
                output_category,
            });
        }

        if !registry::is_supported_pair(&request.input_format, &request.output_format) {
            return Err(MorphError::UnsupportedPair {
                input: request.input_format,
                output: request.output_format,
            });
        }

        if request.size() > self.config.max_payload_bytes {
            return Err(MorphError::PayloadTooLarge {
                size: request.size(),
                limit: self.config.max_payload_bytes,
            });
        }

        if self.config.identity_passthrough && request.input_format == request.output_format {
            tracing::debug!(
                format = %request.input_format,
                size = request.size(),
                "identity conversion, passing payload through"
            );
            return Ok(Conversion {
                bytes: request.payload,
                output_format: request.output_format,
            });
        }

        let converter = self.converters.get(&input_category).ok_or_else(|| {
            MorphError::conversion_failed(format!("no converter installed for category '{}'", input_category))
        })?;

        tracing::debug!(
            input = %request.input_format,
            output = %request.output_format,
            category = %input_category,
            size = request.size(),
            "dispatching conversion"
        );

        let deadline = Duration::from_secs(self.config.timeout_seconds);
        let bytes = match timeout(
            deadline,
            converter.run(&request.payload, &request.input_format, &request.output_format),
        )
        .await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => {
                tracing::warn!(
                    input = %request.input_format,
                    output = %request.output_format,
                    error = %err,
                    "conversion failed"
                );
                return Err(err.into_conversion_failed());
            }
            Err(_) => {
                return Err(MorphError::conversion_failed(format!(
                    "conversion from {} to {} timed out after {} seconds",
                    request.input_format, request.output_format, self.config.timeout_seconds
                )));
            }
        };

        if bytes.is_empty() {
            return Err(MorphError::conversion_failed(format!(
                "converter produced no output for {} to {}",
                request.input_format, request.output_format
            )));
        }

        Ok(Conversion {
            bytes,
            output_format: request.output_format,
        })
    }
}
