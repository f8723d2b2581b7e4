//! Category converters.
//!
//! One converter per media category, all implementing the
//! [`CategoryConverter`](crate::core::dispatch::CategoryConverter) contract.
//! Images convert in-process via the `image` crate; documents go through
//! LibreOffice; audio and video go through ffmpeg.

mod document;
mod image;
mod media;
mod scratch;

pub use document::DocumentConverter;
pub use image::ImageConverter;
pub use media::{AudioConverter, VideoConverter};
