//! Static format registry.
//!
//! Single source of truth for which formats exist, which category each
//! belongs to, and which ordered pairs are convertible. The pair-validity
//! table lives here (not in the converters) so an unsupported pair is
//! rejected before any conversion work begins; converters never see a pair
//! that is not enumerated below.
//!
//! The tables are immutable compile-time data; adding a format or pair is a
//! data change, not a logic change. Lookups go through a lazily built hash
//! map for O(1) access.

use crate::error::{MorphError, Result};
use ahash::AHashMap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media category a format belongs to.
///
/// Every known format belongs to exactly one category; cross-category
/// conversion is never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Document,
    Audio,
    Video,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 4] = [Category::Image, Category::Document, Category::Audio, Category::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Document => "document",
            Category::Audio => "audio",
            Category::Video => "video",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported image formats. Fully symmetric: every format converts to every
/// other, including itself.
pub const IMAGE_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tiff"];

/// Supported document formats. Pair validity is the sparse table in
/// [`DOCUMENT_PAIRS`], not N×N.
pub const DOCUMENT_FORMATS: &[&str] = &["pdf", "docx", "txt"];

/// Supported audio formats. Fully symmetric.
pub const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac"];

/// Supported video formats. Fully symmetric.
pub const VIDEO_FORMATS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm"];

/// The only valid document conversions. Asymmetric by design: `txt` is an
/// output-only format (no txt→pdf or txt→docx).
pub const DOCUMENT_PAIRS: &[(&str, &str)] = &[
    ("pdf", "docx"),
    ("docx", "pdf"),
    ("pdf", "txt"),
    ("docx", "txt"),
];

/// Formats enumerated for a category, in display order.
pub fn formats_in(category: Category) -> &'static [&'static str] {
    match category {
        Category::Image => IMAGE_FORMATS,
        Category::Document => DOCUMENT_FORMATS,
        Category::Audio => AUDIO_FORMATS,
        Category::Video => VIDEO_FORMATS,
    }
}

/// Format → category map built from the same arrays `formats_in` serves,
/// so listing and validity can never drift apart.
static CATEGORY_MAP: Lazy<AHashMap<&'static str, Category>> = Lazy::new(|| {
    let mut map = AHashMap::new();
    for category in Category::ALL {
        for format in formats_in(category) {
            let previous = map.insert(*format, category);
            debug_assert!(previous.is_none(), "format '{}' mapped to two categories", format);
        }
    }
    map
});

/// Normalize a format token: trim whitespace, strip a leading dot, lowercase.
///
/// The original wire protocol accepted `.pdf`-style tokens; internally one
/// token identifies one canonical type.
pub fn normalize_format(token: &str) -> String {
    token.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Resolve the category a (normalized) format belongs to.
///
/// # Errors
///
/// Returns `MorphError::UnknownFormat` if the token is not recognized by
/// any category.
pub fn category_of(format: &str) -> Result<Category> {
    CATEGORY_MAP
        .get(format)
        .copied()
        .ok_or_else(|| MorphError::UnknownFormat(format.to_string()))
}

/// Whether the ordered pair (input, output) is enumerated as convertible.
///
/// True only if both formats share a category and that category enumerates
/// the pair. Image, audio and video enumerate every ordered pair over their
/// format set, including identity; documents use the sparse
/// [`DOCUMENT_PAIRS`] table.
pub fn is_supported_pair(input: &str, output: &str) -> bool {
    let (Ok(input_category), Ok(output_category)) = (category_of(input), category_of(output)) else {
        return false;
    };
    if input_category != output_category {
        return false;
    }
    match input_category {
        Category::Document => DOCUMENT_PAIRS.iter().any(|(i, o)| *i == input && *o == output),
        _ => true,
    }
}

/// Category → formats mapping for introspection and display.
///
/// Sourced from the same arrays the validity check uses.
pub fn list_formats() -> IndexMap<Category, Vec<&'static str>> {
    Category::ALL
        .into_iter()
        .map(|category| (category, formats_in(category).to_vec()))
        .collect()
}
