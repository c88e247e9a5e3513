//! Request-scoped value types shared by the engine, the imaging backend and
//! the CLI.
//!
//! Nothing here is retained between calls: an [`ImageBuffer`] is created by
//! the caller, consumed by one engine operation, and the resulting
//! [`Transformed`] or [`ImageInfo`] is handed back.

use crate::imaging::OutputFormat;
use serde::Serialize;
use std::collections::BTreeMap;

/// Encoded image bytes as received from the transport layer.
///
/// The content-type hint is informational only. Decoding always sniffs the
/// actual container format from the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl ImageBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: Some(content_type.into()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

impl From<Vec<u8>> for ImageBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Output of an encode: the bytes and the format they were written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl EncodedImage {
    /// Media type for the transport layer, e.g. `image/jpeg`.
    pub fn media_type(&self) -> String {
        self.format.media_type()
    }
}

/// What happened to the geometry of a request.
///
/// Crop and decrease have lenient fallbacks that re-encode the untouched
/// source instead of failing; the tag makes that observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryOutcome {
    /// The requested pixel operation was performed.
    Applied,
    /// The request carried no geometry (convert, resize without dimensions,
    /// decrease of an image that already fits).
    NotRequested,
    /// Crop rectangle was degenerate or outside the source.
    SkippedInvalidBounds,
    /// Decrease was asked for with only one of its two bounds.
    SkippedMissingBounds,
}

impl GeometryOutcome {
    /// Why the request was not applied, for the lenient fallbacks only.
    pub fn skip_reason(self) -> Option<&'static str> {
        match self {
            GeometryOutcome::Applied | GeometryOutcome::NotRequested => None,
            GeometryOutcome::SkippedInvalidBounds => Some("crop bounds outside the source"),
            GeometryOutcome::SkippedMissingBounds => {
                Some("decrease needs both width and height")
            }
        }
    }
}

/// A successful image-producing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub image: EncodedImage,
    pub outcome: GeometryOutcome,
}

/// Read-only snapshot returned by the inspect operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Canonical name of the sniffed container format (`JPEG`, `PNG`, ...).
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub metadata: BTreeMap<String, String>,
}
