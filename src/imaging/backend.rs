//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the decode/encode boundary: every method
//! takes encoded bytes in and hands encoded bytes (or a snapshot) back, so
//! the decoded raster never leaves the backend. Library error types are
//! translated into [`BackendError`] here and go no further.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::formats::OutputFormat;
use super::params::{CropParams, ResizeParams, TransposeParams};
use crate::types::{EncodedImage, ImageBuffer, ImageInfo};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unsupported or corrupt image: {0}")]
    Decode(String),
    #[error("Cannot encode as {format}: {reason}")]
    Encode {
        format: OutputFormat,
        reason: String,
    },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Implementations must be stateless between calls: every method decodes
/// its input, does one piece of pixel work and encodes the result. `Sync`
/// lets one backend serve concurrent engine calls.
pub trait ImageBackend: Sync {
    /// Read image dimensions from the container header.
    fn identify(&self, input: &ImageBuffer) -> Result<Dimensions, BackendError>;

    /// Decode fully and describe the image without re-encoding.
    fn inspect(&self, input: &ImageBuffer) -> Result<ImageInfo, BackendError>;

    /// Re-encode without pixel changes.
    fn convert(&self, input: &ImageBuffer, format: OutputFormat)
    -> Result<EncodedImage, BackendError>;

    /// Resample to exact dimensions (Lanczos3).
    fn resize(&self, input: &ImageBuffer, params: &ResizeParams)
    -> Result<EncodedImage, BackendError>;

    /// Cut out a rectangle that has already been validated.
    fn crop(&self, input: &ImageBuffer, params: &CropParams) -> Result<EncodedImage, BackendError>;

    /// Place `second` to the right of `first` on a shared canvas.
    fn merge(
        &self,
        first: &ImageBuffer,
        second: &ImageBuffer,
        format: OutputFormat,
    ) -> Result<EncodedImage, BackendError>;

    /// Free rotation and/or one flip or quarter turn.
    fn transpose(
        &self,
        input: &ImageBuffer,
        params: &TransposeParams,
    ) -> Result<EncodedImage, BackendError>;
}
