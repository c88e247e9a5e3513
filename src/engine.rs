//! Engine facade: the single entry point for every transformation.
//!
//! Each call runs the same validation order before any pixel work:
//!
//! 1. every input buffer is checked against `limits.max_input_bytes`, so an
//!    oversized upload is refused without allocating a raster;
//! 2. the format token (or the configured default) is resolved through the
//!    registry;
//! 3. operation-specific parameters are resolved (transpose method, angle);
//! 4. operations that can grow the raster check their target against
//!    `limits.max_output_pixels` from the source header;
//! 5. the operation runs against the backend.
//!
//! Operations are deterministic, so nothing is retried. The engine holds no
//! mutable state and is `Sync` whenever its backend is; share one instance
//! across worker threads.

use crate::config::EngineConfig;
use crate::imaging::operations::{self, OperationError};
use crate::imaging::{
    BackendError, CropRect, DecreaseRequest, ImageBackend, InvalidCropBounds, OutputFormat,
    ResizeRequest, RustBackend, TargetTooLarge, TransposeKind, UnknownFormat,
    UnknownTransposeMethod, resolve_format,
};
use crate::types::{ImageBuffer, ImageInfo, Transformed};
use thiserror::Error;

/// Every way an engine call can fail. The transport layer maps these to
/// user-facing responses.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormat),
    #[error(transparent)]
    UnknownTransposeMethod(#[from] UnknownTransposeMethod),
    #[error("rotation angle must be finite, got {0}")]
    InvalidAngle(f64),
    #[error(transparent)]
    InvalidCropBounds(#[from] InvalidCropBounds),
    #[error("{0}")]
    UnsupportedOrCorruptImage(String),
    #[error("Cannot encode as {format}: {reason}")]
    EncodeFailure {
        format: OutputFormat,
        reason: String,
    },
    #[error("Input of {size} bytes exceeds the {limit}-byte limit")]
    PayloadTooLarge { size: usize, limit: u64 },
    #[error(transparent)]
    TargetTooLarge(#[from] TargetTooLarge),
    #[error("Processing failed: {0}")]
    Processing(String),
}

impl From<BackendError> for EngineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => EngineError::UnsupportedOrCorruptImage(msg),
            BackendError::Encode { format, reason } => {
                EngineError::EncodeFailure { format, reason }
            }
            BackendError::ProcessingFailed(msg) => EngineError::Processing(msg),
        }
    }
}

impl From<OperationError> for EngineError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Backend(e) => e.into(),
            OperationError::InvalidCropBounds(e) => e.into(),
            OperationError::TargetTooLarge(e) => e.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// One engine request, as the transport layer hands it over.
///
/// Format fields take raw user tokens; `None` selects the configured default.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Convert {
        format: Option<String>,
    },
    Resize {
        format: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    },
    Decrease {
        format: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    },
    Crop {
        format: Option<String>,
        rect: CropRect,
    },
    Merge {
        second: ImageBuffer,
    },
    Transpose {
        format: Option<String>,
        angle: Option<f64>,
        method: Option<String>,
    },
    Inspect,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Convert { .. } => "convert",
            Operation::Resize { .. } => "resize",
            Operation::Decrease { .. } => "decrease",
            Operation::Crop { .. } => "crop",
            Operation::Merge { .. } => "merge",
            Operation::Transpose { .. } => "transpose",
            Operation::Inspect => "inspect",
        }
    }
}

/// Result of [`Engine::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Image(Transformed),
    Info(ImageInfo),
}

/// The transformation engine.
pub struct Engine<B = RustBackend> {
    backend: B,
    config: EngineConfig,
}

impl Engine<RustBackend> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl Default for Engine<RustBackend> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<B: ImageBackend> Engine<B> {
    pub fn with_backend(backend: B, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run any operation through the facade.
    pub fn execute(&self, input: &ImageBuffer, operation: &Operation) -> Result<Output> {
        log::debug!("{} ({} bytes)", operation.name(), input.len());
        match operation {
            Operation::Convert { format } => {
                self.convert(input, format.as_deref()).map(Output::Image)
            }
            Operation::Resize {
                format,
                width,
                height,
            } => self
                .resize(input, format.as_deref(), *width, *height)
                .map(Output::Image),
            Operation::Decrease {
                format,
                width,
                height,
            } => self
                .decrease(input, format.as_deref(), *width, *height)
                .map(Output::Image),
            Operation::Crop { format, rect } => {
                self.crop(input, format.as_deref(), *rect).map(Output::Image)
            }
            Operation::Merge { second } => self.merge(input, second).map(Output::Image),
            Operation::Transpose {
                format,
                angle,
                method,
            } => self
                .transpose(input, format.as_deref(), *angle, method.as_deref())
                .map(Output::Image),
            Operation::Inspect => self.inspect(input).map(Output::Info),
        }
    }

    /// Re-encode into `format`.
    pub fn convert(&self, input: &ImageBuffer, format: Option<&str>) -> Result<Transformed> {
        self.check_size(input)?;
        let format = self.target_format(format)?;
        Ok(operations::convert(&self.backend, input, format)?)
    }

    /// Resize to `width` and/or `height`; a single dimension keeps the aspect
    /// ratio. Zero counts as absent. Targets above `limits.max_output_pixels`
    /// fail with [`EngineError::TargetTooLarge`].
    pub fn resize(
        &self,
        input: &ImageBuffer,
        format: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Transformed> {
        self.check_size(input)?;
        let format = self.target_format(format)?;
        let request = ResizeRequest::from_dimensions(width, height);
        Ok(operations::resize(
            &self.backend,
            input,
            request,
            format,
            self.max_output_pixels(),
        )?)
    }

    /// Shrink to fit within `width` x `height`. Needs both bounds.
    pub fn decrease(
        &self,
        input: &ImageBuffer,
        format: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Transformed> {
        self.check_size(input)?;
        let format = self.target_format(format)?;
        let request = DecreaseRequest::new(width, height);
        Ok(operations::decrease(&self.backend, input, request, format)?)
    }

    /// Crop to `rect`; invalid rectangles follow `geometry.strict_crop`.
    pub fn crop(
        &self,
        input: &ImageBuffer,
        format: Option<&str>,
        rect: CropRect,
    ) -> Result<Transformed> {
        self.check_size(input)?;
        let format = self.target_format(format)?;
        Ok(operations::crop(
            &self.backend,
            input,
            rect,
            format,
            self.config.crop_policy(),
        )?)
    }

    /// Place `second` to the right of `first`. Always PNG.
    pub fn merge(&self, first: &ImageBuffer, second: &ImageBuffer) -> Result<Transformed> {
        self.check_size(first)?;
        self.check_size(second)?;
        Ok(operations::merge(
            &self.backend,
            first,
            second,
            self.max_output_pixels(),
        )?)
    }

    /// Rotate by `angle` degrees counter-clockwise, then apply the transpose
    /// `method` (`left`, `right`, `top`, `bottom`, `rotate_90`, ...).
    pub fn transpose(
        &self,
        input: &ImageBuffer,
        format: Option<&str>,
        angle: Option<f64>,
        method: Option<&str>,
    ) -> Result<Transformed> {
        self.check_size(input)?;
        let format = self.target_format(format)?;
        let kind = method.map(TransposeKind::from_alias).transpose()?;
        if let Some(angle) = angle.filter(|a| !a.is_finite()) {
            return Err(EngineError::InvalidAngle(angle));
        }
        Ok(operations::transpose(
            &self.backend,
            input,
            angle,
            kind,
            format,
            self.max_output_pixels(),
        )?)
    }

    /// Describe the image: format, dimensions, metadata.
    pub fn inspect(&self, input: &ImageBuffer) -> Result<ImageInfo> {
        self.check_size(input)?;
        Ok(operations::inspect(&self.backend, input)?)
    }

    fn check_size(&self, input: &ImageBuffer) -> Result<()> {
        let limit = self.config.limits.max_input_bytes;
        if input.len() as u64 > limit {
            log::debug!("rejecting {} byte input (limit {limit})", input.len());
            return Err(EngineError::PayloadTooLarge {
                size: input.len(),
                limit,
            });
        }
        Ok(())
    }

    fn max_output_pixels(&self) -> u64 {
        self.config.limits.max_output_pixels
    }

    fn target_format(&self, token: Option<&str>) -> Result<OutputFormat> {
        let token = token.unwrap_or(self.config.defaults.format.as_str());
        Ok(resolve_format(token)?)
    }
}
