//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They read
//! the source dimensions when geometry depends on them, decide what pixel
//! work is needed, and call the backend exactly once to produce the output.
//!
//! Crop and decrease have lenient paths: an unusable request re-encodes the
//! untouched source and reports a skipped [`GeometryOutcome`] instead of
//! failing. [`CropPolicy::Strict`] turns the crop path into an error.
//!
//! Operations that can grow the raster (resize, merge, free rotation) take a
//! `max_pixels` output limit and fail with [`TargetTooLarge`] before the
//! backend decodes anything.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    InvalidCropBounds, TargetTooLarge, check_target, merge_canvas, plan_decrease, resolve_resize,
    rotated_canvas, validate_crop,
};
use super::formats::OutputFormat;
use super::params::{
    CropParams, CropRect, DecreaseRequest, ResizeParams, ResizeRequest, TransposeKind,
    TransposeParams,
};
use crate::types::{EncodedImage, GeometryOutcome, ImageBuffer, ImageInfo, Transformed};
use thiserror::Error;

/// Format every merge is encoded in, whatever the inputs were.
pub const MERGE_FORMAT: OutputFormat = OutputFormat::Png;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    InvalidCropBounds(#[from] InvalidCropBounds),
    #[error(transparent)]
    TargetTooLarge(#[from] TargetTooLarge),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// What to do with a crop rectangle that does not fit the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPolicy {
    /// Re-encode the untouched source and report `SkippedInvalidBounds`.
    #[default]
    Lenient,
    /// Fail with [`InvalidCropBounds`].
    Strict,
}

fn transformed(image: EncodedImage, outcome: GeometryOutcome) -> Result<Transformed> {
    Ok(Transformed { image, outcome })
}

/// Re-encode into another format.
pub fn convert(
    backend: &impl ImageBackend,
    input: &ImageBuffer,
    format: OutputFormat,
) -> Result<Transformed> {
    transformed(
        backend.convert(input, format)?,
        GeometryOutcome::NotRequested,
    )
}

/// Plan a resize without executing it.
///
/// Returns `None` when the request carries no dimensions, and an error when
/// the target exceeds `max_pixels`.
pub fn plan_resize(
    source: (u32, u32),
    request: ResizeRequest,
    format: OutputFormat,
    max_pixels: u64,
) -> std::result::Result<Option<ResizeParams>, TargetTooLarge> {
    let Some(target) = resolve_resize(source, request) else {
        return Ok(None);
    };
    let (width, height) = check_target(target, max_pixels)?;
    Ok(Some(ResizeParams {
        width,
        height,
        format,
    }))
}

/// Resize to exact or aspect-preserving dimensions.
///
/// Without dimensions the image is still re-encoded in the target format.
pub fn resize(
    backend: &impl ImageBackend,
    input: &ImageBuffer,
    request: ResizeRequest,
    format: OutputFormat,
    max_pixels: u64,
) -> Result<Transformed> {
    if request == ResizeRequest::NoResize {
        return convert(backend, input, format);
    }

    let source = backend.identify(input)?.as_tuple();
    match plan_resize(source, request, format, max_pixels)? {
        Some(params) => {
            log::debug!(
                "resize {}x{} → {}x{}",
                source.0,
                source.1,
                params.width,
                params.height
            );
            transformed(backend.resize(input, &params)?, GeometryOutcome::Applied)
        }
        None => convert(backend, input, format),
    }
}

/// Shrink to fit within a box, preserving aspect ratio. Never upscales.
///
/// Both bounds are required; with only one the image is re-encoded as-is
/// and the outcome is `SkippedMissingBounds`.
pub fn decrease(
    backend: &impl ImageBackend,
    input: &ImageBuffer,
    request: DecreaseRequest,
    format: OutputFormat,
) -> Result<Transformed> {
    if request.bounds().is_none() {
        log::warn!(
            "decrease needs both bounds (got width={:?}, height={:?}); re-encoding unchanged",
            request.max_width,
            request.max_height
        );
        return transformed(
            backend.convert(input, format)?,
            GeometryOutcome::SkippedMissingBounds,
        );
    }

    let source = backend.identify(input)?.as_tuple();
    match plan_decrease(source, request) {
        Some((width, height)) => {
            let params = ResizeParams {
                width,
                height,
                format,
            };
            transformed(backend.resize(input, &params)?, GeometryOutcome::Applied)
        }
        // Already fits the box
        None => convert(backend, input, format),
    }
}

/// Crop to a rectangle validated against the source.
pub fn crop(
    backend: &impl ImageBackend,
    input: &ImageBuffer,
    rect: CropRect,
    format: OutputFormat,
    policy: CropPolicy,
) -> Result<Transformed> {
    let source = backend.identify(input)?.as_tuple();

    match validate_crop(source, rect) {
        Ok(()) => transformed(
            backend.crop(input, &CropParams { rect, format })?,
            GeometryOutcome::Applied,
        ),
        Err(invalid) if policy == CropPolicy::Strict => Err(invalid.into()),
        Err(invalid) => {
            log::warn!("{invalid}; re-encoding unchanged");
            transformed(
                backend.convert(input, format)?,
                GeometryOutcome::SkippedInvalidBounds,
            )
        }
    }
}

/// Place `second` to the right of `first`; output is always [`MERGE_FORMAT`].
pub fn merge(
    backend: &impl ImageBackend,
    first: &ImageBuffer,
    second: &ImageBuffer,
    max_pixels: u64,
) -> Result<Transformed> {
    let canvas = merge_canvas(
        backend.identify(first)?.as_tuple(),
        backend.identify(second)?.as_tuple(),
    );
    check_target(canvas, max_pixels)?;
    transformed(
        backend.merge(first, second, MERGE_FORMAT)?,
        GeometryOutcome::Applied,
    )
}

/// Optional free rotation followed by at most one flip or quarter turn.
pub fn transpose(
    backend: &impl ImageBackend,
    input: &ImageBuffer,
    angle: Option<f64>,
    kind: Option<TransposeKind>,
    format: OutputFormat,
    max_pixels: u64,
) -> Result<Transformed> {
    let angle = angle.filter(|a| *a != 0.0);
    if let Some(degrees) = angle {
        let source = backend.identify(input)?.as_tuple();
        check_target(rotated_canvas(source, degrees), max_pixels)?;
    }
    let outcome = if angle.is_some() || kind.is_some() {
        GeometryOutcome::Applied
    } else {
        GeometryOutcome::NotRequested
    };

    let params = TransposeParams {
        angle,
        kind,
        format,
    };
    transformed(backend.transpose(input, &params)?, outcome)
}

/// Describe the image without re-encoding it.
pub fn inspect(backend: &impl ImageBackend, input: &ImageBuffer) -> Result<ImageInfo> {
    Ok(backend.inspect(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn buffer() -> ImageBuffer {
        ImageBuffer::new(b"not decoded by the mock".to_vec())
    }

    const NO_LIMIT: u64 = u64::MAX;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn backend_800x600() -> MockBackend {
        MockBackend::with_dimensions(vec![dims(800, 600)])
    }

    #[test]
    fn plan_resize_width_only() {
        let params = plan_resize(
            (800, 600),
            ResizeRequest::WidthOnly(400),
            OutputFormat::Png,
            NO_LIMIT,
        );
        assert_eq!(
            params,
            Ok(Some(ResizeParams {
                width: 400,
                height: 300,
                format: OutputFormat::Png,
            }))
        );
    }

    #[test]
    fn plan_resize_rejects_target_over_limit() {
        let err = plan_resize(
            (800, 600),
            ResizeRequest::ExactSize(1000, 1000),
            OutputFormat::Png,
            999_999,
        )
        .unwrap_err();
        assert_eq!((err.width, err.height), (1000, 1000));
    }

    #[test]
    fn resize_identifies_then_resizes() {
        let backend = backend_800x600();
        let result = resize(
            &backend,
            &buffer(),
            ResizeRequest::HeightOnly(300),
            OutputFormat::Jpeg,
            NO_LIMIT,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::Applied);
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Identify,
                RecordedOp::Resize {
                    width: 400,
                    height: 300,
                    format: OutputFormat::Jpeg,
                },
            ]
        );
    }

    #[test]
    fn resize_without_dimensions_reencodes() {
        let backend = MockBackend::new();
        let result = resize(
            &backend,
            &buffer(),
            ResizeRequest::NoResize,
            OutputFormat::WebP,
            NO_LIMIT,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::NotRequested);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Convert(OutputFormat::WebP)]
        );
    }

    #[test]
    fn resize_over_limit_never_reaches_backend_resize() {
        let backend = MockBackend::with_dimensions(vec![dims(4, 4)]);
        let result = resize(
            &backend,
            &buffer(),
            ResizeRequest::ExactSize(u32::MAX, u32::MAX),
            OutputFormat::Png,
            50_000_000,
        );

        assert!(matches!(result, Err(OperationError::TargetTooLarge(_))));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Identify]);
    }

    #[test]
    fn resize_width_only_beyond_u32_is_rejected() {
        // 1x1000 scaled to width u32::MAX needs a height past u32
        let backend = MockBackend::with_dimensions(vec![dims(1, 1000)]);
        let result = resize(
            &backend,
            &buffer(),
            ResizeRequest::WidthOnly(u32::MAX),
            OutputFormat::Png,
            NO_LIMIT,
        );

        let Err(OperationError::TargetTooLarge(err)) = result else {
            panic!("expected TargetTooLarge, got {result:?}");
        };
        assert!(err.height > u64::from(u32::MAX));
    }

    #[test]
    fn decrease_with_both_bounds_resizes() {
        let backend = backend_800x600();
        let result = decrease(
            &backend,
            &buffer(),
            DecreaseRequest::new(Some(200), Some(200)),
            OutputFormat::Png,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::Applied);
        assert!(backend.get_operations().contains(&RecordedOp::Resize {
            width: 200,
            height: 150,
            format: OutputFormat::Png,
        }));
    }

    #[test]
    fn decrease_with_one_bound_is_skipped() {
        let backend = MockBackend::new();
        let result = decrease(
            &backend,
            &buffer(),
            DecreaseRequest::new(Some(200), None),
            OutputFormat::Png,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::SkippedMissingBounds);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Convert(OutputFormat::Png)]
        );
    }

    #[test]
    fn decrease_of_small_image_is_not_resampled() {
        let backend = backend_800x600();
        let result = decrease(
            &backend,
            &buffer(),
            DecreaseRequest::new(Some(1000), Some(1000)),
            OutputFormat::Png,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::NotRequested);
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Identify,
                RecordedOp::Convert(OutputFormat::Png)
            ]
        );
    }

    #[test]
    fn crop_valid_rect_is_applied() {
        let backend = backend_800x600();
        let rect = CropRect::new(0, 0, 100, 100);
        let result = crop(
            &backend,
            &buffer(),
            rect,
            OutputFormat::Jpeg,
            CropPolicy::Lenient,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::Applied);
        assert_eq!(
            backend.get_operations()[1],
            RecordedOp::Crop {
                rect,
                format: OutputFormat::Jpeg,
            }
        );
    }

    #[test]
    fn crop_invalid_rect_falls_back_to_source() {
        let backend = backend_800x600();
        let result = crop(
            &backend,
            &buffer(),
            CropRect::new(750, 0, 10, 10),
            OutputFormat::Jpeg,
            CropPolicy::Lenient,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::SkippedInvalidBounds);
        assert_eq!(
            backend.get_operations()[1],
            RecordedOp::Convert(OutputFormat::Jpeg)
        );
    }

    #[test]
    fn crop_invalid_rect_strict_errors() {
        let backend = backend_800x600();
        let result = crop(
            &backend,
            &buffer(),
            CropRect::new(750, 0, 10, 10),
            OutputFormat::Jpeg,
            CropPolicy::Strict,
        );

        assert!(matches!(result, Err(OperationError::InvalidCropBounds(_))));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Identify]);
    }

    #[test]
    fn merge_always_encodes_png() {
        let backend = MockBackend::with_dimensions(vec![dims(100, 400), dims(300, 200)]);
        let result = merge(&backend, &buffer(), &buffer(), NO_LIMIT).unwrap();
        assert_eq!(result.image.format, OutputFormat::Png);
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Identify,
                RecordedOp::Identify,
                RecordedOp::Merge(OutputFormat::Png)
            ]
        );
    }

    #[test]
    fn merge_canvas_over_limit_is_rejected() {
        // 300x200 + 100x400 → 400x400 = 160_000 pixels
        let backend = MockBackend::with_dimensions(vec![dims(100, 400), dims(300, 200)]);
        let result = merge(&backend, &buffer(), &buffer(), 159_999);

        let Err(OperationError::TargetTooLarge(err)) = result else {
            panic!("expected TargetTooLarge, got {result:?}");
        };
        assert_eq!((err.width, err.height), (400, 400));
        assert!(!backend
            .get_operations()
            .contains(&RecordedOp::Merge(OutputFormat::Png)));
    }

    #[test]
    fn transpose_zero_angle_is_dropped() {
        let backend = MockBackend::new();
        let result = transpose(
            &backend,
            &buffer(),
            Some(0.0),
            None,
            OutputFormat::Png,
            NO_LIMIT,
        )
        .unwrap();

        assert_eq!(result.outcome, GeometryOutcome::NotRequested);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Transpose {
                angle: None,
                kind: None,
                format: OutputFormat::Png,
            }]
        );
    }

    #[test]
    fn transpose_with_kind_is_applied() {
        let backend = backend_800x600();
        let result = transpose(
            &backend,
            &buffer(),
            Some(30.0),
            Some(TransposeKind::FlipVertical),
            OutputFormat::Png,
            NO_LIMIT,
        )
        .unwrap();
        assert_eq!(result.outcome, GeometryOutcome::Applied);
        assert_eq!(backend.get_operations()[0], RecordedOp::Identify);
    }

    #[test]
    fn transpose_kind_alone_skips_identify() {
        let backend = MockBackend::new();
        transpose(
            &backend,
            &buffer(),
            None,
            Some(TransposeKind::Rotate90),
            OutputFormat::Png,
            1,
        )
        .unwrap();
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn free_rotation_canvas_over_limit_is_rejected() {
        // 100x100 at 45° needs a 142x142 canvas
        let backend = MockBackend::with_dimensions(vec![dims(100, 100)]);
        let result = transpose(
            &backend,
            &buffer(),
            Some(45.0),
            None,
            OutputFormat::Png,
            142 * 142 - 1,
        );
        assert!(matches!(result, Err(OperationError::TargetTooLarge(_))));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Identify]);
    }

    #[test]
    fn backend_errors_propagate() {
        // No mock dimensions queued: identify fails
        let backend = MockBackend::new();
        let result = crop(
            &backend,
            &buffer(),
            CropRect::new(0, 0, 1, 1),
            OutputFormat::Png,
            CropPolicy::Lenient,
        );
        assert!(matches!(
            result,
            Err(OperationError::Backend(BackendError::Decode(_)))
        ));
    }
}
