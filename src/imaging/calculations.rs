//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropRect, DecreaseRequest, ResizeRequest};
use thiserror::Error;

/// Crop rectangle that is degenerate or reaches outside the source.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error(
    "crop ({}, {}, {}, {}) is outside the {source_width}x{source_height} source",
    .rect.left, .rect.upper, .rect.right, .rect.lower
)]
pub struct InvalidCropBounds {
    pub rect: CropRect,
    pub source_width: u32,
    pub source_height: u32,
}

/// Output raster larger than the engine may allocate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("target {width}x{height} exceeds the output limit of {max_pixels} pixels")]
pub struct TargetTooLarge {
    pub width: u64,
    pub height: u64,
    pub max_pixels: u64,
}

/// Scale `value` by `numerator / denominator`, rounded to nearest, minimum 1.
///
/// Not narrowed to `u32`: extreme ratios are left for [`check_target`] to
/// reject.
fn scale_rounded(value: u32, numerator: u32, denominator: u32) -> u64 {
    let scaled = (f64::from(value) * f64::from(numerator) / f64::from(denominator)).round();
    (scaled as u64).max(1)
}

/// Calculate target dimensions for a resize.
///
/// Returns `None` when no resize was requested. Exact sizes are taken as-is
/// (distortion accepted); a single dimension preserves the aspect ratio.
/// The result is unbounded; pass it through [`check_target`] before
/// allocating.
///
/// # Examples
/// ```
/// # use imgconv::imaging::{resolve_resize, ResizeRequest};
/// // 800x600 with width 400 → 400x300
/// assert_eq!(resolve_resize((800, 600), ResizeRequest::WidthOnly(400)), Some((400, 300)));
/// assert_eq!(resolve_resize((800, 600), ResizeRequest::NoResize), None);
/// ```
pub fn resolve_resize(source: (u32, u32), request: ResizeRequest) -> Option<(u64, u64)> {
    let (src_w, src_h) = source;

    match request {
        ResizeRequest::ExactSize(width, height) => Some((width.into(), height.into())),
        ResizeRequest::WidthOnly(width) => Some((width.into(), scale_rounded(src_h, width, src_w))),
        ResizeRequest::HeightOnly(height) => {
            Some((scale_rounded(src_w, height, src_h), height.into()))
        }
        ResizeRequest::NoResize => None,
    }
}

/// Narrow exact extents to raster dimensions, or `None` if either side
/// does not fit in `u32`.
pub(crate) fn fit_dimensions(target: (u64, u64)) -> Option<(u32, u32)> {
    Some((u32::try_from(target.0).ok()?, u32::try_from(target.1).ok()?))
}

/// Accept a target raster only if it fits `u32` sides and `max_pixels`.
///
/// # Examples
/// ```
/// # use imgconv::imaging::check_target;
/// assert_eq!(check_target((400, 300), 1_000_000), Ok((400, 300)));
/// assert!(check_target((u64::from(u32::MAX), 2), u64::MAX).is_ok());
/// assert!(check_target((u64::from(u32::MAX) + 1, 1), u64::MAX).is_err());
/// assert!(check_target((2000, 1000), 1_000_000).is_err());
/// ```
pub fn check_target(target: (u64, u64), max_pixels: u64) -> Result<(u32, u32), TargetTooLarge> {
    let (width, height) = target;
    match fit_dimensions(target) {
        Some(dims) if width.saturating_mul(height) <= max_pixels => Ok(dims),
        _ => Err(TargetTooLarge {
            width,
            height,
            max_pixels,
        }),
    }
}

/// Pick floor or ceil of `exact`, whichever `distance` prefers, minimum 1.
///
/// Ties go to the floor.
fn round_aspect(exact: f64, distance: impl Fn(f64) -> f64) -> u32 {
    let floor = exact.floor();
    let ceil = exact.ceil();
    let chosen = if distance(floor) <= distance(ceil) {
        floor
    } else {
        ceil
    };
    (chosen as u32).max(1)
}

/// Calculate fit-within-bounds dimensions for a decrease.
///
/// Returns `None` when nothing should be resampled: the image already fits
/// the box. Never upscales. The caller handles missing bounds; see
/// [`DecreaseRequest::bounds`].
///
/// # Examples
/// ```
/// # use imgconv::imaging::resolve_decrease;
/// // 800x600 into a 200x200 box → 200x150
/// assert_eq!(resolve_decrease((800, 600), (200, 200)), Some((200, 150)));
/// // Already fits → no resize
/// assert_eq!(resolve_decrease((100, 50), (200, 200)), None);
/// ```
pub fn resolve_decrease(source: (u32, u32), bounds: (u32, u32)) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if max_w >= src_w && max_h >= src_h {
        return None;
    }

    let aspect = src_w as f64 / src_h as f64;
    let (box_w, box_h) = (max_w as f64, max_h as f64);

    if box_w / box_h >= aspect {
        // Box is relatively wider: height is the binding edge
        let w = round_aspect(box_h * aspect, |n| (aspect - n / box_h).abs());
        Some((w, max_h))
    } else {
        // Box is relatively taller: width is the binding edge
        let h = round_aspect(box_w / aspect, |n| {
            if n == 0.0 {
                0.0
            } else {
                (aspect - box_w / n).abs()
            }
        });
        Some((max_w, h))
    }
}

/// Target dimensions for a decrease request, or `None` when skipped.
pub fn plan_decrease(source: (u32, u32), request: DecreaseRequest) -> Option<(u32, u32)> {
    request
        .bounds()
        .and_then(|bounds| resolve_decrease(source, bounds))
}

/// Validate a crop rectangle against the source bounds.
///
/// Requires `left < right <= width` and `upper < lower <= height`. Invalid
/// rectangles are reported, never clamped.
pub fn validate_crop(source: (u32, u32), rect: CropRect) -> Result<(), InvalidCropBounds> {
    let (src_w, src_h) = source;
    let horizontal_ok = rect.left < rect.right && rect.right <= src_w;
    let vertical_ok = rect.upper < rect.lower && rect.lower <= src_h;

    if horizontal_ok && vertical_ok {
        Ok(())
    } else {
        Err(InvalidCropBounds {
            rect,
            source_width: src_w,
            source_height: src_h,
        })
    }
}

/// Canvas size for a side-by-side merge.
pub fn merge_canvas(first: (u32, u32), second: (u32, u32)) -> (u64, u64) {
    (
        u64::from(first.0) + u64::from(second.0),
        u64::from(first.1.max(second.1)),
    )
}

/// Bounding box of a `width`x`height` raster rotated by `degrees`.
///
/// Multiples of 90° are exact; other angles round outward so every source
/// pixel lands on the canvas.
pub fn rotated_canvas(source: (u32, u32), degrees: f64) -> (u64, u64) {
    let (w, h) = (f64::from(source.0), f64::from(source.1));
    let radians = degrees.to_radians();
    // Trim float noise so 90° does not become 601x801
    let cos = (radians.cos() * 1e9).round() / 1e9;
    let sin = (radians.sin() * 1e9).round() / 1e9;

    let out_w = (w * cos.abs() + h * sin.abs()).ceil() as u64;
    let out_h = (w * sin.abs() + h * cos.abs()).ceil() as u64;
    (out_w.max(1), out_h.max(1))
}
