//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what pixel work is needed) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock)
//! without changing operation logic.
//!
//! ## Types
//!
//! - [`ResizeRequest`] / [`DecreaseRequest`] / [`CropRect`]: caller geometry.
//! - [`TransposeKind`]: flip/rotate variants plus the transport alias table.
//! - [`ResizeParams`], [`CropParams`], [`TransposeParams`]: fully resolved
//!   instructions for the backend.

use super::formats::OutputFormat;
use thiserror::Error;

/// Caller geometry for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeRequest {
    ExactSize(u32, u32),
    WidthOnly(u32),
    HeightOnly(u32),
    NoResize,
}

impl ResizeRequest {
    /// Build from optional transport values. Zero counts as absent.
    pub fn from_dimensions(width: Option<u32>, height: Option<u32>) -> Self {
        match (width.filter(|w| *w > 0), height.filter(|h| *h > 0)) {
            (Some(w), Some(h)) => ResizeRequest::ExactSize(w, h),
            (Some(w), None) => ResizeRequest::WidthOnly(w),
            (None, Some(h)) => ResizeRequest::HeightOnly(h),
            (None, None) => ResizeRequest::NoResize,
        }
    }
}

/// Caller bounds for a fit-within-box decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecreaseRequest {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl DecreaseRequest {
    pub fn new(max_width: Option<u32>, max_height: Option<u32>) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Both bounds, or `None` if either is absent or zero.
    pub fn bounds(self) -> Option<(u32, u32)> {
        match (self.max_width, self.max_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Crop rectangle in source pixel coordinates; `right` and `lower` are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub upper: u32,
    pub right: u32,
    pub lower: u32,
}

impl CropRect {
    pub fn new(left: u32, upper: u32, right: u32, lower: u32) -> Self {
        Self {
            left,
            upper,
            right,
            lower,
        }
    }

    pub fn width(self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(self) -> u32 {
        self.lower.saturating_sub(self.upper)
    }
}

/// Flip or quarter-turn applied after the optional free rotation.
///
/// Rotations are counter-clockwise, the same direction as
/// [`TransposeParams::angle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransposeKind {
    FlipHorizontal,
    FlipVertical,
    Rotate90,
    Rotate180,
    Rotate270,
}

/// Transport method name → transpose kind.
///
/// `left`/`right` both flip horizontally and `top`/`bottom` both flip
/// vertically. The transport layer has always named them this way.
const TRANSPOSE_ALIASES: &[(&str, TransposeKind)] = &[
    ("left", TransposeKind::FlipHorizontal),
    ("right", TransposeKind::FlipHorizontal),
    ("top", TransposeKind::FlipVertical),
    ("bottom", TransposeKind::FlipVertical),
    ("rotate_90", TransposeKind::Rotate90),
    ("rotate_180", TransposeKind::Rotate180),
    ("rotate_270", TransposeKind::Rotate270),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown transpose method '{method}' (accepted: {})", transpose_methods().join(", "))]
pub struct UnknownTransposeMethod {
    pub method: String,
}

/// All accepted transpose method names, in table order.
pub fn transpose_methods() -> Vec<&'static str> {
    TRANSPOSE_ALIASES.iter().map(|(name, _)| *name).collect()
}

impl TransposeKind {
    /// Resolve a transport method name. Matching is exact.
    pub fn from_alias(method: &str) -> Result<Self, UnknownTransposeMethod> {
        TRANSPOSE_ALIASES
            .iter()
            .find(|(name, _)| *name == method)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| UnknownTransposeMethod {
                method: method.to_string(),
            })
    }
}

/// Parameters for a resample to exact dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

/// Parameters for a crop that has already been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropParams {
    pub rect: CropRect,
    pub format: OutputFormat,
}

/// Parameters for rotate/flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransposeParams {
    /// Free rotation in degrees, counter-clockwise, canvas expanded to fit.
    pub angle: Option<f64>,
    pub kind: Option<TransposeKind>,
    pub format: OutputFormat,
}
