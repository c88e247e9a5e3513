//! Image transformation core: pure Rust, in-memory buffers only.
//!
//! | Operation | Geometry | Backend call |
//! |---|---|---|
//! | **Convert** | none | `convert` |
//! | **Resize** | [`resolve_resize`] + [`check_target`] | `resize` (Lanczos3) |
//! | **Decrease** | [`resolve_decrease`] | `resize`, or `convert` when skipped |
//! | **Crop** | [`validate_crop`] | `crop`, or `convert` when skipped |
//! | **Merge** | [`merge_canvas`] + [`check_target`] | `merge` (always PNG) |
//! | **Transpose** | [`rotated_canvas`] + [`check_target`] | `transpose` |
//! | **Inspect** | none | `inspect` |
//!
//! Resize, merge and free rotation can grow the raster; their targets go
//! through [`check_target`] against the output pixel limit before the
//! backend allocates anything.
//!
//! The module is split into:
//! - **Formats**: the token → canonical format registry
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
mod formats;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    InvalidCropBounds, TargetTooLarge, check_target, merge_canvas, plan_decrease,
    resolve_decrease, resolve_resize, rotated_canvas, validate_crop,
};
pub use formats::{
    DEFAULT_FORMAT_TOKEN, OutputFormat, UnknownFormat, accepted_tokens, resolve_format,
};
pub use operations::{CropPolicy, MERGE_FORMAT, OperationError};
pub use params::{
    CropParams, CropRect, DecreaseRequest, ResizeParams, ResizeRequest, TransposeKind,
    TransposeParams, UnknownTransposeMethod, transpose_methods,
};
pub use rust_backend::RustBackend;
