//! # imgconv
//!
//! On-demand raster image transformations over in-memory buffers: format
//! conversion, resizing, fit-within-box downscaling, cropping, side-by-side
//! merging, and flip/rotate.
//!
//! # Architecture
//!
//! ```text
//! caller ─▶ Engine ─┬─▶ format registry      (token → canonical format)
//!                   ├─▶ calculations         (target geometry, crop checks)
//!                   └─▶ ImageBackend         (decode → pixel work → encode)
//! ```
//!
//! The engine knows nothing about HTTP, files or sessions. It takes encoded
//! bytes plus a few scalars and returns encoded bytes or an [`EngineError`].
//! The bundled CLI is one such caller; an HTTP service would be another.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Facade: size limit, format resolution, dispatch, error taxonomy |
//! | [`imaging`] | Format registry, geometry math, backend trait + `image` crate backend |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Request-scoped value types (`ImageBuffer`, `Transformed`, `ImageInfo`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stateless, Shareable Engine
//!
//! Every call decodes, transforms and encodes in one pass with no state kept
//! between calls. The only shared data are the immutable format and
//! transpose alias tables, so one [`Engine`] serves any number of threads
//! without locking.
//!
//! ## Size Check Before Decode
//!
//! Decoding allocates width × height × channels. The engine refuses inputs
//! above `limits.max_input_bytes` before the backend sees them.
//!
//! ## Observable Fallbacks
//!
//! An out-of-range crop, or a decrease with only one bound, re-encodes the
//! source unchanged rather than failing. The result carries a
//! [`GeometryOutcome`](types::GeometryOutcome) tag and a warning is logged,
//! so callers can tell a skipped request from an applied one.
//!
//! ## Backend Behind a Trait
//!
//! Library error types stop at [`imaging::ImageBackend`]. Operation logic is
//! tested against a recording mock; the `image`-crate backend is tested
//! against real encoded fixtures.

pub mod config;
pub mod engine;
pub mod imaging;
pub mod output;
pub mod types;

pub use engine::{Engine, EngineError, Operation, Output};

#[cfg(test)]
pub(crate) mod test_helpers;
