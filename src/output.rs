//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Image operations
//!
//! ```text
//! resize photo.png → photo-small.jpg
//!     Format: JPEG (image/jpeg)
//!     Size: 400x300, 18342 bytes
//! ```
//!
//! Lenient fallbacks add a line so a skipped request is never silent:
//!
//! ```text
//!     Skipped: crop bounds outside the source, image re-encoded unchanged
//! ```
//!
//! ## Info
//!
//! ```text
//! photo.png
//!     Format: PNG
//!     Size: 800x600
//!     bits_per_pixel: 24
//!     color_type: Rgb8
//!     has_alpha: false
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::types::{ImageInfo, Transformed};
use std::path::Path;

/// Summary of an image-producing operation.
///
/// `dimensions` is the size of the written image when the caller knows it.
pub fn format_transformed(
    operation: &str,
    input: &Path,
    output: &Path,
    result: &Transformed,
    dimensions: Option<(u32, u32)>,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{operation} {} → {}",
        input.display(),
        output.display()
    )];
    lines.push(format!(
        "    Format: {} ({})",
        result.image.format,
        result.image.media_type()
    ));
    let bytes = result.image.bytes.len();
    match dimensions {
        Some((w, h)) => lines.push(format!("    Size: {w}x{h}, {bytes} bytes")),
        None => lines.push(format!("    Size: {bytes} bytes")),
    }
    if let Some(reason) = result.outcome.skip_reason() {
        lines.push(format!("    Skipped: {reason}, image re-encoded unchanged"));
    }
    lines
}

pub fn print_transformed(
    operation: &str,
    input: &Path,
    output: &Path,
    result: &Transformed,
    dimensions: Option<(u32, u32)>,
) {
    for line in format_transformed(operation, input, output, result, dimensions) {
        println!("{line}");
    }
}

/// Text rendering of an inspect result. Metadata keys are sorted.
pub fn format_info(input: &Path, info: &ImageInfo) -> Vec<String> {
    let mut lines = vec![
        input.display().to_string(),
        format!("    Format: {}", info.format),
        format!("    Size: {}x{}", info.width, info.height),
    ];
    lines.extend(
        info.metadata
            .iter()
            .map(|(key, value)| format!("    {key}: {value}")),
    );
    lines
}

pub fn print_info(input: &Path, info: &ImageInfo) {
    for line in format_info(input, info) {
        println!("{line}");
    }
}
