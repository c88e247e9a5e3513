//! Format registry: user-supplied tokens → canonical output formats.
//!
//! | Token(s) (any case) | Canonical | Media type |
//! |---|---|---|
//! | `jpg`, `jpeg` | `JPEG` | `image/jpeg` |
//! | `png` | `PNG` | `image/png` |
//! | `webp` | `WEBP` | `image/webp` |
//!
//! The table is the single source of truth for accepted tokens. Every
//! canonical format listed here has an encoder in
//! [`RustBackend`](super::rust_backend::RustBackend).

use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Token used when the caller does not name a target format.
pub const DEFAULT_FORMAT_TOKEN: &str = "JPG";

/// Canonical encoder format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Canonical identifier, e.g. `JPEG`.
    pub fn canonical_name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::WebP => "WEBP",
        }
    }

    pub fn media_type(self) -> String {
        format!("image/{}", self.canonical_name().to_ascii_lowercase())
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Token did not match any registry entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown image format '{token}' (accepted: {})", accepted_tokens().join(", "))]
pub struct UnknownFormat {
    pub token: String,
}

/// Lower-case token → canonical format. Lookup is case-insensitive.
const FORMAT_ALIASES: &[(&str, OutputFormat)] = &[
    ("jpg", OutputFormat::Jpeg),
    ("jpeg", OutputFormat::Jpeg),
    ("png", OutputFormat::Png),
    ("webp", OutputFormat::WebP),
];

static ACCEPTED_TOKENS: LazyLock<Vec<&'static str>> =
    LazyLock::new(|| FORMAT_ALIASES.iter().map(|(token, _)| *token).collect());

/// All accepted tokens in their lower-case spelling.
pub fn accepted_tokens() -> &'static [&'static str] {
    &ACCEPTED_TOKENS
}

/// Resolve a format token to its canonical format.
///
/// ```
/// # use imgconv::imaging::{resolve_format, OutputFormat};
/// assert_eq!(resolve_format("JPG").unwrap(), OutputFormat::Jpeg);
/// assert_eq!(resolve_format("webp").unwrap(), OutputFormat::WebP);
/// assert!(resolve_format("bmp").is_err());
/// ```
pub fn resolve_format(token: &str) -> Result<OutputFormat, UnknownFormat> {
    let trimmed = token.trim();
    FORMAT_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|(_, format)| *format)
        .ok_or_else(|| UnknownFormat {
            token: token.to_string(),
        })
}

/// Canonical display name for a sniffed input container.
///
/// Input formats are wider than output formats (TIFF decodes but does not
/// encode), so this works on the library's format type.
pub(crate) fn input_format_name(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG".to_string(),
        image::ImageFormat::Png => "PNG".to_string(),
        image::ImageFormat::WebP => "WEBP".to_string(),
        image::ImageFormat::Tiff => "TIFF".to_string(),
        other => format!("{other:?}").to_ascii_uppercase(),
    }
}
