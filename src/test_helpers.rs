//! Shared test utilities: synthetic encoded images built in memory.
//!
//! Every fixture is generated with the `image` crate's own encoders so tests
//! need no files on disk.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = png_buffer(800, 600);
//! let encoded = backend.convert(&source, OutputFormat::Jpeg).unwrap();
//! assert_eq!(decoded_dimensions(&encoded.bytes), (800, 600));
//! ```

use crate::types::ImageBuffer;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Fixture builders
// =========================================================================

fn encode_fixture(image: &DynamicImage, format: ImageFormat) -> ImageBuffer {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    ImageBuffer::new(bytes)
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

/// RGB PNG with a position-dependent pattern.
pub fn png_buffer(width: u32, height: u32) -> ImageBuffer {
    gradient_png_buffer(width, height)
}

/// RGB PNG where every pixel is distinguishable by its coordinates.
pub fn gradient_png_buffer(width: u32, height: u32) -> ImageBuffer {
    encode_fixture(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}

/// RGB PNG filled with one colour.
pub fn solid_png_buffer(width: u32, height: u32, color: [u8; 3]) -> ImageBuffer {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    encode_fixture(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// RGBA PNG with a half-transparent alpha channel.
pub fn rgba_png_buffer(width: u32, height: u32) -> ImageBuffer {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 128])
    });
    encode_fixture(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Baseline RGB JPEG.
pub fn jpeg_buffer(width: u32, height: u32) -> ImageBuffer {
    encode_fixture(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Jpeg)
}

/// Uncompressed RGB TIFF (decodable, but not an output format).
pub fn tiff_buffer(width: u32, height: u32) -> ImageBuffer {
    encode_fixture(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Tiff)
}

/// Deterministic bytes that are not any image container.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

// =========================================================================
// Output inspection
// =========================================================================

/// Decode encoded output bytes. Panics if they are not a valid image.
pub fn decode_pixels(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap_or_else(|e| panic!("output does not decode: {e}"))
}

/// Dimensions of encoded output bytes.
pub fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = decode_pixels(bytes);
    (img.width(), img.height())
}

/// Container format sniffed from encoded output bytes.
pub fn sniff(bytes: &[u8]) -> ImageFormat {
    image::guess_format(bytes).unwrap_or_else(|e| panic!("unknown container: {e}"))
}
