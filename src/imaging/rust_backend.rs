//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff + decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader::with_guessed_format` |
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Merge | `imageops::replace` onto an `RgbImage` canvas, inputs decoded via `rayon::join` |
//! | Flip / quarter turns | `fliph`, `flipv`, `rotate90/180/270` |
//! | Free rotation | nearest-neighbour inverse mapping onto an expanded canvas |
//! | Encode | `DynamicImage::write_to` with the encoder's default settings |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{fit_dimensions, merge_canvas, rotated_canvas};
use super::formats::{OutputFormat, input_format_name};
use super::params::{CropParams, ResizeParams, TransposeKind, TransposeParams};
use crate::types::{EncodedImage, ImageBuffer, ImageInfo};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Pixel, RgbImage};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded raster together with the container it came from.
///
/// Owned by the backend call that decoded it and dropped when that call
/// returns; the pixel memory never outlives one operation.
struct DecodedImage {
    pixels: DynamicImage,
    source_format: ImageFormat,
}

/// Open a reader over the buffer with the container sniffed from content.
fn sniffed_reader(
    input: &ImageBuffer,
) -> Result<(ImageReader<Cursor<&[u8]>>, ImageFormat), BackendError> {
    let reader = ImageReader::new(Cursor::new(input.as_bytes()))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(format!("Failed to read image header: {e}")))?;
    let format = reader
        .format()
        .ok_or_else(|| BackendError::Decode("Unrecognized image container".to_string()))?;

    if let Some(hint) = input.content_type() {
        let sniffed = input_format_name(format).to_ascii_lowercase();
        if !hint.to_ascii_lowercase().contains(&sniffed) {
            log::debug!("declared content type {hint} ignored, sniffed {sniffed}");
        }
    }

    Ok((reader, format))
}

/// Decode an encoded buffer into a raster.
fn decode(input: &ImageBuffer) -> Result<DecodedImage, BackendError> {
    let (reader, source_format) = sniffed_reader(input)?;
    let pixels = reader.decode().map_err(|e| {
        BackendError::Decode(format!(
            "Failed to decode {}: {e}",
            input_format_name(source_format)
        ))
    })?;
    log::debug!(
        "decoded {} {}x{} ({:?})",
        input_format_name(source_format),
        pixels.width(),
        pixels.height(),
        pixels.color()
    );
    Ok(DecodedImage {
        pixels,
        source_format,
    })
}

/// Encode a raster with the target format's default encoder settings.
///
/// Rasters the target cannot hold are rejected rather than converted: an
/// alpha channel is never silently dropped for JPEG.
fn encode(image: &DynamicImage, format: OutputFormat) -> Result<EncodedImage, BackendError> {
    if format == OutputFormat::Jpeg && image.color().has_alpha() {
        return Err(BackendError::Encode {
            format,
            reason: format!("{:?} has an alpha channel", image.color()),
        });
    }

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format.to_image_format())
        .map_err(|e| BackendError::Encode {
            format,
            reason: e.to_string(),
        })?;
    Ok(EncodedImage { bytes, format })
}

/// A free rotation and the expanded canvas it lands on.
#[derive(Debug, Clone, Copy)]
struct Rotation {
    degrees: f64,
    canvas: (u32, u32),
}

/// Rotate counter-clockwise by `degrees`, expanding the canvas to fit.
///
/// Quarter turns are exact; other angles sample nearest-neighbour and leave
/// uncovered canvas zero-filled.
fn rotate_expand(image: DynamicImage, degrees: f64) -> Result<DynamicImage, BackendError> {
    let turn = degrees.rem_euclid(360.0);
    if turn == 0.0 {
        return Ok(image);
    }
    if turn == 90.0 {
        return Ok(image.rotate270());
    }
    if turn == 180.0 {
        return Ok(image.rotate180());
    }
    if turn == 270.0 {
        return Ok(image.rotate90());
    }

    let source = (image.width(), image.height());
    let canvas = fit_dimensions(rotated_canvas(source, turn)).ok_or_else(|| {
        BackendError::ProcessingFailed(format!(
            "{}x{} rotated by {turn} degrees does not fit a raster",
            source.0, source.1
        ))
    })?;
    let rot = Rotation {
        degrees: turn,
        canvas,
    };

    Ok(match &image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(rotate_buffer(buf, rot)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(rotate_buffer(buf, rot)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(rotate_buffer(buf, rot)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(rotate_buffer(buf, rot)),
        DynamicImage::ImageLuma16(buf) => DynamicImage::ImageLuma16(rotate_buffer(buf, rot)),
        DynamicImage::ImageLumaA16(buf) => DynamicImage::ImageLumaA16(rotate_buffer(buf, rot)),
        DynamicImage::ImageRgb16(buf) => DynamicImage::ImageRgb16(rotate_buffer(buf, rot)),
        DynamicImage::ImageRgba16(buf) => DynamicImage::ImageRgba16(rotate_buffer(buf, rot)),
        DynamicImage::ImageRgb32F(buf) => DynamicImage::ImageRgb32F(rotate_buffer(buf, rot)),
        DynamicImage::ImageRgba32F(buf) => DynamicImage::ImageRgba32F(rotate_buffer(buf, rot)),
        other => DynamicImage::ImageRgba8(rotate_buffer(&other.to_rgba8(), rot)),
    })
}

fn rotate_buffer<P>(
    src: &image::ImageBuffer<P, Vec<P::Subpixel>>,
    rot: Rotation,
) -> image::ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    let (src_w, src_h) = src.dimensions();
    let (out_w, out_h) = rot.canvas;
    let (sin, cos) = rot.degrees.to_radians().sin_cos();
    let (src_cx, src_cy) = (src_w as f64 / 2.0, src_h as f64 / 2.0);
    let (out_cx, out_cy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

    let mut out = image::ImageBuffer::new(out_w, out_h);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        // Inverse map the destination pixel centre back into the source
        let dx = x as f64 + 0.5 - out_cx;
        let dy = y as f64 + 0.5 - out_cy;
        let sx = dx * cos - dy * sin + src_cx;
        let sy = dx * sin + dy * cos + src_cy;
        if sx >= 0.0 && sy >= 0.0 && sx < src_w as f64 && sy < src_h as f64 {
            *pixel = *src.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

fn apply_transpose(image: DynamicImage, kind: TransposeKind) -> DynamicImage {
    match kind {
        TransposeKind::FlipHorizontal => image.fliph(),
        TransposeKind::FlipVertical => image.flipv(),
        // Quarter turns are counter-clockwise; the image crate turns clockwise
        TransposeKind::Rotate90 => image.rotate270(),
        TransposeKind::Rotate180 => image.rotate180(),
        TransposeKind::Rotate270 => image.rotate90(),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, input: &ImageBuffer) -> Result<Dimensions, BackendError> {
        let (reader, _) = sniffed_reader(input)?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn inspect(&self, input: &ImageBuffer) -> Result<ImageInfo, BackendError> {
        let (reader, source_format) = sniffed_reader(input)?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(format!("Failed to open decoder: {e}")))?;

        let color = decoder.color_type();
        let mut metadata = BTreeMap::new();
        metadata.insert("color_type".to_string(), format!("{color:?}"));
        metadata.insert("has_alpha".to_string(), color.has_alpha().to_string());
        metadata.insert(
            "bits_per_pixel".to_string(),
            color.bits_per_pixel().to_string(),
        );
        // Ancillary chunks are optional; a decoder that cannot read them
        // still yields a usable snapshot
        if let Ok(Some(icc)) = decoder.icc_profile() {
            metadata.insert("icc_profile".to_string(), format!("{} bytes", icc.len()));
        }
        if let Ok(Some(exif)) = decoder.exif_metadata() {
            metadata.insert("exif".to_string(), format!("{} bytes", exif.len()));
        }

        // Full decode so a truncated body is reported, not described
        let pixels = DynamicImage::from_decoder(decoder).map_err(|e| {
            BackendError::Decode(format!(
                "Failed to decode {}: {e}",
                input_format_name(source_format)
            ))
        })?;

        Ok(ImageInfo {
            format: input_format_name(source_format),
            width: pixels.width(),
            height: pixels.height(),
            metadata,
        })
    }

    fn convert(
        &self,
        input: &ImageBuffer,
        format: OutputFormat,
    ) -> Result<EncodedImage, BackendError> {
        let decoded = decode(input)?;
        log::debug!(
            "convert {} → {format}",
            input_format_name(decoded.source_format)
        );
        encode(&decoded.pixels, format)
    }

    fn resize(
        &self,
        input: &ImageBuffer,
        params: &ResizeParams,
    ) -> Result<EncodedImage, BackendError> {
        let decoded = decode(input)?;
        let resized = decoded
            .pixels
            .resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode(&resized, params.format)
    }

    fn crop(&self, input: &ImageBuffer, params: &CropParams) -> Result<EncodedImage, BackendError> {
        let decoded = decode(input)?;
        let rect = params.rect;
        let cropped = decoded
            .pixels
            .crop_imm(rect.left, rect.upper, rect.width(), rect.height());
        encode(&cropped, params.format)
    }

    fn merge(
        &self,
        first: &ImageBuffer,
        second: &ImageBuffer,
        format: OutputFormat,
    ) -> Result<EncodedImage, BackendError> {
        let (first, second) = rayon::join(|| decode(first), || decode(second));
        let (first, second) = (first?.pixels.to_rgb8(), second?.pixels.to_rgb8());

        let canvas = merge_canvas(first.dimensions(), second.dimensions());
        let (width, height) = fit_dimensions(canvas).ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "merged canvas {}x{} does not fit a raster",
                canvas.0, canvas.1
            ))
        })?;
        // RgbImage::new is zero-filled: black background
        let mut canvas = RgbImage::new(width, height);
        image::imageops::replace(&mut canvas, &first, 0, 0);
        image::imageops::replace(&mut canvas, &second, i64::from(first.width()), 0);

        encode(&DynamicImage::ImageRgb8(canvas), format)
    }

    fn transpose(
        &self,
        input: &ImageBuffer,
        params: &TransposeParams,
    ) -> Result<EncodedImage, BackendError> {
        let decoded = decode(input)?;
        let mut pixels = decoded.pixels;

        if let Some(angle) = params.angle.filter(|a| *a != 0.0) {
            if !angle.is_finite() {
                return Err(BackendError::ProcessingFailed(format!(
                    "rotation angle {angle} is not finite"
                )));
            }
            pixels = rotate_expand(pixels, angle)?;
        }
        if let Some(kind) = params.kind {
            pixels = apply_transpose(pixels, kind);
        }

        encode(&pixels, params.format)
    }
}
