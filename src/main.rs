use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use imgconv::imaging::CropRect;
use imgconv::types::{ImageBuffer, Transformed};
use imgconv::{Engine, EngineError, config, output};
use std::error::Error;
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imgconv")]
#[command(about = "Convert, resize, crop, merge and rotate raster images")]
#[command(long_about = "\
Convert, resize, crop, merge and rotate raster images

Inputs are sniffed from their content (JPEG, PNG, WebP, TIFF); the file
extension is only a hint. Output formats are chosen with --format:

  jpg, jpeg   → JPEG
  png         → PNG
  webp        → WEBP (lossless)

Tokens are case-insensitive. Without --format the configured default is used
(JPG unless config.toml says otherwise). merge always writes PNG.

Run 'imgconv gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Command,
}

/// Input file, output file and target format shared by single-image commands.
#[derive(Args, Clone)]
struct ImageArgs {
    /// Source image
    input: PathBuf,

    /// Where to write the result
    #[arg(short, long)]
    output: PathBuf,

    /// Target format token (jpg, jpeg, png, webp)
    #[arg(short, long)]
    format: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Re-encode in another format
    Convert(ImageArgs),
    /// Resize; a single dimension keeps the aspect ratio
    Resize {
        #[command(flatten)]
        image: ImageArgs,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
    /// Shrink to fit within width x height, never enlarging
    Decrease {
        #[command(flatten)]
        image: ImageArgs,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
    /// Cut out the rectangle [left, right) x [upper, lower)
    Crop {
        #[command(flatten)]
        image: ImageArgs,
        #[arg(long, default_value_t = 0)]
        left: u32,
        #[arg(long, default_value_t = 0)]
        upper: u32,
        #[arg(long, default_value_t = 100)]
        right: u32,
        #[arg(long, default_value_t = 100)]
        lower: u32,
    },
    /// Place two images side by side (always PNG)
    Merge {
        first: PathBuf,
        second: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Rotate by an angle and/or flip
    Transpose {
        #[command(flatten)]
        image: ImageArgs,
        /// left, right, top, bottom, rotate_90, rotate_180 or rotate_270
        #[arg(short, long)]
        method: Option<String>,
        /// Degrees counter-clockwise, applied before --method
        #[arg(long, allow_negative_numbers = true)]
        angle: Option<f64>,
    },
    /// Show format, dimensions and metadata
    Info {
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .format_timestamp(None)
        .init();

    let engine_config = config::load_config_or_default(cli.config.as_deref())?;
    let engine = Engine::new(engine_config);

    match cli.command {
        Command::Convert(args) => {
            let input = read_input(&engine, &args.input)?;
            let result = engine.convert(&input, args.format.as_deref())?;
            write_output("convert", &args.input, &args.output, &result)?;
        }
        Command::Resize {
            image: args,
            width,
            height,
        } => {
            let input = read_input(&engine, &args.input)?;
            let result = engine.resize(&input, args.format.as_deref(), width, height)?;
            write_output("resize", &args.input, &args.output, &result)?;
        }
        Command::Decrease {
            image: args,
            width,
            height,
        } => {
            let input = read_input(&engine, &args.input)?;
            let result = engine.decrease(&input, args.format.as_deref(), width, height)?;
            write_output("decrease", &args.input, &args.output, &result)?;
        }
        Command::Crop {
            image: args,
            left,
            upper,
            right,
            lower,
        } => {
            let input = read_input(&engine, &args.input)?;
            let rect = CropRect::new(left, upper, right, lower);
            let result = engine.crop(&input, args.format.as_deref(), rect)?;
            write_output("crop", &args.input, &args.output, &result)?;
        }
        Command::Merge {
            first,
            second,
            output,
        } => {
            let first_input = read_input(&engine, &first)?;
            let second_input = read_input(&engine, &second)?;
            let result = engine.merge(&first_input, &second_input)?;
            write_output("merge", &first, &output, &result)?;
        }
        Command::Transpose {
            image: args,
            method,
            angle,
        } => {
            let input = read_input(&engine, &args.input)?;
            let result =
                engine.transpose(&input, args.format.as_deref(), angle, method.as_deref())?;
            write_output("transpose", &args.input, &args.output, &result)?;
        }
        Command::Info { input: path, json } => {
            let input = read_input(&engine, &path)?;
            let info = engine.inspect(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_info(&path, &info);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read a whole file, tagging it with the media type its extension implies.
///
/// Files over `limits.max_input_bytes` are refused from their metadata, so
/// they are never loaded into memory.
fn read_input(engine: &Engine, path: &Path) -> Result<ImageBuffer, Box<dyn Error>> {
    let limit = engine.config().limits.max_input_bytes;
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(EngineError::PayloadTooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit,
        }
        .into());
    }

    let bytes = std::fs::read(path)?;
    let buffer = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            ImageBuffer::with_content_type(bytes, format!("image/{}", ext.to_lowercase()))
        }
        None => ImageBuffer::new(bytes),
    };
    Ok(buffer)
}

/// Dimensions from the header of encoded output, if it has a readable one.
fn encoded_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn write_output(
    operation: &str,
    input: &Path,
    output_path: &Path,
    result: &Transformed,
) -> std::io::Result<()> {
    std::fs::write(output_path, &result.image.bytes)?;
    let dimensions = encoded_dimensions(&result.image.bytes);
    output::print_transformed(operation, input, output_path, result, dimensions);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use imgconv::config::EngineConfig;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn engine_with_input_limit(max_input_bytes: u64) -> Engine {
        let mut config = EngineConfig::default();
        config.limits.max_input_bytes = max_input_bytes;
        Engine::new(config)
    }

    #[test]
    fn read_input_tags_extension_as_media_type() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.PNG");
        std::fs::write(&path, png_bytes(3, 2)).unwrap();

        let input = read_input(&Engine::default(), &path).unwrap();
        assert_eq!(input.content_type(), Some("image/png"));
    }

    #[test]
    fn read_input_refuses_oversized_file_from_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.bin");
        std::fs::write(&path, vec![0u8; 32]).unwrap();

        let err = read_input(&engine_with_input_limit(16), &path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::PayloadTooLarge {
                size: 32,
                limit: 16
            })
        ));
    }

    #[test]
    fn read_input_accepts_file_at_limit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exact.bin");
        std::fs::write(&path, vec![0u8; 16]).unwrap();

        let input = read_input(&engine_with_input_limit(16), &path).unwrap();
        assert_eq!(input.len(), 16);
    }

    #[test]
    fn encoded_dimensions_reads_header() {
        assert_eq!(encoded_dimensions(&png_bytes(7, 5)), Some((7, 5)));
        assert_eq!(encoded_dimensions(b"not an image"), None);
    }

    #[test]
    fn crop_defaults_cover_top_left_square() {
        let cli = Cli::try_parse_from(["imgconv", "crop", "in.png", "-o", "out.png"]).unwrap();
        let Command::Crop {
            left,
            upper,
            right,
            lower,
            ..
        } = cli.command
        else {
            panic!("expected crop");
        };
        assert_eq!((left, upper, right, lower), (0, 0, 100, 100));
    }
}
