use std::path::Path;

use thiserror::Error;

pub const FORMAT_VERSION_MAJOR: u32 = 1;
pub const FORMAT_VERSION_MINOR: u32 = 0;

/// Side length of one codec block, in pixels.
pub const BLOCK_SIDE: usize = 8;
/// Side length of one luma tile (four luma blocks plus one chroma block pair).
pub const TILE_SIDE: usize = 16;
/// Fixed file header: width and height as little-endian u16.
pub const HEADER_SIZE: usize = 4;

#[derive(Error, Debug)]
pub enum StupError {
    #[error("invalid image dimensions {width}x{height} (must be positive multiples of 16)")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("unexpected end of input while reading the file header")]
    TruncatedHeader,
    #[error("unexpected end of input while reading block {0}")]
    TruncatedBlock(usize),
    #[error("unsupported format")]
    UnsupportedFormat,
    #[error("invalid data")]
    InvalidData,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("baseline codec error: {0}")]
    Baseline(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, StupError>;

pub mod bitpack;
pub mod block;
pub mod color;
pub mod container;
pub mod filters;
pub mod jpeg;
pub mod pgm;
pub mod pixmap;
pub mod resample;

pub use block::BlockMode;
pub use container::{decode, encode};
pub use pixmap::{Image, PixelFormat, Plane};

/// Encode a baseline image file (`.jpg`/`.jpeg` or `.pgm`) into a STUP file.
pub fn encode_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let img = load_baseline(input.as_ref())?;
    let mut out = std::io::BufWriter::new(std::fs::File::create(output)?);
    encode(&img, &mut out)
}

/// Decode a STUP file and write it back out through the baseline codec.
///
/// The output format is chosen by extension: `.pgm` stores the luma plane
/// only, anything else goes through the JPEG encoder as RGB.
pub fn decode_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let mut reader = std::io::BufReader::new(std::fs::File::open(input)?);
    let img = decode(&mut reader)?;
    save_baseline(&img, output.as_ref())
}

fn load_baseline(path: &Path) -> Result<Image> {
    match extension(path) {
        Some("pgm") => {
            let plane = pgm::Pgm::open(path)?;
            Ok(plane.into_image())
        }
        _ => jpeg::load_jpeg(path),
    }
}

fn save_baseline(img: &Image, path: &Path) -> Result<()> {
    match extension(path) {
        Some("pgm") => {
            let gray = color::convert(img, PixelFormat::Gray);
            pgm::Pgm::from_image(&gray)?.save(path)
        }
        _ => {
            let rgb = color::convert(img, PixelFormat::Rgb);
            jpeg::save_jpeg(&rgb, path, jpeg::DEFAULT_QUALITY)
        }
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}
