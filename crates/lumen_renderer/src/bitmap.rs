//! Image file output.
//!
//! The native format is an uncompressed 24-bit BMP: a 14-byte file header,
//! a 40-byte info header with a negative height (rows stored top-down), then
//! BGR pixel rows each zero-padded to a multiple of 4 bytes. All fields are
//! little-endian. PNG output goes through the `image` crate.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{PixelBuffer, BYTES_PER_PIXEL};
use log::info;
use thiserror::Error;

/// Errors that can occur while writing an image.
#[derive(Error, Debug)]
pub enum BitmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Image of {width}x{height} pixels is too large for a bitmap")]
    TooLarge { width: u32, height: u32 },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

pub type BitmapResult<T> = Result<T, BitmapError>;

/// Size of the file header plus the info header.
pub const BMP_HEADER_SIZE: u32 = 14 + 40;

const INFO_HEADER_SIZE: u32 = 40;
const BITS_PER_PIXEL: u16 = 24;
/// 72 DPI
const PIXELS_PER_METER: i32 = 2835;

/// Bytes in one stored row, rounded up to a multiple of 4, or `None` if
/// the row does not fit in a `u32`.
pub fn padded_row_size(width: u32) -> Option<u32> {
    width
        .checked_mul(BYTES_PER_PIXEL as u32)
        .and_then(|bytes| bytes.checked_next_multiple_of(4))
}

/// Header field values derived from the image dimensions.
struct BmpLayout {
    width: i32,
    height: i32,
    row_size: u32,
    image_size: u32,
    file_size: u32,
}

impl BmpLayout {
    fn new(width: u32, height: u32) -> BitmapResult<Self> {
        let too_large = || BitmapError::TooLarge { width, height };

        let signed_width = i32::try_from(width).map_err(|_| too_large())?;
        let signed_height = i32::try_from(height).map_err(|_| too_large())?;
        let row_size = padded_row_size(width).ok_or_else(too_large)?;
        let image_size = row_size.checked_mul(height).ok_or_else(too_large)?;
        let file_size = image_size
            .checked_add(BMP_HEADER_SIZE)
            .ok_or_else(too_large)?;

        Ok(Self {
            width: signed_width,
            height: signed_height,
            row_size,
            image_size,
            file_size,
        })
    }

    fn header(&self) -> [u8; BMP_HEADER_SIZE as usize] {
        let mut header = [0u8; BMP_HEADER_SIZE as usize];
        let fields: [&[u8]; 16] = [
            // File header
            b"BM",
            &self.file_size.to_le_bytes(),
            &0u16.to_le_bytes(),
            &0u16.to_le_bytes(),
            &BMP_HEADER_SIZE.to_le_bytes(),
            // Info header
            &INFO_HEADER_SIZE.to_le_bytes(),
            &self.width.to_le_bytes(),
            // Negative height marks top-down row order
            &(-self.height).to_le_bytes(),
            &1u16.to_le_bytes(),
            &BITS_PER_PIXEL.to_le_bytes(),
            &0u32.to_le_bytes(),
            &self.image_size.to_le_bytes(),
            &PIXELS_PER_METER.to_le_bytes(),
            &PIXELS_PER_METER.to_le_bytes(),
            &0u32.to_le_bytes(),
            &0u32.to_le_bytes(),
        ];

        let mut offset = 0;
        for field in fields {
            header[offset..offset + field.len()].copy_from_slice(field);
            offset += field.len();
        }
        debug_assert_eq!(offset, header.len());
        header
    }
}

/// Write `image` as a 24-bit top-down BMP.
pub fn write_bmp<W: Write>(writer: &mut W, image: &PixelBuffer) -> BitmapResult<()> {
    let layout = BmpLayout::new(image.width(), image.height())?;
    write_with_layout(writer, image, &layout)
}

fn write_with_layout<W: Write>(
    writer: &mut W,
    image: &PixelBuffer,
    layout: &BmpLayout,
) -> BitmapResult<()> {
    writer.write_all(&layout.header())?;

    let stride = image.width() as usize * BYTES_PER_PIXEL;
    let padding = [0u8; 3];
    let padding = &padding[..layout.row_size as usize - stride];

    for y in 0..image.height() {
        writer.write_all(image.row(y))?;
        writer.write_all(padding)?;
    }

    writer.flush()?;
    Ok(())
}

/// Save `image` as a BMP file at `path`.
///
/// The dimensions are checked before the file is created, so an image too
/// large for the format leaves nothing on disk.
pub fn save_bmp(path: impl AsRef<Path>, image: &PixelBuffer) -> BitmapResult<()> {
    let path = path.as_ref();
    let layout = BmpLayout::new(image.width(), image.height())?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_with_layout(&mut writer, image, &layout)?;
    info!("Saved {}x{} bitmap to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Save `image` as a PNG file at `path`.
pub fn save_png(path: impl AsRef<Path>, image: &PixelBuffer) -> BitmapResult<()> {
    let path = path.as_ref();
    image::save_buffer_with_format(
        path,
        &image.to_rgb(),
        image.width(),
        image.height(),
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )?;
    info!("Saved {}x{} PNG to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Save `image`, choosing the format from the file extension
/// (`.bmp` or `.png`, case-insensitive).
pub fn save_image(path: impl AsRef<Path>, image: &PixelBuffer) -> BitmapResult<()> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("bmp") => save_bmp(path, image),
        Some("png") => save_png(path, image),
        other => Err(BitmapError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}
