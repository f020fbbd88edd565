use std::{fs, fs::File, io::BufWriter, path::Path};

use ndarray::{Array3, ArrayView3};
use png::{BitDepth, ColorType, Decoder, Encoder};

use crate::error::IoError;

/// Writes the given PNG _(rgb8)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - The image data with shape `(height, width, 3)`.
pub fn write_image_png_rgb8(
    file_path: impl AsRef<Path>,
    image: ArrayView3<'_, u8>,
) -> Result<(), IoError> {
    let (height, width, channels) = image.dim();
    if channels != 3 {
        return Err(IoError::ShapeMismatch(format!(
            "expected 3 channels, got {channels}"
        )));
    }

    let image = image.as_standard_layout();
    let image_data = image
        .as_slice()
        .ok_or_else(|| IoError::PngEncodingError("image is not contiguous".to_string()))?;

    let file = File::create(file_path)?;

    let mut encoder = Encoder::new(BufWriter::new(file), width as u32, height as u32);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(image_data)
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    Ok(())
}

/// Read a PNG image with three channels (rgb8).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// The image data with shape `(height, width, 3)`.
pub fn read_image_png_rgb8(file_path: impl AsRef<Path>) -> Result<Array3<u8>, IoError> {
    // verify the file exists
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let file = fs::File::open(file_path)?;
    let mut reader = Decoder::new(file)
        .read_info()
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    if info.color_type != ColorType::Rgb || info.bit_depth != BitDepth::Eight {
        return Err(IoError::PngDecodeError(format!(
            "expected rgb8, got {:?} {:?}",
            info.color_type, info.bit_depth
        )));
    }

    buf.truncate(info.buffer_size());
    Array3::from_shape_vec((info.height as usize, info.width as usize, 3), buf)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))
}
