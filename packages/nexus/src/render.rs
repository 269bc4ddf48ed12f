use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use ndarray::Array2;

use crate::error::RenderError;

/// Encode an 8-bit grayscale plane as PNG.
pub fn encode_png(plane: &Array2<u8>) -> Result<Vec<u8>, RenderError> {
    let (rows, cols) = plane.dim();
    if rows == 0 || cols == 0 {
        return Err(RenderError::EmptyImage);
    }
    let (Ok(height), Ok(width)) = (u32::try_from(rows), u32::try_from(cols)) else {
        return Err(RenderError::TooLarge { rows, cols });
    };

    // Row-major regardless of the array's memory layout.
    let pixels: Vec<u8> = plane.iter().copied().collect();

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ExtendedColorType::L8)?;
    Ok(png)
}

/// Encode a plane as PNG and return it base64-encoded for embedding.
pub fn encode_png_base64(plane: &Array2<u8>) -> Result<String, RenderError> {
    Ok(STANDARD.encode(encode_png(plane)?))
}
