use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};

use crate::constants::JPEG_QUALITY;

/// JPEG magic bytes (FF D8 FF)
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
}

fn encode_jpeg(img: DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb_image = img.to_rgb8();
    let (width, height) = rgb_image.dimensions();

    let mut jpeg_data = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_data, quality)
        .encode(rgb_image.as_raw(), width, height, ExtendedColorType::Rgb8)
        .with_context(|| "Failed to encode JPEG")?;
    Ok(jpeg_data)
}

/// Returns the rendition as JPEG bytes.
/// JPEG input passes through untouched; any other raster the decoder knows is re-encoded.
pub fn coerce_to_jpeg(data: Vec<u8>, content_type: Option<&str>) -> Result<Vec<u8>> {
    if is_jpeg(&data) {
        return Ok(data);
    }

    let img = image::load_from_memory(&data).with_context(|| {
        format!(
            "Unsupported rendition content ({}, {} bytes)",
            content_type.unwrap_or("unknown type"),
            data.len()
        )
    })?;

    encode_jpeg(img, JPEG_QUALITY)
}
