use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

use crate::error::{AppError, AppResult};

const MAX_WIDTH: u32 = 1200;
const MAX_HEIGHT: u32 = 1200;
const JPEG_QUALITY: u8 = 85;

#[derive(Debug)]
pub struct ProcessedImage {
    pub data: Vec<u8>,
    pub content_type: String,
    pub extension: String,
}

/// Splits a `data:<mime>;base64,<payload>` URL into its mime type and decoded bytes.
pub fn decode_data_url(url: &str) -> AppResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AppError::BadRequest("Expected a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::BadRequest("Malformed data URL".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::BadRequest("Data URL must be base64 encoded".to_string()))?;

    if !mime.starts_with("image/") {
        return Err(AppError::BadRequest(format!("Unsupported file type: {}", mime)));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 payload: {}", e)))?;

    Ok((mime.to_string(), bytes))
}

/// Decodes an uploaded image, shrinking it to fit 1200x1200 when larger.
pub fn process_image(data: &[u8], mime: &str) -> AppResult<ProcessedImage> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::BadRequest(format!("Failed to read image format: {}", e)))?
        .decode()
        .map_err(|e| AppError::BadRequest(format!("Failed to decode image: {}", e)))?;

    let (width, height) = (img.width(), img.height());

    let processed = if width > MAX_WIDTH || height > MAX_HEIGHT {
        let ratio = (MAX_WIDTH as f64 / width as f64).min(MAX_HEIGHT as f64 / height as f64);
        let new_width = ((width as f64 * ratio) as u32).max(1);
        let new_height = ((height as f64 * ratio) as u32).max(1);

        tracing::info!(
            "Resizing image from {}x{} to {}x{}",
            width,
            height,
            new_width,
            new_height
        );

        img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    encode_image(&processed, mime)
}

fn encode_image(img: &DynamicImage, mime: &str) -> AppResult<ProcessedImage> {
    let mut buffer = Vec::new();

    let (content_type, extension) = match mime {
        "image/png" | "image/webp" => {
            img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                .map_err(|e| AppError::Internal(format!("Failed to encode PNG: {}", e)))?;
            ("image/png", "png")
        }
        "image/gif" => {
            img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif)
                .map_err(|e| AppError::Internal(format!("Failed to encode GIF: {}", e)))?;
            ("image/gif", "gif")
        }
        _ => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
            encoder
                .encode_image(&rgb)
                .map_err(|e| AppError::Internal(format!("Failed to encode JPEG: {}", e)))?;
            ("image/jpeg", "jpg")
        }
    };

    Ok(ProcessedImage {
        data: buffer,
        content_type: content_type.to_string(),
        extension: extension.to_string(),
    })
}
