//! Decoding of uploaded floorplan images.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use domain::models::{ImageMeta, ImageUpload};
use image::{ImageFormat, ImageReader};
use thiserror::Error;

pub const INVALID_IMAGE_MESSAGE: &str =
    "upload a valid image. The file you uploaded was either not an image or a corrupted image";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image data is not valid base64")]
    InvalidEncoding,

    #[error("{}", INVALID_IMAGE_MESSAGE)]
    NotAnImage,

    #[error("image exceeds the maximum size of {max} bytes")]
    TooLarge { max: usize },
}

impl ImageError {
    pub fn code(&self) -> &'static str {
        match self {
            ImageError::InvalidEncoding => "invalid_encoding",
            ImageError::NotAnImage => "invalid_image",
            ImageError::TooLarge { .. } => "image_too_large",
        }
    }
}

/// An upload that decoded to a supported image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub meta: ImageMeta,
}

/// Decode a base64 upload, sniff its format and read its dimensions.
pub fn decode_upload(upload: &ImageUpload, max_bytes: usize) -> Result<DecodedImage, ImageError> {
    // Tolerate data URLs such as `data:image/png;base64,...`.
    let data = match upload.data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => upload.data.as_str(),
    };

    // base64 expands by 4/3; reject before decoding oversized payloads.
    if data.len() / 4 * 3 > max_bytes + 2 {
        return Err(ImageError::TooLarge { max: max_bytes });
    }

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|_| ImageError::InvalidEncoding)?;
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge { max: max_bytes });
    }

    let format = image::guess_format(&bytes).map_err(|_| ImageError::NotAnImage)?;
    let extension = extension_for(format).ok_or(ImageError::NotAnImage)?;

    let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
        .into_dimensions()
        .map_err(|_| ImageError::NotAnImage)?;
    let (width, height) = checked_dimensions(width, height)?;

    tracing::debug!(
        filename = %upload.filename,
        extension,
        width,
        height,
        "Decoded floorplan image"
    );

    Ok(DecodedImage {
        bytes,
        meta: ImageMeta {
            extension,
            width,
            height,
        },
    })
}

/// Dimensions as stored on a floorplan. Sizes beyond `i32` are rejected.
fn checked_dimensions(width: u32, height: u32) -> Result<(i32, i32), ImageError> {
    let width = i32::try_from(width).map_err(|_| ImageError::NotAnImage)?;
    let height = i32::try_from(height).map_err(|_| ImageError::NotAnImage)?;
    Ok((width, height))
}

/// File extension for accepted formats.
fn extension_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Bmp => Some("bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_base64(width: u32, height: u32) -> String {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        STANDARD.encode(cursor.into_inner())
    }

    fn upload(data: String) -> ImageUpload {
        ImageUpload {
            filename: "plan.png".to_string(),
            data,
        }
    }

    #[test]
    fn test_decode_png_dimensions() {
        let decoded = decode_upload(&upload(png_base64(40, 25)), 1 << 20).unwrap();
        assert_eq!(decoded.meta.extension, "png");
        assert_eq!(decoded.meta.width, 40);
        assert_eq!(decoded.meta.height, 25);
    }

    #[test]
    fn test_decode_data_url() {
        let data = format!("data:image/png;base64,{}", png_base64(2, 3));
        let decoded = decode_upload(&upload(data), 1 << 20).unwrap();
        assert_eq!((decoded.meta.width, decoded.meta.height), (2, 3));
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let err = decode_upload(&upload("not base64!!".into()), 1 << 20).unwrap_err();
        assert_eq!(err, ImageError::InvalidEncoding);
    }

    #[test]
    fn test_rejects_non_image() {
        let data = STANDARD.encode(b"just some text, not pixels");
        let err = decode_upload(&upload(data), 1 << 20).unwrap_err();
        assert_eq!(err, ImageError::NotAnImage);
        assert_eq!(err.code(), "invalid_image");
    }

    #[test]
    fn test_rejects_oversized_image() {
        let err = decode_upload(&upload(png_base64(64, 64)), 16).unwrap_err();
        assert_eq!(err, ImageError::TooLarge { max: 16 });
    }

    #[test]
    fn test_rejects_dimensions_beyond_i32() {
        assert_eq!(checked_dimensions(40, 25), Ok((40, 25)));
        assert_eq!(
            checked_dimensions(u32::MAX, 10),
            Err(ImageError::NotAnImage)
        );
        assert_eq!(
            checked_dimensions(10, i32::MAX as u32 + 1),
            Err(ImageError::NotAnImage)
        );
    }
}
