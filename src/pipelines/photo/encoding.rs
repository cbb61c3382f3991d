// SPDX-License-Identifier: GPL-3.0-only

//! Async photo encoding pipeline
//!
//! Encodes processed images as PNG (lossless) or JPEG (with quality control)
//! and wraps the result as a `data:` URL for the photo store. Exported files
//! are written from the same encoded bytes.

use super::processing::ProcessedImage;
use crate::config::PhotoOutputFormat;
use crate::errors::PhotoError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Png => "image/png",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(EncodingFormat::Jpeg),
            "image/png" => Some(EncodingFormat::Png),
            _ => None,
        }
    }
}

impl From<PhotoOutputFormat> for EncodingFormat {
    fn from(format: PhotoOutputFormat) -> Self {
        match format {
            PhotoOutputFormat::Jpeg => EncodingFormat::Jpeg,
            PhotoOutputFormat::Png => EncodingFormat::Png,
        }
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encoded image data ready for storing
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn to_data_url(&self) -> String {
        to_data_url(self.format.mime_type(), &self.data)
    }
}

/// Build a `data:<mime>;base64,<payload>` URL
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded payload
pub fn parse_data_url(url: &str) -> Result<(&str, Vec<u8>), PhotoError> {
    let invalid = |reason: &str| PhotoError::InvalidDataUrl(reason.to_string());

    let rest = url.strip_prefix("data:").ok_or_else(|| invalid("missing data: prefix"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("payload is not base64"))?;
    if !mime.starts_with("image/") {
        return Err(invalid("not an image"));
    }

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| PhotoError::InvalidDataUrl(e.to_string()))?;
    Ok((mime, bytes))
}

/// Photo encoder
pub struct PhotoEncoder {
    format: EncodingFormat,
    quality: EncodingQuality,
}

impl PhotoEncoder {
    /// Create a new encoder with PNG format and high JPEG quality
    pub fn new() -> Self {
        Self {
            format: EncodingFormat::Png,
            quality: EncodingQuality::High,
        }
    }

    pub fn set_format(&mut self, format: EncodingFormat) {
        self.format = format;
    }

    /// Set encoding quality (only affects JPEG)
    pub fn set_quality(&mut self, quality: EncodingQuality) {
        self.quality = quality;
    }

    /// Encode a processed image on a blocking worker
    pub async fn encode(&self, processed: ProcessedImage) -> Result<EncodedImage, PhotoError> {
        info!(
            width = processed.width,
            height = processed.height,
            format = ?self.format,
            "Starting encoding"
        );

        let format = self.format;
        let quality = self.quality;

        tokio::task::spawn_blocking(move || Self::encode_blocking(processed, format, quality))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Encoding task error: {e}")))?
    }

    pub fn encode_blocking(
        processed: ProcessedImage,
        format: EncodingFormat,
        quality: EncodingQuality,
    ) -> Result<EncodedImage, PhotoError> {
        let data = match format {
            EncodingFormat::Jpeg => Self::encode_jpeg(&processed.image, quality)?,
            EncodingFormat::Png => Self::encode_png(&processed.image)?,
        };

        debug!(size = data.len(), "Encoding complete");

        Ok(EncodedImage {
            data,
            format,
            width: processed.width,
            height: processed.height,
        })
    }

    /// Save encoded bytes under `output_dir` with a timestamped name
    pub async fn save(
        data: Vec<u8>,
        format: EncodingFormat,
        output_dir: PathBuf,
    ) -> Result<PathBuf, PhotoError> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("IMG_{}.{}", timestamp, format.extension());
        let filepath = output_dir.join(&filename);

        Self::save_to(data, filepath).await
    }

    /// Save encoded bytes to an explicit path
    pub async fn save_to(data: Vec<u8>, filepath: PathBuf) -> Result<PathBuf, PhotoError> {
        info!(path = %filepath.display(), "Saving photo");

        let target = filepath.clone();
        tokio::task::spawn_blocking(move || write_file(&target, &data))
            .await
            .map_err(|e| PhotoError::SaveFailed(format!("Save task error: {e}")))??;

        info!(path = %filepath.display(), "Photo saved successfully");
        Ok(filepath)
    }

    fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {e}")))?;

        Ok(buffer)
    }

    fn encode_png(image: &RgbImage) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();

        image
            .write_to(
                &mut std::io::Cursor::new(&mut buffer),
                image::ImageFormat::Png,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {e}")))?;

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), PhotoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(width: u32, height: u32) -> ProcessedImage {
        ProcessedImage {
            image: RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50])),
            width,
            height,
        }
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(EncodingFormat::Jpeg.extension(), "jpg");
        assert_eq!(EncodingFormat::Png.extension(), "png");
    }

    #[test]
    fn test_jpeg_quality_values() {
        assert_eq!(EncodingQuality::Low.jpeg_quality(), 60);
        assert_eq!(EncodingQuality::Medium.jpeg_quality(), 80);
        assert_eq!(EncodingQuality::High.jpeg_quality(), 92);
        assert_eq!(EncodingQuality::Maximum.jpeg_quality(), 98);
    }

    #[test]
    fn png_data_url_keeps_pixels() {
        let encoded =
            PhotoEncoder::encode_blocking(processed(3, 2), EncodingFormat::Png, EncodingQuality::High)
                .unwrap();
        let url = encoded.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let (mime, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgb([200, 100, 50]));
    }

    #[test]
    fn jpeg_data_url_has_jpeg_mime() {
        let encoded =
            PhotoEncoder::encode_blocking(processed(8, 8), EncodingFormat::Jpeg, EncodingQuality::Low)
                .unwrap();
        assert!(encoded.to_data_url().starts_with("data:image/jpeg;base64,"));
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        for url in [
            "image/png;base64,AAAA",
            "data:image/png;base64",
            "data:image/png,AAAA",
            "data:text/plain;base64,AAAA",
            "data:image/png;base64,@@@",
        ] {
            assert!(
                matches!(parse_data_url(url), Err(PhotoError::InvalidDataUrl(_))),
                "{url} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn save_writes_timestamped_file() {
        let dir = std::env::temp_dir().join(format!("mini-gallery-save-{}", uuid::Uuid::new_v4()));
        let path = PhotoEncoder::save(vec![1, 2, 3], EncodingFormat::Png, dir.clone())
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("IMG_") && name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
