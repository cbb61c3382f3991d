// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! Preview frame → RGB readback → Encoding → data: URL → Photo store
//!       ↓
//! Preview continues uninterrupted
//! ```

pub mod encoding;
pub mod processing;

pub use encoding::{EncodedImage, EncodingFormat, EncodingQuality, PhotoEncoder};
pub use processing::{PostProcessingConfig, PostProcessor};

use crate::backends::camera::types::{CameraFrame, Facing};
use crate::config::Config;
use crate::errors::PhotoError;
use crate::storage::Photo;

/// Complete photo capture pipeline
///
/// Orchestrates the frame → RGB → encode → data URL workflow.
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
    mirror_front: bool,
}

impl PhotoPipeline {
    /// PNG output, front camera mirrored
    pub fn new() -> Self {
        Self {
            encoder: PhotoEncoder::new(),
            mirror_front: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut encoder = PhotoEncoder::new();
        encoder.set_format(config.photo_format.into());
        encoder.set_quality(config.jpeg_quality);

        Self {
            encoder,
            mirror_front: config.mirror_preview,
        }
    }

    /// Processing settings for a frame from a camera facing `facing`
    pub fn processing_for(&self, facing: Facing) -> PostProcessingConfig {
        PostProcessingConfig {
            mirror: self.mirror_front && facing == Facing::Front,
        }
    }

    /// Encode `frame` into a storable photo
    pub async fn capture(&self, frame: CameraFrame, facing: Facing) -> Result<Photo, PhotoError> {
        let processed = PostProcessor::new(self.processing_for(facing))
            .process(frame)
            .await?;
        let encoded = self.encoder.encode(processed).await?;
        Photo::from_data_url(encoded.to_data_url())
    }
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_front_camera_is_mirrored() {
        let pipeline = PhotoPipeline::new();
        assert!(pipeline.processing_for(Facing::Front).mirror);
        assert!(!pipeline.processing_for(Facing::Rear).mirror);

        let config = Config {
            mirror_preview: false,
            ..Config::default()
        };
        let pipeline = PhotoPipeline::from_config(&config);
        assert!(!pipeline.processing_for(Facing::Front).mirror);
    }

    #[tokio::test]
    async fn capture_produces_png_data_url() {
        let frame = CameraFrame::from_rgba(4, 3, vec![128u8; 4 * 3 * 4]);
        let photo = PhotoPipeline::new().capture(frame, Facing::Rear).await.unwrap();

        assert_eq!(photo.mime_type(), Some("image/png"));
        let image = photo.decode_image().unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));
    }
}
