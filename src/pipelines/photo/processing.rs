// SPDX-License-Identifier: MPL-2.0

//! Frame readback for photos
//!
//! Turns the frame currently shown in the preview into a packed RGB image.

use crate::backends::camera::format_converters::{uyvy_to_rgba, yuyv_to_rgba};
use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::PhotoError;
use image::RgbImage;
use tracing::{debug, info};

/// Post-processing configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcessingConfig {
    /// Flip horizontally so the photo matches a mirrored preview
    pub mirror: bool,
}

/// Processed image data
pub struct ProcessedImage {
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
}

/// Post-processor for captured frames
pub struct PostProcessor {
    config: PostProcessingConfig,
}

impl PostProcessor {
    pub fn new(config: PostProcessingConfig) -> Self {
        Self { config }
    }

    /// Convert a frame to RGB on a blocking worker
    pub async fn process(&self, frame: CameraFrame) -> Result<ProcessedImage, PhotoError> {
        info!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Starting post-processing"
        );

        let config = self.config;
        tokio::task::spawn_blocking(move || Self::process_blocking(&frame, config))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Post-processing task error: {e}")))?
    }

    pub fn process_blocking(
        frame: &CameraFrame,
        config: PostProcessingConfig,
    ) -> Result<ProcessedImage, PhotoError> {
        let mut image = frame_to_rgb(frame)?;
        if config.mirror {
            image::imageops::flip_horizontal_in_place(&mut image);
        }

        debug!(mirror = config.mirror, "Post-processing complete");
        Ok(ProcessedImage {
            width: image.width(),
            height: image.height(),
            image,
        })
    }
}

/// Convert any frame layout to a tightly packed RGB image
pub fn frame_to_rgb(frame: &CameraFrame) -> Result<RgbImage, PhotoError> {
    if !frame.is_complete() {
        return Err(PhotoError::NoFrameAvailable);
    }

    let (width, height) = (frame.width, frame.height);
    let stride = frame.stride as usize;
    let data = frame.data_slice();

    let rgb: Vec<u8> = match frame.format {
        PixelFormat::RGBA => rows(data, stride, width as usize * 4, height)
            .flat_map(|row| row.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]))
            .collect(),
        PixelFormat::RGB24 => rows(data, stride, width as usize * 3, height)
            .flatten()
            .copied()
            .collect(),
        PixelFormat::Gray8 => rows(data, stride, width as usize, height)
            .flat_map(|row| row.iter().flat_map(|&y| [y, y, y]))
            .collect(),
        PixelFormat::YUYV | PixelFormat::UYVY => {
            let rgba = if frame.format == PixelFormat::YUYV {
                yuyv_to_rgba(data, width, height, frame.stride)
            } else {
                uyvy_to_rgba(data, width, height, frame.stride)
            };
            rgba.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect()
        }
    };

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        PhotoError::EncodingFailed("Failed to create RGB image from frame".to_string())
    })
}

fn rows(data: &[u8], stride: usize, row_len: usize, height: u32) -> impl Iterator<Item = &[u8]> {
    (0..height as usize).map(move |y| &data[y * stride..y * stride + row_len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pixel_frame() -> CameraFrame {
        // red | blue
        CameraFrame::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255])
    }

    #[test]
    fn rgba_drops_alpha() {
        let image = frame_to_rgb(&two_pixel_frame()).unwrap();
        assert_eq!(image.as_raw(), &[255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn padded_rows_are_skipped() {
        let mut frame = CameraFrame::from_rgba(1, 2, vec![1, 2, 3, 0, 9, 9, 9, 9, 4, 5, 6, 0]);
        frame.stride = 8;
        let image = frame_to_rgb(&frame).unwrap();
        assert_eq!(image.as_raw(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn gray_expands_to_rgb() {
        let mut frame = CameraFrame::from_rgba(2, 1, vec![10, 20]);
        frame.format = PixelFormat::Gray8;
        frame.stride = 2;
        let image = frame_to_rgb(&frame).unwrap();
        assert_eq!(image.as_raw(), &[10, 10, 10, 20, 20, 20]);
    }

    #[test]
    fn mirror_flips_horizontally() {
        let processed = PostProcessor::process_blocking(
            &two_pixel_frame(),
            PostProcessingConfig { mirror: true },
        )
        .unwrap();
        assert_eq!(processed.image.as_raw(), &[0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn incomplete_frames_are_rejected() {
        let frame = CameraFrame::from_rgba(4, 4, vec![0u8; 8]);
        assert!(matches!(frame_to_rgb(&frame), Err(PhotoError::NoFrameAvailable)));
    }
}
