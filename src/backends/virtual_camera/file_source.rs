// SPDX-License-Identifier: GPL-3.0-only

//! Still image source for the virtual camera

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use crate::constants::file_formats;
use std::path::Path;
use tracing::{debug, info};

/// Load an image file as a single RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if !file_formats::is_image_extension(extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "{} is not an image file",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading image as virtual camera source");

    let image = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from_io(&io, &path.display().to_string()),
        other => BackendError::Other(format!("Failed to decode {}: {}", path.display(), other)),
    })?;

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(width, height, "Image source loaded");

    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_files_load_as_rgba() {
        let path = std::env::temp_dir().join(format!("mini-gallery-source-{}.png", std::process::id()));
        image::RgbImage::from_pixel(5, 3, image::Rgb([1, 2, 3]))
            .save(&path)
            .unwrap();

        let frame = load_image_as_frame(&path).unwrap();
        assert_eq!((frame.width, frame.height), (5, 3));
        assert_eq!(&frame.data[..4], &[1, 2, 3, 255]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn non_images_are_rejected() {
        let result = load_image_as_frame(Path::new("/tmp/clip.mp4"));
        assert!(matches!(result, Err(BackendError::FormatNotSupported(_))));
    }

    #[test]
    fn missing_files_are_not_found() {
        let result = load_image_as_frame(Path::new("/nonexistent/mini-gallery.png"));
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }
}
