// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  CameraController   │  ← start / stop / switch, latest frame
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← shared, lockable handle
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← common interface
//! └──────────┬──────────┘
//!       ┌────┴────┐
//!       ▼         ▼
//!   ┌──────┐  ┌───────┐
//!   │ V4L2 │  │Virtual│
//!   └──────┘  └───────┘
//! ```

pub mod format_converters;
pub mod manager;
pub mod types;
pub mod v4l2;
pub mod v4l2_utils;

pub use manager::CameraBackendManager;
pub use types::*;

use crate::config::Config;

/// Complete camera backend trait
///
/// A backend owns at most one open stream. `initialize` opens it and
/// `shutdown` releases every resource held for it.
pub trait CameraBackend: Send {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Get supported formats for a specific camera device
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    /// Open `device` with `format` and start streaming preview frames
    ///
    /// Blocks until the device has either granted or refused access. Any
    /// stream that was already open is released first.
    fn initialize(&mut self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()>;

    /// Stop streaming and close the device
    ///
    /// Calling this without an open stream is a no-op.
    fn shutdown(&mut self) -> BackendResult<()>;

    fn is_initialized(&self) -> bool;

    /// Hand out the receiver for the current stream's preview frames
    ///
    /// Returns `None` when no stream is open or the receiver was already taken.
    fn take_preview_receiver(&mut self) -> Option<FrameReceiver>;

    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend can work on the current system
    fn is_available(&self) -> bool;

    fn current_device(&self) -> Option<&CameraDevice>;

    fn current_format(&self) -> Option<&CameraFormat>;
}

/// Create the backend selected in the configuration
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    config: &Config,
) -> Box<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::V4l2 => Box::new(v4l2::V4l2Backend::new()),
        CameraBackendType::Virtual => {
            let mut backend = crate::backends::virtual_camera::VirtualCameraBackend::new();
            if let Some(path) = &config.virtual_camera_source {
                backend = backend.with_image_source(path.clone());
            }
            Box::new(backend)
        }
    }
}

/// Pick the camera for a facing preference
///
/// The preference is a hint: a camera mounted on the requested side wins,
/// otherwise any camera is used. Without location data the first device
/// stands in for the front camera and the last one for the rear camera, so
/// switching still alternates on machines with two plain webcams.
pub fn select_camera(cameras: &[CameraDevice], facing: Facing) -> Option<&CameraDevice> {
    if let Some(exact) = cameras.iter().find(|c| c.location.matches(facing)) {
        return Some(exact);
    }

    // Cameras known to face the other way are the last resort
    let opposite = facing.inverted();
    let candidates: Vec<&CameraDevice> = cameras
        .iter()
        .filter(|c| !c.location.matches(opposite))
        .collect();
    let pool: Vec<&CameraDevice> = if candidates.is_empty() {
        cameras.iter().collect()
    } else {
        candidates
    };

    match facing {
        Facing::Front => pool.first().copied(),
        Facing::Rear => pool.last().copied(),
    }
}

/// Pick the format closest to the requested preview size
///
/// Formats with a known framerate win ties, then MJPEG over raw layouts.
pub fn select_preview_format(
    formats: &[CameraFormat],
    target_width: u32,
    target_height: u32,
) -> Option<CameraFormat> {
    let target_pixels = target_width as i64 * target_height as i64;

    formats
        .iter()
        .min_by_key(|f| {
            let pixels = f.width as i64 * f.height as i64;
            let diff = (pixels - target_pixels).abs();
            let fps_penalty = if f.framerate.is_some() { 0 } else { 1_000_000 };
            // MJPEG keeps USB bandwidth low at larger sizes
            let encoding_penalty = if f.pixel_format == "MJPG" { 0 } else { 1 };
            (diff + fps_penalty, encoding_penalty)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, location: CameraLocation) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            path: format!("/dev/{name}"),
            location,
            device_info: None,
        }
    }

    fn format(width: u32, height: u32, fourcc: &str) -> CameraFormat {
        CameraFormat {
            width,
            height,
            framerate: Some(Framerate::from_int(30)),
            pixel_format: fourcc.to_string(),
        }
    }

    #[test]
    fn exact_location_wins() {
        let cameras = vec![
            device("back", CameraLocation::Back),
            device("front", CameraLocation::Front),
        ];
        assert_eq!(select_camera(&cameras, Facing::Front).unwrap().name, "front");
        assert_eq!(select_camera(&cameras, Facing::Rear).unwrap().name, "back");
    }

    #[test]
    fn unknown_locations_alternate_by_order() {
        let cameras = vec![
            device("first", CameraLocation::Unknown),
            device("second", CameraLocation::External),
        ];
        assert_eq!(select_camera(&cameras, Facing::Front).unwrap().name, "first");
        assert_eq!(select_camera(&cameras, Facing::Rear).unwrap().name, "second");
    }

    #[test]
    fn any_camera_satisfies_a_soft_preference() {
        let cameras = vec![device("front", CameraLocation::Front)];
        assert_eq!(select_camera(&cameras, Facing::Rear).unwrap().name, "front");
        assert!(select_camera(&[], Facing::Rear).is_none());
    }

    #[test]
    fn preview_format_prefers_target_size() {
        let formats = vec![
            format(1920, 1080, "MJPG"),
            format(640, 480, "YUYV"),
            format(640, 480, "MJPG"),
            format(320, 240, "MJPG"),
        ];
        let chosen = select_preview_format(&formats, 640, 480).unwrap();
        assert_eq!((chosen.width, chosen.height), (640, 480));
        assert_eq!(chosen.pixel_format, "MJPG");
    }

    #[test]
    fn no_formats_no_choice() {
        assert!(select_preview_format(&[], 640, 480).is_none());
    }
}
