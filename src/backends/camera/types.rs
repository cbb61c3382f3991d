// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Frame pixel storage, shared between the preview and the capture path
pub type FrameData = Arc<[u8]>;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackendType {
    /// Video4Linux2 capture devices (`/dev/video*`)
    #[default]
    V4l2,
    /// Synthetic front and rear cameras (test patterns or a still image)
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

impl std::str::FromStr for CameraBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v4l2" | "v4l" => Ok(CameraBackendType::V4l2),
            "virtual" | "test" => Ok(CameraBackendType::Virtual),
            other => Err(format!("unknown camera backend '{other}' (expected v4l2 or virtual)")),
        }
    }
}

/// Which way the requested camera should face
///
/// `Front` is the camera pointing at the user, `Rear` the one pointing at
/// the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    #[default]
    Rear,
}

impl Facing {
    /// The opposite preference, used when switching cameras
    pub fn inverted(self) -> Self {
        match self {
            Facing::Front => Facing::Rear,
            Facing::Rear => Facing::Front,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Facing::Front => "Front",
            Facing::Rear => "Rear",
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(Facing::Front),
            "rear" | "back" | "environment" => Ok(Facing::Rear),
            other => Err(format!("unknown facing '{other}' (expected front or rear)")),
        }
    }
}

/// Physical mounting of a camera, when the platform reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraLocation {
    /// Same side as the display
    Front,
    /// Opposite side of the display
    Back,
    /// Plugged-in camera (USB webcam, capture card)
    External,
    #[default]
    Unknown,
}

impl CameraLocation {
    /// Parse a sysfs `physical_location/panel` value or a libcamera location string
    pub fn from_panel(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => CameraLocation::Front,
            "back" | "rear" | "environment" => CameraLocation::Back,
            "external" => CameraLocation::External,
            _ => CameraLocation::Unknown,
        }
    }

    /// Whether this location satisfies a facing preference exactly
    pub fn matches(&self, facing: Facing) -> bool {
        matches!(
            (self, facing),
            (CameraLocation::Front, Facing::Front) | (CameraLocation::Back, Facing::Rear)
        )
    }
}

impl std::fmt::Display for CameraLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraLocation::Front => write!(f, "front"),
            CameraLocation::Back => write!(f, "back"),
            CameraLocation::External => write!(f, "external"),
            CameraLocation::Unknown => write!(f, "unknown"),
        }
    }
}

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus the device hangs off (e.g. `usb-0000:00:14.0-6`)
    pub bus_info: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Real device path (resolved symlinks)
    pub real_path: String,
}

/// Represents a camera device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    /// Path to capture device (`/dev/videoN`, or a virtual identifier)
    pub path: String,
    pub location: CameraLocation,
    pub device_info: Option<DeviceInfo>,
}

/// Framerate as a fraction (numerator/denominator)
/// Stores exact framerate to handle NTSC rates like 59.94fps (60000/1001)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Integer part of the framerate
    pub fn as_int(&self) -> u32 {
        self.num / self.denom
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<Framerate>,
    /// FourCC code (e.g., "MJPG", "YUYV")
    pub pixel_format: String,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(f, "{}x{} {} @ {}fps", self.width, self.height, self.pixel_format, fps)
        } else {
            write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
        }
    }
}

/// Pixel layout of a [`CameraFrame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32-bit RGBA, the canonical format after backend conversion
    RGBA,
    /// 24-bit RGB without alpha
    RGB24,
    /// 8-bit grayscale (IR and monochrome sensors)
    Gray8,
    /// Packed 4:2:2 (Y0 U Y1 V)
    YUYV,
    /// Packed 4:2:2 (U Y0 V Y1)
    UYVY,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
            Self::YUYV | Self::UYVY => 2,
        }
    }

    /// Parse a V4L2 FourCC for raw (uncompressed) formats
    pub fn from_fourcc(fourcc: &str) -> Option<Self> {
        match fourcc {
            "AB24" | "RGBA" => Some(Self::RGBA),
            "RGB3" => Some(Self::RGB24),
            "GREY" | "Y8  " => Some(Self::Gray8),
            "YUYV" | "YUY2" => Some(Self::YUYV),
            "UYVY" => Some(Self::UYVY),
            _ => None,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: FrameData,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: impl Into<FrameData>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            format: PixelFormat::RGBA,
            stride: width * 4,
        }
    }

    pub fn data_slice(&self) -> &[u8] {
        &self.data
    }

    /// Whether the buffer is large enough for the declared geometry
    pub fn is_complete(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let row = (self.width * self.format.bytes_per_pixel()) as usize;
        let needed = (self.height as usize - 1) * self.stride as usize + row;
        self.stride as usize >= row && self.data.len() >= needed
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    #[error("Device busy: {0}")]
    Busy(String),
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Error: {0}")]
    Other(String),
}

impl BackendError {
    /// Classify an I/O error raised while opening or configuring `path`
    pub fn from_io(err: &std::io::Error, path: &str) -> Self {
        use std::io::ErrorKind;

        let detail = format!("{path}: {err}");
        match err.kind() {
            ErrorKind::PermissionDenied => BackendError::PermissionDenied(detail),
            ErrorKind::NotFound => BackendError::DeviceNotFound(detail),
            ErrorKind::ResourceBusy => BackendError::Busy(detail),
            _ => BackendError::IoError(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_inverts() {
        assert_eq!(Facing::Front.inverted(), Facing::Rear);
        assert_eq!(Facing::Rear.inverted(), Facing::Front);
        assert_eq!(Facing::default(), Facing::Rear);
    }

    #[test]
    fn facing_parses_media_names() {
        assert_eq!("user".parse::<Facing>(), Ok(Facing::Front));
        assert_eq!("environment".parse::<Facing>(), Ok(Facing::Rear));
        assert_eq!("Back".parse::<Facing>(), Ok(Facing::Rear));
        assert!("sideways".parse::<Facing>().is_err());
    }

    #[test]
    fn location_matches_facing() {
        assert!(CameraLocation::from_panel("front\n").matches(Facing::Front));
        assert!(CameraLocation::from_panel("back").matches(Facing::Rear));
        assert!(!CameraLocation::External.matches(Facing::Front));
        assert!(!CameraLocation::Unknown.matches(Facing::Rear));
    }

    #[test]
    fn incomplete_frames_are_detected() {
        let frame = CameraFrame::from_rgba(4, 2, vec![0u8; 32]);
        assert!(frame.is_complete());

        let short = CameraFrame::from_rgba(4, 2, vec![0u8; 20]);
        assert!(!short.is_complete());
    }

    #[test]
    fn io_errors_are_classified() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            BackendError::from_io(&denied, "/dev/video0"),
            BackendError::PermissionDenied(_)
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            BackendError::from_io(&missing, "/dev/video9"),
            BackendError::DeviceNotFound(_)
        ));
    }
}
