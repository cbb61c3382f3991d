// SPDX-License-Identifier: MPL-2.0

//! Error types for the gallery application

use crate::backends::camera::BackendError;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Camera controller errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("No camera devices found")]
    NoCameraFound,
    #[error("Camera access denied: {0}")]
    PermissionDenied(String),
    #[error("Camera is busy: {0}")]
    Busy(String),
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// Device offers no format the backends can decode
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeviceNotFound(_) => CameraError::NoCameraFound,
            BackendError::PermissionDenied(msg) => CameraError::PermissionDenied(msg),
            BackendError::Busy(msg) => CameraError::Busy(msg),
            BackendError::FormatNotSupported(msg) => CameraError::InvalidFormat(msg),
            BackendError::InitializationFailed(msg) => CameraError::InitializationFailed(msg),
            other => CameraError::Backend(other.to_string()),
        }
    }
}

/// Photo capture and decoding errors
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("No frame available for capture")]
    NoFrameAvailable,
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
    /// Not a `data:<mime>;base64,<payload>` string
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Save failed: {0}")]
    SaveFailed(String),
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

/// Key-value and photo store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Keys become file names, so path separators and empty keys are rejected
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("Photo index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration directory on this system")]
    NoConfigDir,
    #[error("Failed to access {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_to_camera_errors() {
        assert_eq!(
            CameraError::from(BackendError::PermissionDenied("/dev/video0".into())),
            CameraError::PermissionDenied("/dev/video0".into())
        );
        assert_eq!(
            CameraError::from(BackendError::DeviceNotFound("none".into())),
            CameraError::NoCameraFound
        );
        assert!(matches!(
            CameraError::from(BackendError::IoError("eio".into())),
            CameraError::Backend(_)
        ));
    }

    #[test]
    fn index_errors_name_both_values() {
        let err = StorageError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(err.to_string(), "Photo index 3 out of range (have 2)");
    }

    #[test]
    fn app_error_wraps_sources() {
        let err: AppError = CameraError::NoCameraFound.into();
        assert_eq!(err.to_string(), "Camera error: No camera devices found");
    }
}
