// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend lifecycle manager
//!
//! The manager provides:
//! - Backend lifecycle management (initialization, shutdown)
//! - Thread-safe backend access, so device opens can run on a blocking worker

use super::types::*;
use super::{CameraBackend, get_backend_for_type};
use crate::config::Config;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

struct ManagerState {
    backend: Box<dyn CameraBackend>,
    backend_type: CameraBackendType,
}

/// Camera backend manager
///
/// Cheap to clone; all clones share one backend.
#[derive(Clone)]
pub struct CameraBackendManager {
    state: Arc<Mutex<ManagerState>>,
}

impl CameraBackendManager {
    /// Create a manager for the backend selected in `config`
    pub fn new(config: &Config) -> Self {
        info!(backend = %config.backend, "Creating camera backend manager");
        Self::with_backend(get_backend_for_type(config.backend, config))
    }

    /// Wrap an already constructed backend
    pub fn with_backend(backend: Box<dyn CameraBackend>) -> Self {
        let backend_type = backend.backend_type();
        Self {
            state: Arc::new(Mutex::new(ManagerState {
                backend,
                backend_type,
            })),
        }
    }

    // A panic on the capture side must not take the UI down with it
    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn backend_type(&self) -> CameraBackendType {
        self.lock().backend_type
    }

    pub fn is_available(&self) -> bool {
        self.lock().backend.is_available()
    }

    /// Enumerate available cameras
    pub fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras = self.lock().backend.enumerate_cameras();
        if cameras.is_empty() {
            Err(BackendError::DeviceNotFound("No cameras found".to_string()))
        } else {
            Ok(cameras)
        }
    }

    pub fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        self.lock().backend.get_formats(device)
    }

    pub fn initialize(&self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()> {
        info!(device = %device.name, format = %format, "Initializing backend");
        self.lock().backend.initialize(device, format)
    }

    pub fn shutdown(&self) -> BackendResult<()> {
        info!("Shutting down backend");
        self.lock().backend.shutdown()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().backend.is_initialized()
    }

    pub fn take_preview_receiver(&self) -> Option<FrameReceiver> {
        self.lock().backend.take_preview_receiver()
    }

    pub fn current_device(&self) -> Option<CameraDevice> {
        self.lock().backend.current_device().cloned()
    }

    pub fn current_format(&self) -> Option<CameraFormat> {
        self.lock().backend.current_format().cloned()
    }
}

impl std::fmt::Debug for CameraBackendManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CameraBackendManager")
            .field("backend_type", &state.backend_type)
            .field("initialized", &state.backend.is_initialized())
            .finish()
    }
}
