// SPDX-License-Identifier: GPL-3.0-only

//! Camera controller
//!
//! Owns at most one [`CameraSession`]. Starting requests a device for a
//! facing preference on a blocking worker; stopping releases the device;
//! switching inverts the preference and restarts.

use crate::backends::camera::{
    CameraBackendManager, CameraDevice, CameraFormat, CameraFrame, Facing, FrameReceiver,
    select_camera, select_preview_format,
};
use crate::constants::preview;
use crate::errors::CameraError;
use tracing::{debug, error, info};

/// An active stream
pub struct CameraSession {
    device: CameraDevice,
    format: CameraFormat,
    facing: Facing,
    receiver: FrameReceiver,
    current_frame: Option<CameraFrame>,
    frames_received: u64,
}

impl CameraSession {
    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    pub fn format(&self) -> &CameraFormat {
        &self.format
    }

    /// Preference the session was opened with
    pub fn facing(&self) -> Facing {
        self.facing
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("device", &self.device.name)
            .field("format", &self.format)
            .field("facing", &self.facing)
            .field("frames_received", &self.frames_received)
            .finish_non_exhaustive()
    }
}

pub struct CameraController {
    manager: CameraBackendManager,
    facing: Facing,
    preview_size: (u32, u32),
    session: Option<CameraSession>,
}

impl CameraController {
    pub fn new(manager: CameraBackendManager, facing: Facing) -> Self {
        Self {
            manager,
            facing,
            preview_size: (preview::DEFAULT_WIDTH, preview::DEFAULT_HEIGHT),
            session: None,
        }
    }

    /// Preferred preview size used to pick a device format
    pub fn with_preview_size(mut self, width: u32, height: u32) -> Self {
        self.preview_size = (width, height);
        self
    }

    pub fn manager(&self) -> &CameraBackendManager {
        &self.manager
    }

    /// Current facing preference, also while inactive
    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    /// Request a stream for `facing`
    ///
    /// An active session is released first. On failure the controller is
    /// left inactive.
    pub async fn start(&mut self, facing: Facing) -> Result<(), CameraError> {
        if self.session.is_some() {
            debug!("Camera already active, restarting");
            self.stop();
        }
        self.facing = facing;

        let manager = self.manager.clone();
        let (width, height) = self.preview_size;
        let opened = tokio::task::spawn_blocking(move || open_stream(&manager, facing, width, height))
            .await
            .map_err(|e| CameraError::InitializationFailed(format!("Camera task error: {e}")))?;

        let (device, format, receiver) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                error!(%facing, error = %e, "Failed to start camera");
                return Err(e);
            }
        };

        info!(device = %device.name, %format, %facing, "Camera started");
        self.session = Some(CameraSession {
            device,
            format,
            facing,
            receiver,
            current_frame: None,
            frames_received: 0,
        });
        self.poll_frames();
        Ok(())
    }

    /// Release the device. Does nothing while inactive.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        // Receiver first, so the capture thread sees a closed channel
        drop(session.receiver);
        if let Err(e) = self.manager.shutdown() {
            error!(error = %e, "Failed to shut down camera");
        }
        info!(
            device = %session.device.name,
            frames = session.frames_received,
            "Camera stopped"
        );
    }

    /// Invert the facing preference and restart with it
    ///
    /// The preference stays inverted even when the restart fails.
    pub async fn switch(&mut self) -> Result<(), CameraError> {
        let facing = self.facing.inverted();
        info!(from = %self.facing, to = %facing, "Switching camera");
        self.stop();
        self.facing = facing;
        self.start(facing).await
    }

    /// Drain pending frames so the newest one becomes current
    ///
    /// Returns `true` when a new frame arrived.
    pub fn poll_frames(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let mut updated = false;
        while let Ok(frame) = session.receiver.try_recv() {
            session.frames_received += 1;
            if session.frames_received % preview::FRAME_LOG_INTERVAL == 0 {
                debug!(
                    frames = session.frames_received,
                    width = frame.width,
                    height = frame.height,
                    "Preview frames received"
                );
            }
            session.current_frame = Some(frame);
            updated = true;
        }
        updated
    }

    /// Frame currently shown in the preview
    pub fn current_frame(&self) -> Option<&CameraFrame> {
        self.session.as_ref()?.current_frame.as_ref()
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CameraController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController")
            .field("facing", &self.facing)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn open_stream(
    manager: &CameraBackendManager,
    facing: Facing,
    width: u32,
    height: u32,
) -> Result<(CameraDevice, CameraFormat, FrameReceiver), CameraError> {
    let cameras = manager.enumerate_cameras()?;
    let device = select_camera(&cameras, facing)
        .cloned()
        .ok_or(CameraError::NoCameraFound)?;

    let formats = manager.get_formats(&device);
    let format = select_preview_format(&formats, width, height).ok_or_else(|| {
        CameraError::InvalidFormat(format!("{} offers no usable format", device.name))
    })?;
    debug!(device = %device.name, %format, "Selected preview format");

    manager.initialize(&device, &format)?;
    let Some(receiver) = manager.take_preview_receiver() else {
        let _ = manager.shutdown();
        return Err(CameraError::InitializationFailed(
            "Backend did not provide a preview stream".to_string(),
        ));
    };

    let device = manager.current_device().unwrap_or(device);
    let format = manager.current_format().unwrap_or(format);
    Ok((device, format, receiver))
}
