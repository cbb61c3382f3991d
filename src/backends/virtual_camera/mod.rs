// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Provides a front and a rear camera that stream generated test patterns,
//! or a still image when a source file is configured. Used on machines
//! without a webcam and throughout the test suite.
//!
//! ```text
//!  pattern / image ──► generator thread ──► bounded channel ──► preview
//! ```
//!
//! The first frame is pushed before `initialize` returns, so a caller can
//! capture right after a successful start.

mod file_source;

pub use file_source::load_image_as_frame;

use crate::backends::camera::types::*;
use crate::backends::camera::CameraBackend;
use crate::constants::{preview, virtual_camera};
use futures::channel::mpsc;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Where generated frames come from
#[derive(Debug, Clone)]
enum FrameSource {
    /// Moving bar over a gradient, tinted per camera
    Pattern,
    /// The same still image on every frame
    Image(PathBuf),
}

struct ActiveStream {
    device: CameraDevice,
    format: CameraFormat,
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Synthetic camera backend
pub struct VirtualCameraBackend {
    devices: Vec<CameraDevice>,
    source: FrameSource,
    initialize_error: Option<BackendError>,
    active: Option<ActiveStream>,
    receiver: Option<FrameReceiver>,
}

impl VirtualCameraBackend {
    /// Backend with one front-facing and one rear-facing camera
    pub fn new() -> Self {
        Self {
            devices: vec![Self::front_camera(), Self::rear_camera()],
            source: FrameSource::Pattern,
            initialize_error: None,
            active: None,
            receiver: None,
        }
    }

    /// Replace the advertised camera list
    pub fn with_devices(mut self, devices: Vec<CameraDevice>) -> Self {
        self.devices = devices;
        self
    }

    /// Stream a still image instead of the test pattern
    pub fn with_image_source(mut self, path: PathBuf) -> Self {
        self.source = FrameSource::Image(path);
        self
    }

    /// Make every `initialize` call fail with `error`
    ///
    /// Simulates a user refusing camera access or a device held by
    /// another program.
    pub fn with_initialize_error(mut self, error: BackendError) -> Self {
        self.initialize_error = Some(error);
        self
    }

    pub fn front_camera() -> CameraDevice {
        CameraDevice {
            name: virtual_camera::FRONT_NAME.to_string(),
            path: virtual_camera::FRONT_PATH.to_string(),
            location: CameraLocation::Front,
            device_info: None,
        }
    }

    pub fn rear_camera() -> CameraDevice {
        CameraDevice {
            name: virtual_camera::REAR_NAME.to_string(),
            path: virtual_camera::REAR_PATH.to_string(),
            location: CameraLocation::Back,
            device_info: None,
        }
    }

    fn default_format() -> CameraFormat {
        CameraFormat {
            width: preview::DEFAULT_WIDTH,
            height: preview::DEFAULT_HEIGHT,
            framerate: Some(Framerate::from_int(30)),
            pixel_format: "RGBA".to_string(),
        }
    }
}

impl Default for VirtualCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VirtualCameraBackend {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        vec![Self::default_format()]
    }

    fn initialize(&mut self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()> {
        if self.active.is_some() {
            self.shutdown()?;
        }

        if let Some(error) = &self.initialize_error {
            warn!(device = %device.name, %error, "Virtual camera refused to start");
            return Err(error.clone());
        }

        let Some(device) = self.devices.iter().find(|d| d.path == device.path).cloned() else {
            return Err(BackendError::DeviceNotFound(device.path.clone()));
        };

        let generator = FrameGenerator::new(&self.source, &device, format)?;
        let format = CameraFormat {
            width: generator.width,
            height: generator.height,
            framerate: Some(Framerate::from_int(30)),
            pixel_format: "RGBA".to_string(),
        };

        let (mut sender, receiver) = mpsc::channel(preview::FRAME_CHANNEL_CAPACITY);
        let first = generator.frame(0);
        sender
            .try_send(first)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop_flag = Arc::clone(&stop_flag);
            std::thread::Builder::new()
                .name("virtual-camera".to_string())
                .spawn(move || generator.run(sender, stop_flag))
                .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
        };

        info!(device = %device.name, %format, "Virtual camera started");
        self.active = Some(ActiveStream {
            device,
            format,
            stop_flag,
            thread: Some(thread),
        });
        self.receiver = Some(receiver);
        Ok(())
    }

    fn shutdown(&mut self) -> BackendResult<()> {
        self.receiver = None;
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        active.stop_flag.store(true, Ordering::Release);
        if let Some(thread) = active.thread.take()
            && thread.join().is_err()
        {
            warn!("Virtual camera thread panicked");
        }
        info!(device = %active.device.name, "Virtual camera stopped");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    fn take_preview_receiver(&mut self) -> Option<FrameReceiver> {
        self.receiver.take()
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }

    fn is_available(&self) -> bool {
        true
    }

    fn current_device(&self) -> Option<&CameraDevice> {
        self.active.as_ref().map(|a| &a.device)
    }

    fn current_format(&self) -> Option<&CameraFormat> {
        self.active.as_ref().map(|a| &a.format)
    }
}

/// Produces frames for one virtual stream
struct FrameGenerator {
    width: u32,
    height: u32,
    tint: [u8; 3],
    still: Option<FrameData>,
}

impl FrameGenerator {
    fn new(source: &FrameSource, device: &CameraDevice, format: &CameraFormat) -> BackendResult<Self> {
        let tint = match device.location {
            CameraLocation::Front => [230, 140, 60],
            CameraLocation::Back => [60, 140, 230],
            _ => [140, 200, 120],
        };

        match source {
            FrameSource::Pattern => Ok(Self {
                width: format.width.max(1),
                height: format.height.max(1),
                tint,
                still: None,
            }),
            FrameSource::Image(path) => {
                let frame = load_image_as_frame(path)?;
                Ok(Self {
                    width: frame.width,
                    height: frame.height,
                    tint,
                    still: Some(frame.data),
                })
            }
        }
    }

    fn frame(&self, sequence: u64) -> CameraFrame {
        if let Some(data) = &self.still {
            return CameraFrame::from_rgba(self.width, self.height, Arc::clone(data));
        }

        let (w, h) = (self.width as usize, self.height as usize);
        let bar_width = (w / 16).max(1);
        let bar_start = (sequence as usize * 4) % w;

        let mut data = vec![0u8; w * h * 4];
        for (y, row) in data.chunks_exact_mut(w * 4).enumerate() {
            let shade = (y * 255 / h.max(1)) as u16;
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let in_bar = x >= bar_start && x < bar_start + bar_width;
                if in_bar {
                    pixel.copy_from_slice(&[255, 255, 255, 255]);
                } else {
                    for (channel, tint) in pixel.iter_mut().zip(self.tint) {
                        *channel = ((tint as u16 * (255 - shade) + 40 * shade) / 255) as u8;
                    }
                    pixel[3] = 255;
                }
            }
        }

        CameraFrame::from_rgba(self.width, self.height, data)
    }

    fn run(self, mut sender: FrameSender, stop_flag: Arc<AtomicBool>) {
        let mut sequence = 1u64;
        while !stop_flag.load(Ordering::Acquire) {
            std::thread::sleep(virtual_camera::FRAME_INTERVAL);

            match sender.try_send(self.frame(sequence)) {
                Ok(()) => {}
                Err(e) if e.is_disconnected() => {
                    debug!("Preview receiver dropped, stopping virtual camera");
                    break;
                }
                // UI is behind, drop the frame
                Err(_) => {}
            }
            sequence += 1;
        }
    }
}
