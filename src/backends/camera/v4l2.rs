// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Opens `/dev/video*` capture nodes directly. A dedicated thread owns the
//! device and its mmap stream, converts every buffer to RGBA and pushes it
//! into a bounded preview channel. Frames are dropped, not queued, when the
//! UI falls behind.

use super::format_converters::{gray8_to_rgba, mjpeg_to_rgba, uyvy_to_rgba, yuyv_to_rgba};
use super::types::*;
use super::{CameraBackend, v4l2_utils};
use crate::constants::{preview, timing};
use futures::channel::mpsc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

/// FourCC codes the capture thread knows how to turn into frames
const DECODABLE_FOURCCS: &[&str] = &["MJPG", "JPEG", "YUYV", "UYVY", "GREY", "RGB3"];

pub fn is_decodable_fourcc(fourcc: &str) -> bool {
    DECODABLE_FOURCCS.contains(&fourcc)
}

fn fourcc_string(fourcc: &FourCC) -> String {
    fourcc.str().map(str::to_string).unwrap_or_default()
}

struct ActiveStream {
    device: CameraDevice,
    format: CameraFormat,
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// V4L2 backend
#[derive(Default)]
pub struct V4l2Backend {
    active: Option<ActiveStream>,
    receiver: Option<FrameReceiver>,
    /// Capture thread that missed the start deadline, with its device path
    stalled: Option<(String, JoinHandle<()>)>,
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a timed-out capture thread once it has let go of its device
    ///
    /// Never blocks: a thread still stuck in the driver is kept for the next
    /// attempt.
    fn reap_stalled(&mut self) {
        let Some((path, thread)) = self.stalled.take() else {
            return;
        };
        if thread.is_finished() {
            if thread.join().is_err() {
                error!(path, "Stalled capture thread panicked");
            } else {
                debug!(path, "Stalled capture thread exited");
            }
        } else {
            warn!(path, "Capture thread from a timed-out start still holds the device");
            self.stalled = Some((path, thread));
        }
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut nodes = v4l::context::enum_devices();
        nodes.sort_by_key(|node| node.index());

        let mut cameras = Vec::new();
        for node in nodes {
            let path = node.path().to_string_lossy().to_string();
            let device = match Device::with_path(&path) {
                Ok(device) => device,
                Err(e) => {
                    debug!(path, error = %e, "Skipping unreadable video node");
                    continue;
                }
            };
            let Ok(caps) = device.query_caps() else {
                continue;
            };
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                continue;
            }
            // UVC metadata nodes advertise capture but list no pixel formats
            if device.enum_formats().map(|f| f.is_empty()).unwrap_or(true) {
                debug!(path, "Skipping video node without formats");
                continue;
            }

            let location = v4l2_utils::camera_location(node.index(), &caps.card, &caps.bus);
            cameras.push(CameraDevice {
                name: caps.card.clone(),
                path: path.clone(),
                location,
                device_info: Some(v4l2_utils::build_device_info(&path, &caps)),
            });
        }

        info!(count = cameras.len(), "Enumerated V4L2 cameras");
        cameras
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        let dev = match Device::with_path(&device.path) {
            Ok(dev) => dev,
            Err(e) => {
                warn!(path = %device.path, error = %e, "Failed to open device for format query");
                return Vec::new();
            }
        };

        let mut formats = Vec::new();
        for description in dev.enum_formats().unwrap_or_default() {
            let fourcc = fourcc_string(&description.fourcc);
            if !is_decodable_fourcc(&fourcc) {
                continue;
            }

            for size in dev.enum_framesizes(description.fourcc).unwrap_or_default() {
                let (width, height) = match size.size {
                    v4l::framesize::FrameSizeEnum::Discrete(d) => (d.width, d.height),
                    v4l::framesize::FrameSizeEnum::Stepwise(s) => (s.max_width, s.max_height),
                };

                let framerate = dev
                    .enum_frameintervals(description.fourcc, width, height)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|interval| match interval.interval {
                        v4l::frameinterval::FrameIntervalEnum::Discrete(f) => Some(f),
                        v4l::frameinterval::FrameIntervalEnum::Stepwise(s) => Some(s.min),
                    })
                    // Interval is seconds per frame, so invert it
                    .filter(|f| f.numerator > 0)
                    .map(|f| Framerate::new(f.denominator, f.numerator))
                    .max_by(|a, b| a.as_f64().total_cmp(&b.as_f64()));

                let format = CameraFormat {
                    width,
                    height,
                    framerate,
                    pixel_format: fourcc.clone(),
                };
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
        }

        debug!(device = %device.name, count = formats.len(), "Queried formats");
        formats
    }

    fn initialize(&mut self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()> {
        if self.active.is_some() {
            self.shutdown()?;
        }
        self.reap_stalled();

        let (sender, receiver) = mpsc::channel(preview::FRAME_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);
        let stop_flag = Arc::new(AtomicBool::new(false));

        let thread = {
            let path = device.path.clone();
            let requested = format.clone();
            let stop_flag = Arc::clone(&stop_flag);
            std::thread::Builder::new()
                .name("v4l2-capture".to_string())
                .spawn(move || capture_thread(path, requested, stop_flag, sender, ready_tx))
                .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
        };

        let negotiated = match ready_rx.recv_timeout(timing::START_TIMEOUT) {
            Ok(Ok(negotiated)) => negotiated,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                // The thread may still be stuck in the driver; joined once it exits
                stop_flag.store(true, Ordering::Release);
                warn!(
                    path = %device.path,
                    timeout = ?timing::START_TIMEOUT,
                    "Capture thread did not report back, device may stay busy"
                );
                self.stalled = Some((device.path.clone(), thread));
                return Err(BackendError::InitializationFailed(format!(
                    "{} did not start streaming within {:?}",
                    device.path,
                    timing::START_TIMEOUT
                )));
            }
        };

        info!(device = %device.name, format = %negotiated, "V4L2 stream started");
        self.active = Some(ActiveStream {
            device: device.clone(),
            format: negotiated,
            stop_flag,
            thread: Some(thread),
        });
        self.receiver = Some(receiver);
        Ok(())
    }

    fn shutdown(&mut self) -> BackendResult<()> {
        self.receiver = None;
        self.reap_stalled();
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        active.stop_flag.store(true, Ordering::Release);
        if let Some(thread) = active.thread.take()
            && thread.join().is_err()
        {
            error!(device = %active.device.name, "Capture thread panicked");
        }

        info!(device = %active.device.name, "V4L2 stream stopped");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    fn take_preview_receiver(&mut self) -> Option<FrameReceiver> {
        self.receiver.take()
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn is_available(&self) -> bool {
        !v4l::context::enum_devices().is_empty()
    }

    fn current_device(&self) -> Option<&CameraDevice> {
        self.active.as_ref().map(|a| &a.device)
    }

    fn current_format(&self) -> Option<&CameraFormat> {
        self.active.as_ref().map(|a| &a.format)
    }
}

impl Drop for V4l2Backend {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(?e, "Failed to stop V4L2 stream on drop");
        }
    }
}

/// Open the device, negotiate the format and stream until told to stop
///
/// The outcome of opening is reported once through `ready`; afterwards the
/// thread only talks through the frame channel.
fn capture_thread(
    path: String,
    requested: CameraFormat,
    stop_flag: Arc<AtomicBool>,
    mut sender: FrameSender,
    ready: std::sync::mpsc::SyncSender<BackendResult<CameraFormat>>,
) {
    let opened = open_device(&path, &requested);
    let (device, negotiated) = match opened {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut stream =
        match MmapStream::with_buffers(&device, Type::VideoCapture, preview::V4L2_BUFFER_COUNT) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(BackendError::from_io(&e, &path)));
                return;
            }
        };

    if ready.send(Ok(negotiated.format.clone())).is_err() {
        return;
    }

    let mut frame_count: u64 = 0;
    let mut dropped: u64 = 0;
    while !stop_flag.load(Ordering::Acquire) {
        let (buffer, metadata) = match CaptureStream::next(&mut stream) {
            Ok(next) => next,
            Err(e) => {
                error!(path, error = %e, "Capture failed, stopping stream");
                break;
            }
        };

        let used = (metadata.bytesused as usize).min(buffer.len());
        let bytes = if used > 0 { &buffer[..used] } else { buffer };

        let frame = match convert_buffer(bytes, &negotiated) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "Dropping undecodable buffer");
                continue;
            }
        };

        match sender.try_send(frame) {
            Ok(()) => {}
            Err(e) if e.is_disconnected() => break,
            Err(_) => dropped += 1,
        }

        frame_count += 1;
        if frame_count % preview::FRAME_LOG_INTERVAL == 0 {
            debug!(frame_count, dropped, "Capture progress");
        }
    }

    debug!(path, frame_count, dropped, "Capture thread exiting");
}

fn open_device(path: &str, requested: &CameraFormat) -> BackendResult<(Device, NegotiatedFormat)> {
    let device = Device::with_path(path).map_err(|e| BackendError::from_io(&e, path))?;

    let fourcc_bytes: [u8; 4] = requested
        .pixel_format
        .as_bytes()
        .try_into()
        .map_err(|_| BackendError::FormatNotSupported(requested.pixel_format.clone()))?;

    let wanted = v4l::Format::new(requested.width, requested.height, FourCC::new(&fourcc_bytes));
    let actual =
        Capture::set_format(&device, &wanted).map_err(|e| BackendError::from_io(&e, path))?;

    let fourcc = fourcc_string(&actual.fourcc);
    if !is_decodable_fourcc(&fourcc) {
        return Err(BackendError::FormatNotSupported(format!(
            "{path} switched to {fourcc}"
        )));
    }

    if let Some(fps) = requested.framerate {
        let params = v4l::video::capture::Parameters::with_fps(fps.as_int().max(1));
        if let Err(e) = Capture::set_params(&device, &params) {
            warn!(path, error = %e, "Device rejected framerate, using its default");
        }
    }

    Ok((
        device,
        NegotiatedFormat {
            format: CameraFormat {
                width: actual.width,
                height: actual.height,
                framerate: requested.framerate,
                pixel_format: fourcc,
            },
            stride: actual.stride,
        },
    ))
}

/// Format the driver agreed to, with its row stride for raw layouts
#[derive(Debug, Clone)]
struct NegotiatedFormat {
    format: CameraFormat,
    stride: u32,
}

/// Turn one device buffer into a frame the rest of the app understands
fn convert_buffer(bytes: &[u8], negotiated: &NegotiatedFormat) -> BackendResult<CameraFrame> {
    let (width, height) = (negotiated.format.width, negotiated.format.height);
    let stride_for = |bytes_per_pixel: u32| negotiated.stride.max(width * bytes_per_pixel);

    let frame = match negotiated.format.pixel_format.as_str() {
        "MJPG" | "JPEG" => {
            let (rgba, width, height) = mjpeg_to_rgba(bytes)?;
            CameraFrame::from_rgba(width, height, rgba)
        }
        "YUYV" => {
            let rgba = yuyv_to_rgba(bytes, width, height, stride_for(2));
            CameraFrame::from_rgba(width, height, rgba)
        }
        "UYVY" => {
            let rgba = uyvy_to_rgba(bytes, width, height, stride_for(2));
            CameraFrame::from_rgba(width, height, rgba)
        }
        "GREY" => {
            let rgba = gray8_to_rgba(bytes, width, height, stride_for(1));
            CameraFrame::from_rgba(width, height, rgba)
        }
        "RGB3" => CameraFrame {
            width,
            height,
            data: Arc::from(bytes),
            format: PixelFormat::RGB24,
            stride: stride_for(3),
        },
        other => return Err(BackendError::FormatNotSupported(other.to_string())),
    };

    if frame.is_complete() {
        Ok(frame)
    } else {
        Err(BackendError::Other(format!(
            "short buffer: {} bytes for {}x{}",
            bytes.len(),
            width,
            height
        )))
    }
}
