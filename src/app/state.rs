// SPDX-License-Identifier: GPL-3.0-only

//! Application state types

use super::camera::CameraController;
use crate::backends::camera::{CameraBackendManager, Facing};
use crate::config::Config;
use crate::pipelines::photo::PhotoPipeline;
use crate::storage::PhotoStore;

/// User interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    StartCamera,
    StopCamera,
    /// Invert the facing preference and restart
    SwitchCamera,
    TakePhoto,
    /// Delete the photo at this gallery position
    DeletePhoto(usize),
    SelectNext,
    SelectPrevious,
    DismissNotice,
}

/// Blocking message that must be dismissed before anything else happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Actions currently offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    TakePhoto,
    Stop,
    /// Switch to the camera facing this way
    Switch(Facing),
}

impl Control {
    pub fn label(&self) -> String {
        match self {
            Control::Start => "Start camera".to_string(),
            Control::TakePhoto => "Take photo".to_string(),
            Control::Stop => "Stop camera".to_string(),
            Control::Switch(facing) => format!("Switch to {}", facing.display_name().to_lowercase()),
        }
    }

    /// Key that triggers this control in the terminal UI
    pub fn key_hint(&self) -> &'static str {
        match self {
            Control::Start => "s",
            Control::TakePhoto => "p",
            Control::Stop => "x",
            Control::Switch(_) => "f",
        }
    }

    pub fn message(&self) -> Message {
        match self {
            Control::Start => Message::StartCamera,
            Control::TakePhoto => Message::TakePhoto,
            Control::Stop => Message::StopCamera,
            Control::Switch(_) => Message::SwitchCamera,
        }
    }
}

/// The application model stores the camera, the gallery and the
/// transient UI state.
pub struct AppModel {
    /// Configuration loaded at startup
    pub config: Config,
    pub(crate) camera: CameraController,
    pub(crate) store: PhotoStore,
    pub(crate) pipeline: PhotoPipeline,
    pub(crate) notice: Option<Notice>,
    /// One-line feedback shown in the status bar
    pub(crate) status: Option<String>,
    /// Gallery position with keyboard focus
    pub(crate) selected: Option<usize>,
}

impl AppModel {
    pub fn new(config: Config, manager: CameraBackendManager, store: PhotoStore) -> Self {
        let camera = CameraController::new(manager, config.default_facing)
            .with_preview_size(config.preview_width, config.preview_height);
        let pipeline = PhotoPipeline::from_config(&config);
        let selected = store.len().checked_sub(1);

        Self {
            config,
            camera,
            store,
            pipeline,
            notice: None,
            status: None,
            selected,
        }
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Button model: only "start" while inactive, the rest while streaming
    pub fn controls(&self) -> Vec<Control> {
        if self.camera.is_active() {
            vec![
                Control::TakePhoto,
                Control::Stop,
                Control::Switch(self.camera.facing().inverted()),
            ]
        } else {
            vec![Control::Start]
        }
    }
}

impl std::fmt::Debug for AppModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppModel")
            .field("camera", &self.camera)
            .field("store", &self.store)
            .field("notice", &self.notice)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}
