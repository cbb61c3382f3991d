// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` routes each message to a focused handler and runs it to
//! completion. Camera failures surface as a [`Notice`]; capture and storage
//! failures are logged and reported in the status line.

use super::state::{AppModel, Message, Notice};
use crate::constants::ui::CAMERA_ERROR_TEXT;
use crate::errors::{AppError, AppResult, PhotoError};
use tracing::{debug, error, info, warn};

impl AppModel {
    /// Main message handler
    pub async fn update(&mut self, message: Message) {
        debug!(?message, "Handling message");

        // The notice is modal
        if self.notice.is_some() && message != Message::DismissNotice {
            debug!(?message, "Ignoring message while a notice is shown");
            return;
        }

        match message {
            Message::StartCamera => self.handle_start_camera().await,
            Message::StopCamera => self.handle_stop_camera(),
            Message::SwitchCamera => self.handle_switch_camera().await,
            Message::TakePhoto => self.handle_take_photo().await,
            Message::DeletePhoto(index) => self.handle_delete_photo(index),
            Message::SelectNext => self.handle_select(1),
            Message::SelectPrevious => self.handle_select(-1),
            Message::DismissNotice => self.notice = None,
        }
    }

    async fn handle_start_camera(&mut self) {
        let facing = self.camera.facing();
        match self.camera.start(facing).await {
            Ok(()) => self.status = Some(format!("{} camera on", facing.display_name())),
            Err(e) => self.show_camera_error(&e.into()),
        }
    }

    fn handle_stop_camera(&mut self) {
        if self.camera.is_active() {
            self.camera.stop();
            self.status = Some("Camera off".to_string());
        }
    }

    async fn handle_switch_camera(&mut self) {
        match self.camera.switch().await {
            Ok(()) => {
                self.status = Some(format!("{} camera on", self.camera.facing().display_name()));
            }
            Err(e) => self.show_camera_error(&e.into()),
        }
    }

    async fn handle_take_photo(&mut self) {
        match self.capture_photo().await {
            Ok(true) => self.status = Some(format!("Photo {} saved", self.store.len())),
            Ok(false) => {}
            Err(e) => {
                error!(error = %e, "Failed to take photo");
                self.status = Some(format!("Could not save photo: {e}"));
            }
        }
    }

    fn handle_delete_photo(&mut self, index: usize) {
        match self.store.remove(index) {
            Ok(_) => {
                self.selected = match self.store.len() {
                    0 => None,
                    len => Some(index.min(len - 1)),
                };
                self.status = Some("Photo deleted".to_string());
            }
            Err(e) => {
                warn!(index, error = %e, "Failed to delete photo");
                self.status = Some(format!("Could not delete photo: {e}"));
            }
        }
    }

    fn handle_select(&mut self, step: isize) {
        let len = self.store.len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let current = self.selected.unwrap_or(0).min(len - 1);
        self.selected = Some(current.saturating_add_signed(step).min(len - 1));
    }

    fn show_camera_error(&mut self, err: &AppError) {
        error!(error = %err, "Camera error");
        self.notice = Some(Notice::new(CAMERA_ERROR_TEXT));
    }

    /// Read the shown frame, encode it and append it to the gallery
    ///
    /// Returns `Ok(false)` without touching the gallery when the camera is
    /// off or has not delivered a frame yet.
    pub async fn capture_photo(&mut self) -> AppResult<bool> {
        if !self.camera.is_active() {
            debug!("Capture ignored, camera inactive");
            return Ok(false);
        }

        self.camera.poll_frames();
        let Some(frame) = self.camera.current_frame().cloned() else {
            debug!("Capture ignored, no frame yet");
            return Ok(false);
        };

        let facing = self.camera.facing();
        let photo = match self.pipeline.capture(frame, facing).await {
            Ok(photo) => photo,
            Err(PhotoError::NoFrameAvailable) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        self.store.append(photo)?;
        self.selected = Some(self.store.len() - 1);
        info!(count = self.store.len(), "Photo captured");
        Ok(true)
    }
}
