// SPDX-License-Identifier: MPL-2.0

//! Application state and logic for the gallery
//!
//! # Architecture
//!
//! - `camera`: camera controller (start / stop / switch, latest frame)
//! - `state`: application state types (AppModel, Message, Notice, Control)
//! - `update`: message handling
//!
//! The terminal UI and the CLI both drive an [`AppModel`] through
//! [`AppModel::update`].

pub mod camera;
mod state;
mod update;

pub use camera::{CameraController, CameraSession};
pub use state::{AppModel, Control, Message, Notice};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{BackendError, CameraBackendManager, Facing};
    use crate::backends::virtual_camera::VirtualCameraBackend;
    use crate::config::Config;
    use crate::constants::ui::CAMERA_ERROR_TEXT;
    use crate::errors::StorageError;
    use crate::storage::{KeyValueStore, MemoryStore, PhotoStore};

    /// Backing store whose writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk full").into())
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn model(backend: VirtualCameraBackend) -> AppModel {
        let store = PhotoStore::load(Box::new(MemoryStore::new())).unwrap();
        AppModel::new(
            Config::default(),
            CameraBackendManager::with_backend(Box::new(backend)),
            store,
        )
    }

    #[tokio::test]
    async fn controls_follow_camera_state() {
        let mut app = model(VirtualCameraBackend::new());
        assert_eq!(app.controls(), vec![Control::Start]);

        app.update(Message::StartCamera).await;
        assert_eq!(
            app.controls(),
            vec![Control::TakePhoto, Control::Stop, Control::Switch(Facing::Front)]
        );

        app.update(Message::StopCamera).await;
        assert_eq!(app.controls(), vec![Control::Start]);
    }

    #[tokio::test]
    async fn camera_failure_shows_a_modal_notice() {
        let backend = VirtualCameraBackend::new()
            .with_initialize_error(BackendError::PermissionDenied("denied".into()));
        let mut app = model(backend);

        app.update(Message::StartCamera).await;
        assert_eq!(app.notice().map(|n| n.message.as_str()), Some(CAMERA_ERROR_TEXT));
        assert!(!app.camera().is_active());

        // Other messages wait until the notice is gone
        app.update(Message::StartCamera).await;
        app.update(Message::DismissNotice).await;
        assert!(app.notice().is_none());
    }

    #[tokio::test]
    async fn take_photo_selects_the_new_photo() {
        let mut app = model(VirtualCameraBackend::new());
        app.update(Message::StartCamera).await;
        app.update(Message::TakePhoto).await;
        app.update(Message::TakePhoto).await;

        assert_eq!(app.store().len(), 2);
        assert_eq!(app.selected(), Some(1));
    }

    #[tokio::test]
    async fn deleting_keeps_selection_in_range() {
        let mut app = model(VirtualCameraBackend::new());
        app.update(Message::StartCamera).await;
        app.update(Message::TakePhoto).await;
        app.update(Message::TakePhoto).await;

        app.update(Message::DeletePhoto(1)).await;
        assert_eq!(app.selected(), Some(0));
        app.update(Message::DeletePhoto(0)).await;
        assert_eq!(app.selected(), None);

        app.update(Message::DeletePhoto(0)).await;
        assert!(app.status().is_some_and(|s| s.starts_with("Could not delete")));
    }

    #[tokio::test]
    async fn selection_is_clamped() {
        let mut app = model(VirtualCameraBackend::new());
        app.update(Message::SelectNext).await;
        assert_eq!(app.selected(), None);

        app.update(Message::StartCamera).await;
        for _ in 0..3 {
            app.update(Message::TakePhoto).await;
        }
        app.update(Message::SelectNext).await;
        assert_eq!(app.selected(), Some(2));
        for _ in 0..5 {
            app.update(Message::SelectPrevious).await;
        }
        assert_eq!(app.selected(), Some(0));
    }

    #[tokio::test]
    async fn failed_save_is_reported_in_the_status_bar() {
        let store = PhotoStore::load(Box::new(ReadOnlyStore)).unwrap();
        let mut app = AppModel::new(
            Config::default(),
            CameraBackendManager::with_backend(Box::new(VirtualCameraBackend::new())),
            store,
        );
        app.update(Message::StartCamera).await;
        app.update(Message::TakePhoto).await;

        assert_eq!(app.store().len(), 0);
        assert_eq!(app.selected(), None);
        assert!(app.status().is_some_and(|s| s.starts_with("Could not save photo")));
        assert!(app.notice().is_none());
        assert!(app.camera().is_active());
    }
}
