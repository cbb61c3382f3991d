// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end gallery behaviour with the virtual camera

use mini_gallery::backends::camera::{CameraBackendManager, CameraFrame, Facing};
use mini_gallery::backends::virtual_camera::VirtualCameraBackend;
use mini_gallery::constants::storage::PHOTOS_KEY;
use mini_gallery::storage::{KeyValueStore, MemoryStore, Photo, PhotoStore};
use mini_gallery::{AppModel, Config, Message};

fn app_with(backing: MemoryStore) -> AppModel {
    let store = PhotoStore::load(Box::new(backing)).unwrap();
    let manager = CameraBackendManager::with_backend(Box::new(VirtualCameraBackend::new()));
    AppModel::new(Config::default(), manager, store)
}

fn persisted_len(backing: &MemoryStore) -> usize {
    backing
        .get(PHOTOS_KEY)
        .unwrap()
        .map(|text| serde_json::from_str::<Vec<Photo>>(&text).unwrap().len())
        .unwrap_or(0)
}

#[tokio::test]
async fn start_yields_one_active_session() {
    let mut app = app_with(MemoryStore::new());
    app.update(Message::StartCamera).await;
    app.update(Message::StartCamera).await;

    assert!(app.camera().is_active());
    assert!(app.camera().manager().is_initialized());
    assert_eq!(app.camera().facing(), Facing::Rear);
}

#[tokio::test]
async fn capture_while_inactive_is_a_no_op() {
    let backing = MemoryStore::new();
    let mut app = app_with(backing.clone());

    app.update(Message::TakePhoto).await;
    assert!(!app.capture_photo().await.unwrap());
    assert!(app.store().is_empty());
    assert_eq!(backing.get(PHOTOS_KEY).unwrap(), None);
}

#[tokio::test]
async fn capture_appends_and_persists() {
    let backing = MemoryStore::new();
    let mut app = app_with(backing.clone());
    app.update(Message::StartCamera).await;

    for expected in 1..=3 {
        app.update(Message::TakePhoto).await;
        assert_eq!(app.store().len(), expected);
        assert_eq!(persisted_len(&backing), expected);
    }
}

#[tokio::test]
async fn captured_photos_decode_to_frame_size() {
    let mut app = app_with(MemoryStore::new());
    app.update(Message::StartCamera).await;
    app.update(Message::TakePhoto).await;

    let frame: &CameraFrame = app.camera().current_frame().unwrap();
    let (width, height) = (frame.width, frame.height);

    let photo = app.store().get(0).unwrap();
    assert!(photo.as_data_url().starts_with("data:image/png;base64,"));
    let image = photo.decode_image().unwrap();
    assert_eq!((image.width(), image.height()), (width, height));
}

#[tokio::test]
async fn delete_removes_exactly_that_entry() {
    let backing = MemoryStore::new();
    let mut app = app_with(backing.clone());
    app.update(Message::StartCamera).await;
    app.update(Message::TakePhoto).await;
    app.update(Message::SwitchCamera).await;
    app.update(Message::TakePhoto).await;
    app.update(Message::TakePhoto).await;

    let before: Vec<Photo> = app.store().photos().to_vec();
    app.update(Message::DeletePhoto(1)).await;

    let expected = vec![before[0].clone(), before[2].clone()];
    assert_eq!(app.store().photos(), expected.as_slice());
    assert_eq!(persisted_len(&backing), 2);
}

#[tokio::test]
async fn reload_restores_persisted_photos() {
    let backing = MemoryStore::new();
    {
        let mut app = app_with(backing.clone());
        app.update(Message::StartCamera).await;
        app.update(Message::TakePhoto).await;
        app.update(Message::TakePhoto).await;
    }

    let app = app_with(backing);
    assert_eq!(app.store().len(), 2);
    assert!(!app.camera().is_active());
    assert_eq!(app.selected(), Some(1));
}

#[tokio::test]
async fn switch_selects_the_other_virtual_camera() {
    let mut app = app_with(MemoryStore::new());
    app.update(Message::StartCamera).await;
    assert_eq!(app.camera().session().unwrap().device().name, "Virtual Rear Camera");

    app.update(Message::SwitchCamera).await;
    assert_eq!(app.camera().facing(), Facing::Front);
    assert_eq!(app.camera().session().unwrap().device().name, "Virtual Front Camera");

    app.update(Message::SwitchCamera).await;
    assert_eq!(app.camera().facing(), Facing::Rear);
}

#[tokio::test]
async fn front_camera_photos_are_mirrored() {
    let mut app = app_with(MemoryStore::new());
    app.update(Message::SwitchCamera).await;
    app.update(Message::TakePhoto).await;

    // Capture does not poll again afterwards, so this is the captured frame
    let frame = app.camera().current_frame().unwrap().clone();
    let image = app.store().get(0).unwrap().decode_image().unwrap().to_rgb8();

    for x in [0, 7, frame.width / 2, frame.width - 1] {
        let idx = (x * 4) as usize;
        let source = image::Rgb([frame.data[idx], frame.data[idx + 1], frame.data[idx + 2]]);
        assert_eq!(image.get_pixel(frame.width - 1 - x, 0), &source);
    }
}

#[tokio::test]
async fn stop_twice_is_harmless() {
    let mut app = app_with(MemoryStore::new());
    app.update(Message::StartCamera).await;
    app.update(Message::StopCamera).await;
    app.update(Message::StopCamera).await;

    assert!(!app.camera().is_active());
    assert!(!app.camera().manager().is_initialized());
}
