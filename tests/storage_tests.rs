// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the persisted photo list

use mini_gallery::constants::storage::PHOTOS_KEY;
use mini_gallery::errors::StorageError;
use mini_gallery::pipelines::photo::encoding::to_data_url;
use mini_gallery::storage::{FileStore, KeyValueStore, Photo, PhotoStore};
use std::path::PathBuf;

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("mini-gallery-storage-{}", uuid::Uuid::new_v4())))
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn photo(seed: u8) -> Photo {
    let image = image::RgbImage::from_pixel(2, 2, image::Rgb([seed, seed, seed]));
    let mut png = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    Photo::from_data_url(to_data_url("image/png", &png)).unwrap()
}

fn open(dir: &TempDir) -> PhotoStore {
    PhotoStore::load(Box::new(FileStore::open(&dir.0).unwrap())).unwrap()
}

#[test]
fn test_reload_restores_list() {
    let dir = TempDir::new();
    {
        let mut store = open(&dir);
        store.append(photo(10)).unwrap();
        store.append(photo(20)).unwrap();
        store.append(photo(30)).unwrap();
    }

    let store = open(&dir);
    assert_eq!(store.photos(), &[photo(10), photo(20), photo(30)]);
}

#[test]
fn test_remove_survives_reload() {
    let dir = TempDir::new();
    {
        let mut store = open(&dir);
        store.append(photo(1)).unwrap();
        store.append(photo(2)).unwrap();
        store.remove(0).unwrap();
    }

    let store = open(&dir);
    assert_eq!(store.photos(), &[photo(2)]);
}

#[test]
fn test_slot_is_a_json_array_of_data_urls() {
    let dir = TempDir::new();
    let mut store = open(&dir);
    store.append(photo(5)).unwrap();

    let raw = FileStore::open(&dir.0).unwrap().get(PHOTOS_KEY).unwrap().unwrap();
    let urls: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with("data:image/png;base64,"));
}

#[test]
fn test_malformed_slot_is_replaced_on_next_write() {
    let dir = TempDir::new();
    let mut backing = FileStore::open(&dir.0).unwrap();
    backing.set(PHOTOS_KEY, r#"{"photos": 3}"#).unwrap();

    let mut store = open(&dir);
    assert!(store.is_empty());

    store.append(photo(7)).unwrap();
    assert_eq!(open(&dir).len(), 1);
}

#[test]
fn test_out_of_range_remove() {
    let dir = TempDir::new();
    let mut store = open(&dir);

    let err = store.remove(0).unwrap_err();
    assert!(matches!(err, StorageError::IndexOutOfRange { index: 0, len: 0 }));
    assert!(FileStore::open(&dir.0).unwrap().get(PHOTOS_KEY).unwrap().is_none());
}
