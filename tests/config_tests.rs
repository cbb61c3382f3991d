// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use mini_gallery::Config;
use mini_gallery::backends::camera::{CameraBackendType, Facing};
use mini_gallery::config::PhotoOutputFormat;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("mini-gallery-config-{}", uuid::Uuid::new_v4()))
        .join(name)
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(config.mirror_preview, "Mirror preview should be enabled by default");
    assert_eq!(config.default_facing, Facing::Rear);
    assert_eq!(config.photo_format, PhotoOutputFormat::Png);
    assert_eq!(config.backend, CameraBackendType::V4l2);
}

#[test]
fn test_missing_file_is_none() {
    let path = temp_path("config.json");
    assert!(Config::load_from(&path).unwrap().is_none());
}

#[test]
fn test_partial_file_fills_defaults() {
    let path = temp_path("config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "backend": "virtual", "default_facing": "front" }"#).unwrap();

    let config = Config::load_from(&path).unwrap().unwrap();
    assert_eq!(config.backend, CameraBackendType::Virtual);
    assert_eq!(config.default_facing, Facing::Front);
    assert!(config.mirror_preview);

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_invalid_file_is_an_error() {
    let path = temp_path("config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "backend = virtual").unwrap();

    assert!(Config::load_from(&path).is_err());

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_save_and_reload() {
    let path = temp_path("nested/config.json");
    let config = Config {
        photo_format: PhotoOutputFormat::Jpeg,
        storage_dir: Some(PathBuf::from("/tmp/gallery")),
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap().unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.storage_dir(), Some(PathBuf::from("/tmp/gallery")));

    std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).unwrap();
}
