// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use mini_gallery::constants::{file_formats, storage, timing, ui};

#[test]
fn test_photos_key() {
    assert_eq!(storage::PHOTOS_KEY, "photos");
}

#[test]
fn test_image_extensions_ignore_case() {
    assert!(file_formats::is_image_extension("PNG"));
    assert!(file_formats::is_image_extension("jpeg"));
    assert!(!file_formats::is_image_extension("mp4"));
}

#[test]
fn test_warmup_fits_capture_timeout() {
    assert!(timing::WARMUP < timing::CAPTURE_TIMEOUT);
}

#[test]
fn test_thumbnail_fits_cell() {
    // Border takes one cell on each side; half-blocks give two pixels per row
    let inner_rows = (ui::THUMBNAIL_CELL_HEIGHT - 2) as u32;
    assert!(ui::THUMBNAIL_PIXELS >= inner_rows * 2);
}
