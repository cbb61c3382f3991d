// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for gallery operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Listing, capturing, deleting and exporting stored photos

use mini_gallery::app::AppModel;
use mini_gallery::backends::camera::{CameraBackendManager, Facing};
use mini_gallery::config::Config;
use mini_gallery::constants::timing;
use mini_gallery::pipelines::photo::{EncodingFormat, PhotoEncoder};
use mini_gallery::storage::PhotoStore;
use std::path::PathBuf;
use std::time::Instant;

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let manager = CameraBackendManager::new(config);
    if !manager.is_available() {
        println!("The {} backend has no devices available.", manager.backend_type());
        return Ok(());
    }
    let cameras = manager.enumerate_cameras().unwrap_or_default();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", manager.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {} ({})", index, camera.name, camera.location);
        println!("      Path: {}", camera.path);

        let formats = manager.get_formats(camera);
        if !formats.is_empty() {
            // Group formats by resolution and show best framerate
            let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
            for format in &formats {
                let fps = format.framerate.map(|f| f.as_int()).unwrap_or(30);
                if let Some(existing) = resolutions
                    .iter_mut()
                    .find(|(w, h, _)| *w == format.width && *h == format.height)
                {
                    existing.2 = existing.2.max(fps);
                } else {
                    resolutions.push((format.width, format.height, fps));
                }
            }

            // Highest resolution first
            resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

            let res_strs: Vec<String> = resolutions
                .iter()
                .take(3)
                .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps))
                .collect();

            println!("      Formats: {}", res_strs.join(", "));
        }
        println!();
    }

    Ok(())
}

/// List stored photos
pub fn list_photos(store: &PhotoStore) -> Result<(), Box<dyn std::error::Error>> {
    if store.is_empty() {
        println!("No saved photos.");
        return Ok(());
    }

    println!("Saved photos:");
    for (index, photo) in store.photos().iter().enumerate() {
        let mime = photo.mime_type().unwrap_or("unknown");
        match photo.decode_image() {
            Ok(image) => println!(
                "  [{}] {} {}x{} ({} bytes)",
                index,
                mime,
                image.width(),
                image.height(),
                photo.encoded_len()
            ),
            Err(e) => println!("  [{}] {} (unreadable: {})", index, mime, e),
        }
    }

    Ok(())
}

/// Start the camera, let it settle, capture one photo into the store and stop
pub fn take_photo(
    config: Config,
    store: PhotoStore,
    facing: Option<Facing>,
    runtime: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    let facing = facing.unwrap_or(config.default_facing);
    let manager = CameraBackendManager::new(&config);
    let mut app = AppModel::new(config, manager, store);

    runtime.block_on(async {
        app.camera_mut().start(facing).await?;
        if let Some(session) = app.camera().session() {
            println!("Using {} ({})", session.device().name, session.format());
        }

        // Wait for auto-exposure to settle
        println!("Capturing...");
        let start = Instant::now();
        while start.elapsed() < timing::CAPTURE_TIMEOUT {
            app.camera_mut().poll_frames();
            if start.elapsed() > timing::WARMUP && app.camera().current_frame().is_some() {
                break;
            }
            tokio::time::sleep(timing::UI_POLL_INTERVAL).await;
        }

        let captured = app.capture_photo().await;
        app.camera_mut().stop();

        if !captured? {
            return Err("Failed to capture frame from camera".into());
        }
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;

    println!("Photo saved as #{}", app.store().len() - 1);
    Ok(())
}

/// Remove a stored photo
pub fn delete_photo(mut store: PhotoStore, index: usize) -> Result<(), Box<dyn std::error::Error>> {
    store.remove(index)?;
    println!("Deleted photo #{} ({} left)", index, store.len());
    Ok(())
}

/// Decode a stored photo and write it to an image file
pub fn export_photo(
    store: &PhotoStore,
    index: usize,
    output: Option<PathBuf>,
    runtime: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    let photo = store.get(index).ok_or_else(|| {
        format!("Photo index {} out of range ({} saved)", index, store.len())
    })?;

    let format = photo
        .mime_type()
        .and_then(EncodingFormat::from_mime_type)
        .ok_or("Unsupported photo format")?;
    let data = photo.decode_bytes()?;

    let path = runtime.block_on(async {
        match output {
            Some(path) if !path.is_dir() => PhotoEncoder::save_to(data, path).await,
            Some(dir) => PhotoEncoder::save(data, format, dir).await,
            None => PhotoEncoder::save(data, format, Config::export_dir()).await,
        }
    })?;

    println!("Photo exported: {}", path.display());
    Ok(())
}
