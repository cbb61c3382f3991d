// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Directory name used below the XDG config, data and pictures directories
pub const APP_DIR_NAME: &str = "mini-gallery";

/// Title shown at the top of the terminal UI
pub const APP_TITLE: &str = "Mini Gallery";

/// Persisted key-value storage
pub mod storage {
    /// Slot holding the JSON array of photo data URLs
    pub const PHOTOS_KEY: &str = "photos";

    /// Extension of the per-key files written by the file store
    pub const SLOT_EXTENSION: &str = "json";

    /// Suffix for the temporary file a slot is written to before the rename
    pub const TEMP_SUFFIX: &str = "tmp";
}

/// Preview stream settings
pub mod preview {
    /// Preview size requested from the device. The terminal cannot show more.
    pub const DEFAULT_WIDTH: u32 = 640;
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Frames buffered between the capture thread and the UI
    pub const FRAME_CHANNEL_CAPACITY: usize = 2;

    /// Number of mmap buffers queued with the V4L2 driver
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Log capture progress every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 300;
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// How long a device may take to grant or refuse a stream
    pub const START_TIMEOUT: Duration = Duration::from_secs(5);

    /// Frames to let auto-exposure settle before a one-shot CLI capture
    pub const WARMUP: Duration = Duration::from_millis(500);

    /// Give up on a one-shot CLI capture after this long without frames
    pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Terminal input poll interval (roughly one frame at 60 Hz)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// Synthetic camera source
pub mod virtual_camera {
    use std::time::Duration;

    /// Delay between generated frames (~30fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    pub const FRONT_NAME: &str = "Virtual Front Camera";
    pub const REAR_NAME: &str = "Virtual Rear Camera";

    pub const FRONT_PATH: &str = "virtual:front";
    pub const REAR_PATH: &str = "virtual:rear";
}

/// Terminal UI layout and text
pub mod ui {
    /// Terminal columns taken by one gallery cell, border included
    pub const THUMBNAIL_CELL_WIDTH: u16 = 14;

    /// Terminal rows taken by one gallery cell, border included
    pub const THUMBNAIL_CELL_HEIGHT: u16 = 7;

    /// Pixel edge of a cached thumbnail (square, cropped to fill)
    pub const THUMBNAIL_PIXELS: u32 = 24;

    pub const GALLERY_TITLE: &str = "My Photos";

    pub const EMPTY_GALLERY_TEXT: &str = "No saved photos.";

    pub const CAMERA_ERROR_TEXT: &str = "Could not access the camera. Check permissions.";

    pub const WAITING_FOR_CAMERA_TEXT: &str = "Waiting for camera...";

    pub const CAMERA_OFF_TEXT: &str = "Camera is off. Press 's' to start.";
}

/// File format helpers
pub mod file_formats {
    /// Image file extensions the virtual camera can stream
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    }
}
