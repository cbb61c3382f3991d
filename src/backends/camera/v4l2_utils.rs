// SPDX-License-Identifier: GPL-3.0-only

//! Shared V4L2 utility functions
//!
//! Device metadata that V4L2 itself does not report (where a camera is
//! mounted) comes from sysfs.

use super::types::{CameraLocation, DeviceInfo};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root of the video4linux class in sysfs
pub const SYSFS_VIDEO4LINUX: &str = "/sys/class/video4linux";

/// Build DeviceInfo from a V4L2 device path and its queried capabilities
///
/// Resolves symlinks so `/dev/v4l/by-id/...` paths compare equal to the node.
pub fn build_device_info(v4l2_path: &str, caps: &v4l::capability::Capabilities) -> DeviceInfo {
    let real_path = std::fs::canonicalize(v4l2_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| v4l2_path.to_string());

    DeviceInfo {
        card: caps.card.clone(),
        driver: caps.driver.clone(),
        bus_info: caps.bus.clone(),
        path: v4l2_path.to_string(),
        real_path,
    }
}

/// Determine where a camera is mounted
///
/// Firmware-provided panel data (ACPI `_PLD`, exposed as
/// `physical_location/panel`) wins over guessing from the card name.
pub fn camera_location(index: usize, card: &str, bus_info: &str) -> CameraLocation {
    if let Some(location) = read_panel_location(Path::new(SYSFS_VIDEO4LINUX), index) {
        debug!(index, %location, "Camera location from sysfs");
        return location;
    }
    location_from_name(card, bus_info)
}

/// Read the panel location for `video<index>` below a sysfs class root
pub fn read_panel_location(class_root: &Path, index: usize) -> Option<CameraLocation> {
    let device_dir = class_root.join(format!("video{index}")).join("device");

    // The attribute lives on the USB device for UVC cameras, which is the
    // parent of the interface the video node hangs off.
    let candidates: [PathBuf; 3] = [
        device_dir.join("physical_location").join("panel"),
        device_dir.join("..").join("physical_location").join("panel"),
        device_dir
            .join("firmware_node")
            .join("physical_location")
            .join("panel"),
    ];

    candidates.iter().find_map(|path| {
        let value = std::fs::read_to_string(path).ok()?;
        match CameraLocation::from_panel(&value) {
            CameraLocation::Unknown => None,
            location => Some(location),
        }
    })
}

/// Guess the mounting from names like "Front Camera" or "OV5640 rear"
pub fn location_from_name(card: &str, bus_info: &str) -> CameraLocation {
    let card = card.to_ascii_lowercase();
    if ["front", "user", "selfie"].iter().any(|k| card.contains(k)) {
        CameraLocation::Front
    } else if ["rear", "back", "world"].iter().any(|k| card.contains(k)) {
        CameraLocation::Back
    } else if bus_info.starts_with("usb-") && !card.contains("integrated") {
        CameraLocation::External
    } else {
        CameraLocation::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_hint_at_location() {
        assert_eq!(
            location_from_name("Front Camera", "platform:csi"),
            CameraLocation::Front
        );
        assert_eq!(location_from_name("ov8858 rear", ""), CameraLocation::Back);
        assert_eq!(
            location_from_name("HD Pro Webcam C920", "usb-0000:00:14.0-2"),
            CameraLocation::External
        );
        assert_eq!(
            location_from_name("Integrated Camera: Integrated C", "usb-0000:00:14.0-8"),
            CameraLocation::Unknown
        );
    }

    #[test]
    fn panel_location_is_read_from_sysfs_layout() {
        let root = std::env::temp_dir().join(format!("mini-gallery-sysfs-{}", std::process::id()));
        let panel_dir = root.join("video2").join("device").join("physical_location");
        std::fs::create_dir_all(&panel_dir).unwrap();
        std::fs::write(panel_dir.join("panel"), "back\n").unwrap();

        assert_eq!(read_panel_location(&root, 2), Some(CameraLocation::Back));
        assert_eq!(read_panel_location(&root, 3), None);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
