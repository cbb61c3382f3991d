// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for raw camera buffers
//!
//! Backends convert whatever the device delivers into tightly packed RGBA
//! before a frame reaches the preview channel.

use super::types::BackendError;

/// Convert YUV (BT.601) to RGB
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// Byte positions of Y0, U, Y1, V inside one packed 4:2:2 macropixel
#[derive(Clone, Copy)]
struct Packed422 {
    y0: usize,
    u: usize,
    y1: usize,
    v: usize,
}

const YUYV_LAYOUT: Packed422 = Packed422 { y0: 0, u: 1, y1: 2, v: 3 };
const UYVY_LAYOUT: Packed422 = Packed422 { u: 0, y0: 1, v: 2, y1: 3 };

fn packed_422_to_rgba(
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    layout: Packed422,
) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let stride = (stride as usize).max(w * 2);
    let mut rgba = vec![0u8; w * h * 4];

    for row in 0..h {
        let Some(src) = data.get(row * stride..row * stride + w * 2) else {
            break;
        };
        let dst = &mut rgba[row * w * 4..(row + 1) * w * 4];

        // Each 4-byte group encodes 2 pixels sharing chroma
        for (pair, chunk) in src.chunks_exact(4).enumerate() {
            let (u, v) = (chunk[layout.u], chunk[layout.v]);
            for (i, luma) in [chunk[layout.y0], chunk[layout.y1]].into_iter().enumerate() {
                let x = pair * 2 + i;
                if x >= w {
                    break;
                }
                let (r, g, b) = yuv_to_rgb(luma, u, v);
                dst[x * 4..x * 4 + 4].copy_from_slice(&[r, g, b, 255]);
            }
        }
    }

    rgba
}

/// Convert YUYV (Y0 U Y1 V) to RGBA
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    packed_422_to_rgba(data, width, height, stride, YUYV_LAYOUT)
}

/// Convert UYVY (U Y0 V Y1) to RGBA
pub fn uyvy_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    packed_422_to_rgba(data, width, height, stride, UYVY_LAYOUT)
}

/// Expand 8-bit grayscale to RGBA
pub fn gray8_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let w = width as usize;
    let stride = (stride as usize).max(w);
    let mut rgba = Vec::with_capacity(w * height as usize * 4);

    for row in data.chunks(stride).take(height as usize) {
        for &v in row.iter().take(w) {
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
    }

    rgba
}

/// Decode one MJPEG frame to RGBA
///
/// Returns the pixel data with the decoded width and height, which may
/// differ from the negotiated format on misbehaving devices.
pub fn mjpeg_to_rgba(data: &[u8]) -> Result<(Vec<u8>, u32, u32), BackendError> {
    let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| BackendError::Other(format!("MJPEG decode failed: {e}")))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((rgba.into_raw(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn yuyv_expands_two_pixels_per_group() {
        // 2x1 frame: Y0=16 U=128 Y1=235 V=128
        let rgba = yuyv_to_rgba(&[16, 128, 235, 128], 2, 1, 4);
        assert_eq!(rgba, vec![16, 16, 16, 255, 235, 235, 235, 255]);
    }

    #[test]
    fn uyvy_reads_luma_from_odd_bytes() {
        let rgba = uyvy_to_rgba(&[128, 50, 128, 200], 2, 1, 4);
        assert_eq!(rgba, vec![50, 50, 50, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn stride_padding_is_skipped() {
        // 2x2 frame with 2 bytes of padding per row
        let data = [10, 128, 20, 128, 0xEE, 0xEE, 30, 128, 40, 128, 0xEE, 0xEE];
        let rgba = yuyv_to_rgba(&data, 2, 2, 6);
        let lumas: Vec<u8> = rgba.chunks(4).map(|p| p[0]).collect();
        assert_eq!(lumas, vec![10, 20, 30, 40]);
    }

    #[test]
    fn short_buffers_leave_black_rows() {
        let rgba = yuyv_to_rgba(&[200, 128, 200, 128], 2, 2, 4);
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[8..], &[0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn gray_expands_to_opaque_rgba() {
        let rgba = gray8_to_rgba(&[7, 9], 2, 1, 2);
        assert_eq!(rgba, vec![7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn mjpeg_round_trips_dimensions() {
        let image = image::RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let (rgba, width, height) = mjpeg_to_rgba(&jpeg).unwrap();
        assert_eq!((width, height), (8, 4));
        assert_eq!(rgba.len(), 8 * 4 * 4);
    }

    #[test]
    fn garbage_mjpeg_is_an_error() {
        assert!(mjpeg_to_rgba(&[0, 1, 2, 3]).is_err());
    }
}
