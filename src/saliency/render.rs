//! Heatmap finalization and compositing
//!
//! Resizes a raw heatmap to the source image resolution with smooth
//! interpolation, inverts polarity (`value = 1 - value`) so the rendered
//! ramp highlights the most salient regions, colorizes through the fixed
//! ramp, and optionally alpha-composites over the source image.

use super::{colormap, Heatmap};
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};

/// Resize, invert, and colorize a heatmap to the target resolution
pub fn finalize(heatmap: &Heatmap, width: u32, height: u32) -> RgbImage {
    let (rows, cols) = heatmap.shape();

    let mut gray = GrayImage::new(cols as u32, rows as u32);
    for (y, row) in heatmap.values().rows().into_iter().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            gray.put_pixel(x as u32, y as u32, image::Luma([(v * 255.0) as u8]));
        }
    }

    let resized = imageops::resize(&gray, width, height, FilterType::Triangle);

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in resized.enumerate_pixels() {
        // Inverted polarity: low value = high saliency
        out.put_pixel(x, y, colormap::ramp(255 - pixel.0[0]));
    }
    out
}

/// Alpha-composite a heatmap over its source image
///
/// The heatmap is finalized at the base image's resolution, so the output
/// dimensions always equal the base's.
pub fn overlay(base: &RgbImage, heatmap: &Heatmap, alpha: f32) -> RgbImage {
    let alpha = alpha.clamp(0.0, 1.0);
    let heat = finalize(heatmap, base.width(), base.height());

    let mut out = RgbImage::new(base.width(), base.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let b = base.get_pixel(x, y).0;
        let h = heat.get_pixel(x, y).0;
        let blend = |bv: u8, hv: u8| {
            (bv as f32 * (1.0 - alpha) + hv as f32 * alpha).round() as u8
        };
        *pixel = Rgb([blend(b[0], h[0]), blend(b[1], h[1]), blend(b[2], h[2])]);
    }
    out
}
