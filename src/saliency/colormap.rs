//! Fixed perceptual color ramp
//!
//! A compiled-in viridis-style ramp: dark violet through teal and green
//! to bright yellow. Anchors are interpolated linearly, so the mapping is
//! deterministic and requires no external resources.

use image::Rgb;

const ANCHORS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Map a byte intensity through the ramp
pub fn ramp(value: u8) -> Rgb<u8> {
    let segments = (ANCHORS.len() - 1) as f32;
    let pos = value as f32 / 255.0 * segments;
    let idx = (pos as usize).min(ANCHORS.len() - 2);
    let t = pos - idx as f32;

    let (r0, g0, b0) = ANCHORS[idx];
    let (r1, g1, b1) = ANCHORS[idx + 1];

    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgb([lerp(r0, r1), lerp(g0, g1), lerp(b0, b1)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(ramp(0), Rgb([68, 1, 84]));
        assert_eq!(ramp(255), Rgb([253, 231, 37]));
    }

    #[test]
    fn test_ramp_hits_anchors() {
        // 255 / 4 segments: value 127-128 lands near the middle anchor
        let mid = ramp(128);
        assert!((mid.0[0] as i16 - 33).abs() <= 2);
        assert!((mid.0[1] as i16 - 145).abs() <= 2);
    }

    #[test]
    fn test_ramp_is_deterministic() {
        for v in 0..=255u8 {
            assert_eq!(ramp(v), ramp(v));
        }
    }
}
