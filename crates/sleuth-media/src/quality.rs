//! Frame quality scoring.
//!
//! Scores a decoded frame in `[0.1, 1.0]` from three grayscale statistics:
//! brightness (distance of the mean from mid-gray), sharpness (variance of
//! the Laplacian response) and contrast (standard deviation). The weighted
//! sum drives the pipeline's skip controller.

use image::RgbImage;

/// Sharpness normalizer: Laplacian variance at which a frame counts as
/// fully sharp.
const SHARPNESS_NORM: f64 = 600.0;
/// Contrast normalizer: grayscale stddev at which a frame counts as
/// fully contrasted.
const CONTRAST_NORM: f64 = 40.0;

/// Score a frame's quality in `[0.1, 1.0]`.
///
/// `quality = 0.3 * brightness + 0.5 * sharpness + 0.2 * contrast`.
pub fn frame_quality(image: &RgbImage) -> f32 {
    let gray = to_luma(image);
    let (mean, stddev) = mean_stddev(&gray);

    let brightness_score = 1.0 - (mean - 128.0).abs() / 128.0;
    let sharpness_score = (laplacian_variance(&gray, image.width(), image.height())
        / SHARPNESS_NORM)
        .min(1.0);
    let contrast_score = (stddev / CONTRAST_NORM).min(1.0);

    let quality = 0.3 * brightness_score + 0.5 * sharpness_score + 0.2 * contrast_score;
    quality.clamp(0.1, 1.0) as f32
}

/// ITU-R 601 luma, kept as f64 for the statistics below.
fn to_luma(image: &RgbImage) -> Vec<f64> {
    image
        .pixels()
        .map(|p| 0.299 * p.0[0] as f64 + 0.587 * p.0[1] as f64 + 0.114 * p.0[2] as f64)
        .collect()
}

fn mean_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Variance of the 4-neighbor Laplacian over interior pixels.
fn laplacian_variance(gray: &[f64], width: u32, height: u32) -> f64 {
    let (w, h) = (width as usize, height as usize);
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut responses = Vec::with_capacity((w - 2) * (h - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = gray[y * w + x];
            let lap = gray[(y - 1) * w + x] + gray[(y + 1) * w + x] + gray[y * w + x - 1]
                + gray[y * w + x + 1]
                - 4.0 * center;
            responses.push(lap);
        }
    }

    let (_, stddev) = mean_stddev(&responses);
    stddev * stddev
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn uniform(value: u8) -> RgbImage {
        RgbImage::from_pixel(64, 64, Rgb([value, value, value]))
    }

    fn checkerboard() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_black_frame_is_floor_quality() {
        // All three components are zero; the clamp keeps the floor at 0.1.
        let q = frame_quality(&uniform(0));
        assert!((q - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_mid_gray_frame_scores_brightness_only() {
        // Perfect brightness, zero sharpness and contrast: 0.3 weighted.
        let q = frame_quality(&uniform(128));
        assert!((q - 0.3).abs() < 0.01);
    }

    #[test]
    fn test_checkerboard_is_high_quality() {
        let q = frame_quality(&checkerboard());
        assert!(q > 0.95, "expected near-maximal quality, got {q}");
    }

    #[test]
    fn test_quality_always_in_bounds() {
        for v in [0u8, 40, 128, 200, 255] {
            let q = frame_quality(&uniform(v));
            assert!((0.1..=1.0).contains(&q), "quality {q} out of bounds");
        }
        let q = frame_quality(&checkerboard());
        assert!((0.1..=1.0).contains(&q));
    }
}
