//! Person-crop extraction and scoring.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, DynamicImage, RgbImage};

use sleuth_models::{BBox, Crop, Detection};

use crate::decode::Frame;
use crate::error::MediaResult;

/// Normalizer for the centrality term of the crop quality score.
const POSITION_NORM: f32 = 1500.0;

/// Cut a detection's crop out of a frame.
///
/// The bounding box is clipped to the frame; crops smaller than
/// `min_width x min_height` (and degenerate boxes) are rejected by
/// returning `None`. Both conditions are recoverable, the detection is
/// simply discarded.
pub fn extract_crop(
    frame: &Frame,
    detection: &Detection,
    min_width: u32,
    min_height: u32,
) -> MediaResult<Option<Crop>> {
    let bbox = detection.bbox.clipped(frame.width, frame.height);
    if !bbox.is_valid() {
        return Ok(None);
    }

    let x = bbox.x1 as u32;
    let y = bbox.y1 as u32;
    let width = bbox.width() as u32;
    let height = bbox.height() as u32;
    if width < min_width || height < min_height {
        return Ok(None);
    }

    let cropped = imageops::crop_imm(&frame.image, x, y, width, height).to_image();
    let quality = crop_quality(width, height, &bbox, frame.width, frame.height);
    let png = encode_png(&cropped)?;

    Ok(Some(Crop {
        image_base64: STANDARD.encode(png),
        bbox,
        width,
        height,
        quality,
    }))
}

/// Heuristic crop quality: mean of aspect, size and centrality scores.
///
/// Human figures are taller than wide, so the aspect band rewards
/// height/width between 1.5 and 3.0.
pub fn crop_quality(width: u32, height: u32, bbox: &BBox, frame_width: u32, frame_height: u32) -> f32 {
    let aspect = height as f32 / width as f32;
    let aspect_score = if (1.5..=3.0).contains(&aspect) { 1.0 } else { 0.7 };

    let area = width * height;
    let size_score = if (10_000..=100_000).contains(&area) { 1.0 } else { 0.8 };

    let (cx, cy) = bbox.center();
    let distance_from_center =
        (cx - frame_width as f32 / 2.0).abs() + (cy - frame_height as f32 / 2.0).abs();
    let position_score = (1.0 - distance_from_center / POSITION_NORM).max(0.5);

    (aspect_score + size_score + position_score) / 3.0
}

/// Encode a whole frame as PNG for shipping to the detector service.
pub fn encode_frame_png(frame: &Frame) -> MediaResult<Vec<u8>> {
    encode_png(&frame.image)
}

fn encode_png(image: &RgbImage) -> MediaResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone()).write_to(&mut buf, image::ImageOutputFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame(width: u32, height: u32) -> Frame {
        Frame {
            index: 0,
            sample_index: 0,
            timestamp: 0.0,
            width,
            height,
            image: RgbImage::from_pixel(width, height, Rgb([40, 80, 120])),
        }
    }

    fn person(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection::person(BBox::new(x1, y1, x2, y2), 0.9)
    }

    #[test]
    fn test_extracts_valid_crop() {
        let f = frame(1920, 1080);
        // Centered 100x200 box: ideal aspect, ideal size, ideal position.
        let d = person(910.0, 440.0, 1010.0, 640.0);
        let crop = extract_crop(&f, &d, 50, 100).unwrap().unwrap();

        assert_eq!(crop.width, 100);
        assert_eq!(crop.height, 200);
        assert!((crop.quality - 1.0).abs() < 1e-5);
        assert!(!crop.image_base64.is_empty());
    }

    #[test]
    fn test_rejects_small_crop() {
        let f = frame(1920, 1080);
        let d = person(0.0, 0.0, 40.0, 80.0);
        assert!(extract_crop(&f, &d, 50, 100).unwrap().is_none());
    }

    #[test]
    fn test_clips_out_of_bounds_box() {
        let f = frame(640, 480);
        let d = person(600.0, 400.0, 900.0, 900.0);
        let crop = extract_crop(&f, &d, 10, 10).unwrap().unwrap();
        assert_eq!(crop.width, 40);
        assert_eq!(crop.height, 80);
        assert_eq!(crop.bbox.x2, 640.0);
        assert_eq!(crop.bbox.y2, 480.0);
    }

    #[test]
    fn test_rejects_fully_outside_box() {
        let f = frame(640, 480);
        let d = person(700.0, 500.0, 800.0, 700.0);
        assert!(extract_crop(&f, &d, 10, 10).unwrap().is_none());
    }

    #[test]
    fn test_crop_quality_penalties() {
        // Square box: aspect out of band; tiny area; far corner position.
        let bbox = BBox::new(0.0, 0.0, 60.0, 60.0);
        let q = crop_quality(60, 60, &bbox, 1920, 1080);
        let expected = (0.7 + 0.8 + 0.5) / 3.0;
        assert!((q - expected).abs() < 1e-5);
    }

    #[test]
    fn test_encoded_png_round_trips() {
        let f = frame(64, 128);
        let png = encode_frame_png(&f).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 128);
    }
}
