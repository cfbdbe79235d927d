//! Annotated keyframe rendering

use super::objects::{Detection, PixelRect};
use crate::error::CheckResult;
use image::{Rgb, RgbImage};
use std::path::Path;

/// Box colours; a label always maps to the same entry
pub const PALETTE: [[u8; 3]; 10] = [
    [255, 0, 0],
    [0, 200, 0],
    [0, 128, 255],
    [255, 165, 0],
    [186, 85, 211],
    [255, 105, 180],
    [50, 205, 50],
    [255, 215, 0],
    [70, 130, 180],
    [255, 69, 0],
];

const OUTLINE_WIDTH: u32 = 3;
/// Height of the filled tab drawn above each box
const TAB_HEIGHT: u32 = 6;

pub fn color_for(label: &str) -> Rgb<u8> {
    let sum: usize = label.chars().map(|c| c as usize).sum();
    Rgb(PALETTE[sum % PALETTE.len()])
}

/// Draw every detection onto `image`
pub fn annotate(image: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
        let color = color_for(&detection.label);
        draw_outline(image, detection.rect, color);
        draw_tab(image, detection.rect, color);
    }
}

/// Load a keyframe, annotate it and write it to `output` (format from extension)
pub fn render_to_file(keyframe: &Path, detections: &[Detection], output: &Path) -> CheckResult<()> {
    let mut image = image::open(keyframe)?.to_rgb8();
    annotate(&mut image, detections);
    image.save(output)?;
    Ok(())
}

fn draw_outline(image: &mut RgbImage, rect: PixelRect, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let x_end = (rect.x + rect.width).min(width.saturating_sub(1));
    let y_end = (rect.y + rect.height).min(height.saturating_sub(1));

    for t in 0..OUTLINE_WIDTH {
        for x in rect.x..=x_end {
            put(image, x, rect.y + t, color);
            put(image, x, y_end.saturating_sub(t), color);
        }
        for y in rect.y..=y_end {
            put(image, rect.x + t, y, color);
            put(image, x_end.saturating_sub(t), y, color);
        }
    }
}

fn draw_tab(image: &mut RgbImage, rect: PixelRect, color: Rgb<u8>) {
    let top = rect.y.saturating_sub(TAB_HEIGHT);
    let right = rect.x + rect.width.min(8 * TAB_HEIGHT);
    for y in top..rect.y {
        for x in rect.x..right {
            put(image, x, y, color);
        }
    }
}

fn put(image: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn detection(label: &str, x: u32, y: u32, width: u32, height: u32) -> Detection {
        Detection {
            label: label.to_string(),
            score: 0.9,
            rect: PixelRect {
                x,
                y,
                width,
                height,
            },
        }
    }

    #[test]
    fn test_color_stable_per_label() {
        assert_eq!(color_for("Person"), color_for("Person"));
        assert_eq!(color_for(""), Rgb(PALETTE[0]));
    }

    #[test]
    fn test_annotate_draws_outline_not_interior() {
        let mut image = RgbImage::new(40, 40);
        annotate(&mut image, &[detection("Car", 10, 10, 20, 20)]);

        let color = color_for("Car");
        assert_eq!(*image.get_pixel(10, 10), color);
        assert_eq!(*image.get_pixel(30, 20), color);
        assert_eq!(*image.get_pixel(20, 20), Rgb([0, 0, 0]));
        // Tab above the box
        assert_eq!(*image.get_pixel(12, 5), color);
    }

    #[test]
    fn test_box_past_edge_is_clipped() {
        let mut image = RgbImage::new(16, 16);
        annotate(&mut image, &[detection("Dog", 8, 8, 50, 50)]);
        assert_eq!(*image.get_pixel(15, 15), color_for("Dog"));
    }

    #[test]
    fn test_render_to_file_writes_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let keyframe = temp_dir.path().join("001.jpg");
        RgbImage::new(32, 24).save(&keyframe).unwrap();

        let output = temp_dir.path().join("random1.jpg");
        render_to_file(&keyframe, &[detection("Cat", 2, 2, 10, 10)], &output).unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (32, 24));
    }
}
