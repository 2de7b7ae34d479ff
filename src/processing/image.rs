use image::{DynamicImage, GrayImage};
use imageproc::filter::box_filter;

const CONTRAST_FACTOR: f32 = 2.0;
const SHARPNESS_FACTOR: f32 = 2.0;
const BRIGHTNESS_FACTOR: f32 = 1.2;

// Radius of the box blur used as the reference for sharpening (3x3 window)
const SMOOTH_RADIUS: u32 = 1;

/// Grayscale conversion and the enhancement filters applied to scans with
/// poor contrast before OCR.
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
        img.to_luma8()
    }

    /// Contrast x2, then sharpness x2, then brightness x1.2.
    pub fn enhance(img: &GrayImage) -> GrayImage {
        let contrasted = Self::adjust_contrast(img, CONTRAST_FACTOR);
        let sharpened = Self::adjust_sharpness(&contrasted, SHARPNESS_FACTOR);
        Self::adjust_brightness(&sharpened, BRIGHTNESS_FACTOR)
    }

    /// Blends each pixel away from (factor > 1) or towards the mean gray level.
    pub fn adjust_contrast(img: &GrayImage, factor: f32) -> GrayImage {
        let pixel_count = (img.width() as u64 * img.height() as u64).max(1);
        let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
        let mean = (sum as f32 / pixel_count as f32).round();

        let mut adjusted = img.clone();
        for pixel in adjusted.pixels_mut() {
            pixel[0] = blend(mean, pixel[0] as f32, factor);
        }
        adjusted
    }

    /// Blends each pixel away from a smoothed copy of the image.
    pub fn adjust_sharpness(img: &GrayImage, factor: f32) -> GrayImage {
        let smoothed = box_filter(img, SMOOTH_RADIUS, SMOOTH_RADIUS);
        let mut adjusted = img.clone();
        for (pixel, reference) in adjusted.pixels_mut().zip(smoothed.pixels()) {
            pixel[0] = blend(reference[0] as f32, pixel[0] as f32, factor);
        }
        adjusted
    }

    pub fn adjust_brightness(img: &GrayImage, factor: f32) -> GrayImage {
        let mut adjusted = img.clone();
        for pixel in adjusted.pixels_mut() {
            pixel[0] = blend(0.0, pixel[0] as f32, factor);
        }
        adjusted
    }
}

fn blend(degenerate: f32, value: f32, factor: f32) -> u8 {
    let out = degenerate + (value - degenerate) * factor;
    out.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn two_tone() -> GrayImage {
        GrayImage::from_fn(4, 4, |x, _| if x < 2 { Luma([100]) } else { Luma([140]) })
    }

    #[test]
    fn test_contrast_spreads_around_mean() {
        let adjusted = ImageProcessor::adjust_contrast(&two_tone(), 2.0);
        assert_eq!(adjusted.get_pixel(0, 0)[0], 80);
        assert_eq!(adjusted.get_pixel(3, 0)[0], 160);
    }

    #[test]
    fn test_brightness_scales_and_clamps() {
        let img = GrayImage::from_fn(2, 1, |x, _| if x == 0 { Luma([100]) } else { Luma([250]) });
        let adjusted = ImageProcessor::adjust_brightness(&img, 1.2);
        assert_eq!(adjusted.get_pixel(0, 0)[0], 120);
        assert_eq!(adjusted.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_sharpness_leaves_flat_image_alone() {
        let flat = GrayImage::from_pixel(5, 5, Luma([90]));
        let adjusted = ImageProcessor::adjust_sharpness(&flat, 2.0);
        assert!(adjusted.pixels().all(|p| p[0] == 90));
    }

    #[test]
    fn test_enhance_keeps_dimensions() {
        let enhanced = ImageProcessor::enhance(&two_tone());
        assert_eq!(enhanced.dimensions(), (4, 4));
    }
}
