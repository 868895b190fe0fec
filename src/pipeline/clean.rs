//! Image cleaning: turn a rendered page into a binary image Tesseract reads well.
//!
//! ## Steps
//!
//! 1. Grayscale.
//! 2. Inverted global threshold (`> 128` → 0, else 255) so ink is foreground.
//! 3. Largest contour → minimum-area rectangle → skew angle
//!    (see [`crate::pipeline::deskew`]).
//! 4. If the skew exceeds `min_skew_degrees`, rotate the *grayscale* page
//!    back with bicubic sampling and replicated edges.
//! 5. Adaptive Gaussian threshold: a pixel is white when it is brighter than
//!    its Gaussian-weighted neighbourhood mean minus `adaptive_offset`.
//!
//! The whole transform is a pure function of the input pixels and the
//! [`CleanerParams`].

use crate::error::PdfOcrError;
use crate::pipeline::deskew::{estimate_skew, rotate_about_center};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::map::map_colors;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Global threshold for the contour mask.
pub const DEFAULT_BINARY_THRESHOLD: u8 = 128;

/// Side length of the adaptive-threshold neighbourhood (odd).
pub const DEFAULT_ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the neighbourhood mean.
pub const DEFAULT_ADAPTIVE_OFFSET: i32 = 2;

/// Skew angles at or below this magnitude are left alone.
pub const DEFAULT_MIN_SKEW_DEGREES: f32 = 0.5;

/// Tunables for [`clean_page`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanerParams {
    pub binary_threshold: u8,
    pub adaptive_block_size: u32,
    pub adaptive_offset: i32,
    pub min_skew_degrees: f32,
}

impl Default for CleanerParams {
    fn default() -> Self {
        Self {
            binary_threshold: DEFAULT_BINARY_THRESHOLD,
            adaptive_block_size: DEFAULT_ADAPTIVE_BLOCK_SIZE,
            adaptive_offset: DEFAULT_ADAPTIVE_OFFSET,
            min_skew_degrees: DEFAULT_MIN_SKEW_DEGREES,
        }
    }
}

impl CleanerParams {
    pub fn validate(&self) -> Result<(), PdfOcrError> {
        let n = self.adaptive_block_size;
        if n < 3 || n % 2 == 0 {
            return Err(PdfOcrError::InvalidConfig(format!(
                "Adaptive block size must be an odd number ≥ 3, got {n}"
            )));
        }
        if !self.min_skew_degrees.is_finite() || self.min_skew_degrees < 0.0 {
            return Err(PdfOcrError::InvalidConfig(format!(
                "Minimum skew must be a non-negative angle, got {}",
                self.min_skew_degrees
            )));
        }
        Ok(())
    }
}

/// Output of [`clean_page`].
#[derive(Debug, Clone)]
pub struct CleanedPage {
    /// Binary image (0 or 255 only), same size as the input page.
    pub image: GrayImage,
    /// Normalised skew of the largest contour, if any contour was found.
    pub skew_angle: Option<f32>,
    /// Whether the page was rotated before thresholding.
    pub deskewed: bool,
}

/// Clean one rendered page for OCR.
pub fn clean_page(page: &DynamicImage, params: &CleanerParams) -> CleanedPage {
    let gray = page.to_luma8();
    let mask = binarize_inverted(&gray, params.binary_threshold);

    let skew = estimate_skew(&mask);
    let (source, deskewed) = match skew {
        Some(angle) if angle.abs() > params.min_skew_degrees as f64 => {
            debug!("Deskewing by {:.2}°", angle);
            (rotate_about_center(&gray, angle), true)
        }
        _ => (gray, false),
    };

    let image = adaptive_gaussian_threshold(
        &source,
        params.adaptive_block_size,
        params.adaptive_offset,
    );

    CleanedPage {
        image,
        skew_angle: skew.map(|a| a as f32),
        deskewed,
    }
}

/// Inverted global threshold: pixels brighter than `threshold` become 0,
/// the rest 255.
pub fn binarize_inverted(gray: &GrayImage, threshold: u8) -> GrayImage {
    map_colors(gray, |p: Luma<u8>| {
        if p.0[0] > threshold {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Adaptive threshold against a Gaussian-weighted local mean.
///
/// The mean uses a `block_size`-tap separable Gaussian whose sigma is derived
/// from the block size, with replicated borders. Output is 255 where
/// `pixel > mean - offset` and 0 elsewhere.
pub fn adaptive_gaussian_threshold(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let mean = gaussian_blur_replicate(gray, &gaussian_kernel(block_size));
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let src = gray.get_pixel(x, y).0[0] as i32;
        let local = mean.get_pixel(x, y).0[0] as i32;
        if src > local - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Sigma used for an `n`-tap kernel when none is given explicitly.
pub fn kernel_sigma(n: u32) -> f64 {
    0.3 * ((n as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1-D Gaussian kernel of length `n`.
pub fn gaussian_kernel(n: u32) -> Vec<f64> {
    let sigma = kernel_sigma(n);
    let half = (n as f64 - 1.0) / 2.0;
    let scale = -0.5 / (sigma * sigma);
    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let d = i as f64 - half;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

// imageproc's separable filters round the horizontal pass to u8; this keeps it in f64.
fn gaussian_blur_replicate(gray: &GrayImage, kernel: &[f64]) -> GrayImage {
    let (w, h) = gray.dimensions();
    let radius = (kernel.len() / 2) as i64;
    let clamp = |v: i64, len: u32| v.clamp(0, len as i64 - 1) as u32;

    // Horizontal pass kept in f64 so rounding happens once.
    let mut horizontal = vec![0.0f64; (w as usize) * (h as usize)];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp(x as i64 + k as i64 - radius, w);
                acc += weight * gray.get_pixel(sx, y).0[0] as f64;
            }
            horizontal[(y * w + x) as usize] = acc;
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0.0;
        for (k, weight) in kernel.iter().enumerate() {
            let sy = clamp(y as i64 + k as i64 - radius, h);
            acc += weight * horizontal[(sy * w + x) as usize];
        }
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn blank_page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 160, Rgb([255, 255, 255])))
    }

    /// White page with a dark block turned clockwise by `angle` degrees.
    fn tilted_block_page(angle: f64) -> DynamicImage {
        let (sin, cos) = angle.to_radians().sin_cos();
        DynamicImage::ImageRgb8(RgbImage::from_fn(400, 300, |x, y| {
            let dx = x as f64 - 200.0;
            let dy = y as f64 - 150.0;
            let u = dx * cos + dy * sin;
            let v = -dx * sin + dy * cos;
            if u.abs() <= 120.0 && v.abs() <= 60.0 {
                Rgb([20, 20, 20])
            } else {
                Rgb([250, 250, 250])
            }
        }))
    }

    #[test]
    fn blank_page_skips_deskew() {
        let cleaned = clean_page(&blank_page(), &CleanerParams::default());
        assert!(cleaned.skew_angle.is_none());
        assert!(!cleaned.deskewed);
        assert_eq!(cleaned.image.dimensions(), (120, 160));
        assert!(cleaned.image.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn cleaning_is_deterministic() {
        let page = tilted_block_page(3.0);
        let a = clean_page(&page, &CleanerParams::default());
        let b = clean_page(&page, &CleanerParams::default());
        assert_eq!(a.image.as_raw(), b.image.as_raw());
        assert_eq!(a.skew_angle, b.skew_angle);
    }

    #[test]
    fn tilted_page_is_deskewed() {
        let cleaned = clean_page(&tilted_block_page(4.0), &CleanerParams::default());
        assert!(cleaned.deskewed);
        let skew = cleaned.skew_angle.unwrap();
        assert!((skew - 4.0).abs() < 1.5, "skew {skew}");
    }

    #[test]
    fn negative_tilt_keeps_its_sign_and_rotates() {
        let cleaned = clean_page(&tilted_block_page(-10.0), &CleanerParams::default());
        assert!(cleaned.deskewed);
        let skew = cleaned.skew_angle.unwrap();
        assert!((skew + 10.0).abs() < 1.0, "skew {skew}");
    }

    #[test]
    fn straight_page_is_not_rotated() {
        let cleaned = clean_page(&tilted_block_page(0.0), &CleanerParams::default());
        assert!(!cleaned.deskewed);
        assert!(cleaned.skew_angle.unwrap().abs() <= 0.5);
    }

    #[test]
    fn min_skew_is_an_override_point() {
        let params = CleanerParams {
            min_skew_degrees: 10.0,
            ..CleanerParams::default()
        };
        let cleaned = clean_page(&tilted_block_page(4.0), &params);
        assert!(!cleaned.deskewed);
    }

    #[test]
    fn output_is_binary() {
        let cleaned = clean_page(&tilted_block_page(2.0), &CleanerParams::default());
        assert!(cleaned.image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn inverted_threshold_marks_ink() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[0u8, 128, 129][x as usize]]));
        let mask = binarize_inverted(&gray, 128);
        assert_eq!(mask.as_raw(), &vec![255, 255, 0]);
    }

    #[test]
    fn adaptive_threshold_keeps_strokes_dark() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([230]));
        for x in 5..35 {
            gray.put_pixel(x, 20, Luma([30]));
        }
        let out = adaptive_gaussian_threshold(&gray, 11, 2);
        assert_eq!(out.get_pixel(20, 20).0[0], 0);
        assert_eq!(out.get_pixel(20, 2).0[0], 255);
        // Uniform regions equal their own mean and stay white.
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn kernel_for_block_11_uses_sigma_2() {
        assert!((kernel_sigma(11) - 2.0).abs() < 1e-12);
        let k = gaussian_kernel(11);
        assert_eq!(k.len(), 11);
        assert!((k.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((k[0] - k[10]).abs() < 1e-15);
        assert!(k[5] > k[4]);
    }

    #[test]
    fn params_reject_even_block_size() {
        let params = CleanerParams {
            adaptive_block_size: 12,
            ..CleanerParams::default()
        };
        assert!(params.validate().is_err());
        assert!(CleanerParams::default().validate().is_ok());
    }
}
