//! Skew estimation and correction.
//!
//! The skew of a page is read from the minimum-area rectangle around the
//! largest contour of its binary mask. Rectangle angles are reported in the
//! `[-90, 0)` convention, where an axis-aligned rectangle reads `-90`; the
//! cleaner folds them into `[-45, 45)` with [`normalize_skew_angle`] before
//! deciding whether to rotate.
//!
//! Angles are in degrees. Image coordinates have `y` pointing down, so a
//! positive angle means the content is turned clockwise on screen and
//! [`rotate_about_center`] with the same angle turns it back.

use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use tracing::debug;

/// Catmull-Rom style coefficient used for bicubic sampling.
const CUBIC_A: f64 = -0.75;

/// A rectangle with arbitrary orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    /// Orientation of the `width` edge, in `[-90, 0)`.
    pub angle: f64,
}

/// Absolute polygon area of a closed contour (shoelace formula).
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Points of the contour with the largest area, considering every border
/// (outer and hole) in the mask. Non-zero pixels are foreground.
///
/// Returns `None` when the mask has no foreground at all.
pub fn largest_contour(mask: &GrayImage) -> Option<Vec<Point<i32>>> {
    let contours = find_contours::<i32>(mask);
    debug!("Found {} contours", contours.len());

    let mut best: Option<(f64, Vec<Point<i32>>)> = None;
    for contour in contours {
        let area = contour_area(&contour.points);
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, contour.points)),
        }
    }
    best.map(|(_, points)| points)
}

/// Minimum-area bounding rectangle of a point set.
///
/// Tests every edge of the convex hull as a candidate side. Returns `None`
/// for an empty input.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<RotatedRect> {
    let hull: Vec<(f64, f64)> = convex_hull(points)
        .into_iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect();

    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle: -90.0,
            })
        }
        _ => {}
    }

    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..hull.len() {
        let (x0, y0) = hull[i];
        let (x1, y1) = hull[(i + 1) % hull.len()];
        let len = (x1 - x0).hypot(y1 - y0);
        if len == 0.0 {
            continue;
        }
        let u = ((x1 - x0) / len, (y1 - y0) / len);
        let n = (-u.1, u.0);

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_n, mut max_n) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(px, py) in &hull {
            let du = px * u.0 + py * u.1;
            let dn = px * n.0 + py * n.1;
            min_u = min_u.min(du);
            max_u = max_u.max(du);
            min_n = min_n.min(dn);
            max_n = max_n.max(dn);
        }

        let area = (max_u - min_u) * (max_n - min_n);
        if best.as_ref().is_some_and(|(a, _)| area >= *a) {
            continue;
        }

        let mid_u = (min_u + max_u) / 2.0;
        let mid_n = (min_n + max_n) / 2.0;
        let center = (mid_u * u.0 + mid_n * n.0, mid_u * u.1 + mid_n * n.1);
        let edge_angle = u.1.atan2(u.0).to_degrees();
        let (width, height) = (max_u - min_u, max_n - min_n);

        // Fold the edge direction into [-90, 0); every 90° step swaps sides.
        let mut rem = edge_angle.rem_euclid(90.0);
        if 90.0 - rem < 1e-9 {
            rem = 0.0;
        }
        let folded = rem - 90.0;
        let quarter_turns = ((edge_angle - folded) / 90.0).round() as i64;
        let (width, height) = if quarter_turns.rem_euclid(2) == 0 {
            (width, height)
        } else {
            (height, width)
        };

        best = Some((
            area,
            RotatedRect {
                center,
                width,
                height,
                angle: folded,
            },
        ));
    }

    best.map(|(_, rect)| rect)
}

/// Fold a `[-90, 0)` rectangle angle into `[-45, 45)`.
pub fn normalize_skew_angle(angle: f64) -> f64 {
    if angle < -45.0 {
        90.0 + angle
    } else {
        angle
    }
}

/// Normalised skew of the largest contour in `mask`, or `None` without contours.
pub fn estimate_skew(mask: &GrayImage) -> Option<f64> {
    let contour = largest_contour(mask)?;
    let rect = min_area_rect(&contour)?;
    let skew = normalize_skew_angle(rect.angle);
    debug!(
        "Largest contour: {} points, rect {:.1}x{:.1} at {:.2}° → skew {:.2}°",
        contour.len(),
        rect.width,
        rect.height,
        rect.angle,
        skew
    );
    Some(skew)
}

/// Rotate `image` about its integer centre `(w/2, h/2)` by `angle` degrees
/// (positive is counter-clockwise on screen), keeping the original size.
///
/// Samples with bicubic interpolation; coordinates falling outside the image
/// repeat the nearest edge pixel.
pub fn rotate_about_center(image: &GrayImage, angle: f64) -> GrayImage {
    let (w, h) = image.dimensions();
    let cx = (w / 2) as f64;
    let cy = (h / 2) as f64;
    let (sin, cos) = angle.to_radians().sin_cos();

    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let sx = cx + cos * dx - sin * dy;
        let sy = cy + sin * dx + cos * dy;
        Luma([sample_bicubic_replicate(image, sx, sy)])
    })
}

fn cubic_weights(t: f64) -> [f64; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let s = 1.0 - t;
    let w2 = ((a + 2.0) * s - (a + 3.0)) * s * s + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

fn sample_bicubic_replicate(image: &GrayImage, x: f64, y: f64) -> u8 {
    let (w, h) = image.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let wx = cubic_weights(x - x0);
    let wy = cubic_weights(y - y0);
    let clamp = |v: i64, len: u32| v.clamp(0, len as i64 - 1) as u32;

    let mut acc = 0.0;
    for (j, wyj) in wy.iter().enumerate() {
        let sy = clamp(y0 as i64 - 1 + j as i64, h);
        let mut row = 0.0;
        for (i, wxi) in wx.iter().enumerate() {
            let sx = clamp(x0 as i64 - 1 + i as i64, w);
            row += wxi * image.get_pixel(sx, sy).0[0] as f64;
        }
        acc += wyj * row;
    }
    acc.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White canvas with a black filled rectangle turned by `angle` degrees
    /// (clockwise on screen), as a binary-inverted mask would see it.
    fn tilted_block_mask(angle: f64) -> GrayImage {
        let (sin, cos) = angle.to_radians().sin_cos();
        GrayImage::from_fn(400, 300, |x, y| {
            let dx = x as f64 - 200.0;
            let dy = y as f64 - 150.0;
            let u = dx * cos + dy * sin;
            let v = -dx * sin + dy * cos;
            if u.abs() <= 120.0 && v.abs() <= 60.0 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    fn rotated_corners(angle: f64, half_w: f64, half_h: f64) -> Vec<Point<i32>> {
        let (sin, cos) = angle.to_radians().sin_cos();
        [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .iter()
            .map(|(sx, sy)| {
                let (lx, ly) = (sx * half_w, sy * half_h);
                let x = 2000.0 + lx * cos - ly * sin;
                let y = 2000.0 + lx * sin + ly * cos;
                Point::new(x.round() as i32, y.round() as i32)
            })
            .collect()
    }

    #[test]
    fn angle_below_minus_45_is_folded() {
        assert!((normalize_skew_angle(-60.0) - 30.0).abs() < 1e-9);
        assert!((normalize_skew_angle(-90.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn angle_above_minus_45_is_kept() {
        assert!((normalize_skew_angle(-10.0) + 10.0).abs() < 1e-9);
        assert!((normalize_skew_angle(-45.0) + 45.0).abs() < 1e-9);
    }

    #[test]
    fn contour_area_of_square() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert!((contour_area(&square) - 100.0).abs() < 1e-9);
        assert_eq!(contour_area(&square[..2]), 0.0);
    }

    #[test]
    fn axis_aligned_rect_reads_minus_90() {
        let pts = rotated_corners(0.0, 300.0, 100.0);
        let rect = min_area_rect(&pts).unwrap();
        assert!((rect.angle + 90.0).abs() < 1e-6, "angle {}", rect.angle);
        assert!((rect.width * rect.height - 600.0 * 200.0).abs() < 1.0);
        assert_eq!(normalize_skew_angle(rect.angle), 0.0);
    }

    #[test]
    fn rect_turned_30_degrees_reads_minus_60() {
        let pts = rotated_corners(30.0, 800.0, 400.0);
        let rect = min_area_rect(&pts).unwrap();
        assert!((rect.angle + 60.0).abs() < 0.1, "angle {}", rect.angle);
        assert!((normalize_skew_angle(rect.angle) - 30.0).abs() < 0.1);
        assert!((rect.center.0 - 2000.0).abs() < 1.0);
        assert!((rect.center.1 - 2000.0).abs() < 1.0);
    }

    #[test]
    fn single_point_rect_is_unrotated() {
        let rect = min_area_rect(&[Point::new(5, 5)]).unwrap();
        assert_eq!(normalize_skew_angle(rect.angle), 0.0);
        assert!(min_area_rect(&[]).is_none());
    }

    #[test]
    fn empty_mask_has_no_skew() {
        let mask = GrayImage::new(50, 40);
        assert!(largest_contour(&mask).is_none());
        assert!(estimate_skew(&mask).is_none());
    }

    #[test]
    fn tilted_block_skew_is_measured() {
        let skew = estimate_skew(&tilted_block_mask(4.0)).expect("block has a contour");
        assert!((skew - 4.0).abs() < 1.5, "skew {skew}");

        let skew = estimate_skew(&tilted_block_mask(-6.0)).expect("block has a contour");
        assert!((skew + 6.0).abs() < 1.5, "skew {skew}");
    }

    #[test]
    fn zero_rotation_is_identity() {
        let img = GrayImage::from_fn(31, 17, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        assert_eq!(rotate_about_center(&img, 0.0), img);
    }

    #[test]
    fn rotation_replicates_edges() {
        // A constant-fill border would darken the corners; replication keeps them.
        let img = GrayImage::from_pixel(60, 40, Luma([200]));
        let rotated = rotate_about_center(&img, 7.0);
        assert!(rotated.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn rotation_turns_content_back() {
        let mask = tilted_block_mask(5.0);
        let straightened = rotate_about_center(&mask, 5.0);
        // The binary mask's own threshold blurs under bicubic sampling, so
        // re-binarise before measuring.
        let rebinarised = GrayImage::from_fn(400, 300, |x, y| {
            Luma([if straightened.get_pixel(x, y).0[0] > 127 { 255 } else { 0 }])
        });
        let skew = estimate_skew(&rebinarised).unwrap();
        assert!(skew.abs() < 1.5, "residual skew {skew}");
    }
}
