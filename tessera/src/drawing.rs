//! Line drawing for the match overlays.

use glam::DVec2;

use crate::color::Color;
use crate::image::RgbImage;

/// Anything a segment can be drawn onto.
///
/// The visualization composer only talks to this trait, so tests can record
/// segments instead of rasterizing them.
pub trait DrawTarget {
    fn draw_segment(&mut self, from: DVec2, to: DVec2, color: Color);
}

impl DrawTarget for RgbImage {
    fn draw_segment(&mut self, from: DVec2, to: DVec2, color: Color) {
        draw_line(self, from, to, color);
    }
}

/// Converts a point to integer pixel coordinates by truncation toward zero.
///
/// Returns `None` for non-finite or astronomically large coordinates, which
/// arise from points mapped to (or near) infinity.
#[inline]
pub fn truncate_point(p: DVec2) -> Option<(i64, i64)> {
    const MAX_COORD: f64 = 1e12;
    if !p.is_finite() || p.x.abs() > MAX_COORD || p.y.abs() > MAX_COORD {
        return None;
    }
    Some((p.x as i64, p.y as i64))
}

/// Draw a one-pixel line between two points.
///
/// Endpoints are truncated to integers first. Pixels outside the image are
/// skipped.
pub fn draw_line(image: &mut RgbImage, start: DVec2, end: DVec2, color: Color) {
    let (Some((x1, y1)), Some((x2, y2))) = (truncate_point(start), truncate_point(end)) else {
        return;
    };
    let rgb = color.to_rgb();

    let dx = x2 - x1;
    let dy = y2 - y1;
    let steps = dx.abs().max(dy.abs());

    if steps == 0 {
        // Just a point
        if let Some(px) = image.try_get_mut(x1, y1) {
            *px = rgb;
        }
        return;
    }

    let Some((first, last)) = visible_steps(x1, y1, dx, dy, steps, image) else {
        return;
    };

    for i in first..=last {
        let t = i as f64 / steps as f64;
        let x = (x1 as f64 + dx as f64 * t).round() as i64;
        let y = (y1 as f64 + dy as f64 * t).round() as i64;
        if let Some(px) = image.try_get_mut(x, y) {
            *px = rgb;
        }
    }
}

/// Range of step indices whose position can land inside the image.
///
/// Far-off endpoints (from near-degenerate transforms) would otherwise walk
/// billions of pixels outside the canvas.
fn visible_steps(
    x1: i64,
    y1: i64,
    dx: i64,
    dy: i64,
    steps: i64,
    image: &RgbImage,
) -> Option<(i64, i64)> {
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let axes = [
        (x1 as f64, dx as f64, image.width() as f64),
        (y1 as f64, dy as f64, image.height() as f64),
    ];
    for (start, delta, size) in axes {
        // one pixel of slack on each side covers the rounding in the stepper
        let lo = -1.0;
        let hi = size;
        if delta == 0.0 {
            if start < lo || start > hi {
                return None;
            }
            continue;
        }
        let a = (lo - start) / delta;
        let b = (hi - start) / delta;
        t0 = t0.max(a.min(b));
        t1 = t1.min(a.max(b));
    }
    if t0 > t1 {
        return None;
    }

    let s = steps as f64;
    let first = ((t0 * s).floor() as i64).max(0);
    let last = ((t1 * s).ceil() as i64).min(steps);
    Some((first, last))
}
