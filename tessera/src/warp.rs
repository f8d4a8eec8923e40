//! Pull-based projective warping with bilinear interpolation.
//!
//! Every destination pixel is mapped back through the inverse transform and
//! sampled from the source. Destination pixels whose preimage falls outside
//! the source keep whatever the canvas was filled with.

use common::Buffer2;
use glam::DVec2;

use crate::math::DMat3;

/// A sample type that can be interpolated.
pub trait Pixel: Copy {
    fn interpolate(self, other: Self, t: f32) -> Self;

    fn average(self, other: Self) -> Self {
        self.interpolate(other, 0.5)
    }
}

impl Pixel for f32 {
    #[inline]
    fn interpolate(self, other: Self, t: f32) -> Self {
        self + t * (other - self)
    }
}

impl Pixel for [f32; 3] {
    #[inline]
    fn interpolate(self, other: Self, t: f32) -> Self {
        [
            self[0].interpolate(other[0], t),
            self[1].interpolate(other[1], t),
            self[2].interpolate(other[2], t),
        ]
    }
}

/// Bilinear sample at `p`, or `None` outside `[0, w-1] x [0, h-1]`.
#[inline]
pub fn bilinear_sample<P: Pixel>(input: &Buffer2<P>, p: DVec2) -> Option<P> {
    let max_x = input.width() as f64 - 1.0;
    let max_y = input.height() as f64 - 1.0;
    if !(p.x >= 0.0 && p.y >= 0.0 && p.x <= max_x && p.y <= max_y) {
        return None;
    }

    let x0 = p.x.floor() as usize;
    let y0 = p.y.floor() as usize;
    let x1 = (x0 + 1).min(input.width() - 1);
    let y1 = (y0 + 1).min(input.height() - 1);
    let fx = (p.x - x0 as f64) as f32;
    let fy = (p.y - y0 as f64) as f32;

    let top = input.get(x0, y0).interpolate(*input.get(x1, y0), fx);
    let bottom = input.get(x0, y1).interpolate(*input.get(x1, y1), fx);
    Some(top.interpolate(bottom, fy))
}

/// Source sample for destination pixel `(x, y)` through `inverse`.
#[inline]
fn pull<P: Pixel>(input: &Buffer2<P>, inverse: &DMat3, x: usize, y: usize) -> Option<P> {
    let src = inverse.try_transform_point(DVec2::new(x as f64, y as f64))?;
    bilinear_sample(input, src)
}

/// Warp `input` through `transform` into `output`.
///
/// Returns `false`, leaving `output` untouched, when the transform is not
/// invertible.
pub fn warp_into<P: Pixel>(input: &Buffer2<P>, transform: &DMat3, output: &mut Buffer2<P>) -> bool {
    let Some(inverse) = transform.inverse() else {
        return false;
    };
    for y in 0..output.height() {
        for (x, out) in output.row_mut(y).iter_mut().enumerate() {
            if let Some(v) = pull(input, &inverse, x, y) {
                *out = v;
            }
        }
    }
    true
}

/// Warp two images into one canvas, averaging where both cover a pixel.
///
/// Returns `false`, leaving `output` untouched, when either transform is not
/// invertible.
pub fn warp_pair_into<P: Pixel>(
    input1: &Buffer2<P>,
    transform1: &DMat3,
    input2: &Buffer2<P>,
    transform2: &DMat3,
    output: &mut Buffer2<P>,
) -> bool {
    let (Some(inverse1), Some(inverse2)) = (transform1.inverse(), transform2.inverse()) else {
        return false;
    };
    for y in 0..output.height() {
        for (x, out) in output.row_mut(y).iter_mut().enumerate() {
            let a = pull(input1, &inverse1, x, y);
            let b = pull(input2, &inverse2, x, y);
            match (a, b) {
                (Some(a), Some(b)) => *out = a.average(b),
                (Some(v), None) | (None, Some(v)) => *out = v,
                (None, None) => {}
            }
        }
    }
    true
}
