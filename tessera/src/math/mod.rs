//! Planar geometry: the 3x3 matrix type plus the elementary transforms built from it.

mod dmat3;

pub use dmat3::DMat3;

/// Returns the 3x3 matrix translating by `(dx, dy)`.
#[inline]
pub fn translation(dx: f64, dy: f64) -> DMat3 {
    DMat3::translation(dx, dy)
}

/// Returns the 3x3 matrix zooming by `z` then translating by `(dx, dy)`.
#[inline]
pub fn zoom_translation(z: f64, dx: f64, dy: f64) -> DMat3 {
    DMat3::zoom_translation(z, dx, dy)
}
