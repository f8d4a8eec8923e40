//! Row-major 3x3 matrix of f64 values, used for every planar transform.

use glam::{DVec2, DVec3};
use std::ops::{Index, IndexMut, Mul};

/// Row-major 3x3 matrix of f64 values.
///
/// Memory layout:
/// ```text
/// | m[0] m[1] m[2] |
/// | m[3] m[4] m[5] |
/// | m[6] m[7] m[8] |
/// ```
///
/// As a 2D homogeneous transform:
/// ```text
/// | a  b  tx |
/// | c  d  ty |
/// | g  h  1  |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DMat3 {
    data: [f64; 9],
}

impl DMat3 {
    /// Create from a raw array in row-major order.
    #[inline]
    pub const fn from_array(data: [f64; 9]) -> Self {
        Self { data }
    }

    /// Create the 3x3 identity matrix.
    #[inline]
    pub const fn identity() -> Self {
        Self {
            data: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// All-zero matrix. Written to the coefficient buffer when no transform exists.
    #[inline]
    pub const fn zeros() -> Self {
        Self { data: [0.0; 9] }
    }

    /// Create from three row arrays.
    #[inline]
    pub const fn from_rows(row0: [f64; 3], row1: [f64; 3], row2: [f64; 3]) -> Self {
        Self {
            data: [
                row0[0], row0[1], row0[2], row1[0], row1[1], row1[2], row2[0], row2[1], row2[2],
            ],
        }
    }

    /// Pure translation by `(dx, dy)`.
    #[inline]
    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self {
            data: [1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0],
        }
    }

    /// Uniform zoom by `z` followed by a translation by `(dx, dy)`.
    #[inline]
    pub const fn zoom_translation(z: f64, dx: f64, dy: f64) -> Self {
        Self {
            data: [z, 0.0, dx, 0.0, z, dy, 0.0, 0.0, 1.0],
        }
    }

    /// Reference to the underlying row-major array.
    #[inline]
    pub const fn as_array(&self) -> &[f64; 9] {
        &self.data
    }

    /// Consume and return the underlying array.
    #[inline]
    pub const fn to_array(self) -> [f64; 9] {
        self.data
    }

    /// Matrix multiplication: `self * rhs`.
    #[inline]
    pub fn mul_mat(&self, rhs: &DMat3) -> DMat3 {
        let a = &self.data;
        let b = &rhs.data;
        DMat3 {
            data: [
                a[0] * b[0] + a[1] * b[3] + a[2] * b[6],
                a[0] * b[1] + a[1] * b[4] + a[2] * b[7],
                a[0] * b[2] + a[1] * b[5] + a[2] * b[8],
                a[3] * b[0] + a[4] * b[3] + a[5] * b[6],
                a[3] * b[1] + a[4] * b[4] + a[5] * b[7],
                a[3] * b[2] + a[4] * b[5] + a[5] * b[8],
                a[6] * b[0] + a[7] * b[3] + a[8] * b[6],
                a[6] * b[1] + a[7] * b[4] + a[8] * b[7],
                a[6] * b[2] + a[7] * b[5] + a[8] * b[8],
            ],
        }
    }

    /// Compute the determinant.
    #[inline]
    pub fn determinant(&self) -> f64 {
        let d = &self.data;
        d[0] * (d[4] * d[8] - d[5] * d[7]) - d[1] * (d[3] * d[8] - d[5] * d[6])
            + d[2] * (d[3] * d[7] - d[4] * d[6])
    }

    /// Compute the matrix inverse, or `None` if singular.
    ///
    /// Uses a fixed threshold of 1e-12 for singularity detection,
    /// appropriate for pixel-scale coordinates.
    pub fn inverse(&self) -> Option<DMat3> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let d = &self.data;
        Some(DMat3 {
            data: [
                (d[4] * d[8] - d[5] * d[7]) * inv_det,
                (d[2] * d[7] - d[1] * d[8]) * inv_det,
                (d[1] * d[5] - d[2] * d[4]) * inv_det,
                (d[5] * d[6] - d[3] * d[8]) * inv_det,
                (d[0] * d[8] - d[2] * d[6]) * inv_det,
                (d[2] * d[3] - d[0] * d[5]) * inv_det,
                (d[3] * d[7] - d[4] * d[6]) * inv_det,
                (d[1] * d[6] - d[0] * d[7]) * inv_det,
                (d[0] * d[4] - d[1] * d[3]) * inv_det,
            ],
        })
    }

    /// Divide by the bottom-right entry so that `m[8] == 1`.
    ///
    /// Returns `None` when `m[8]` is zero or not finite.
    pub fn normalized(&self) -> Option<DMat3> {
        let scale = self.data[8];
        if !scale.is_finite() || scale.abs() < f64::EPSILON {
            return None;
        }
        Some(*self * (1.0 / scale))
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Homogeneous product `M * (x, y, 1)` without the perspective divide.
    #[inline]
    pub fn transform_homogeneous(&self, p: DVec2) -> DVec3 {
        let d = &self.data;
        DVec3::new(
            d[0] * p.x + d[1] * p.y + d[2],
            d[3] * p.x + d[4] * p.y + d[5],
            d[6] * p.x + d[7] * p.y + d[8],
        )
    }

    /// Apply this matrix as a 2D homogeneous transform to a point.
    ///
    /// Returns `None` for points mapped to infinity (`w ≈ 0`).
    #[inline]
    pub fn try_transform_point(&self, p: DVec2) -> Option<DVec2> {
        let h = self.transform_homogeneous(p);
        if h.z.abs() <= f64::EPSILON {
            return None;
        }
        Some(DVec2::new(h.x / h.z, h.y / h.z))
    }

    /// Apply this matrix as a 2D homogeneous transform to a point.
    ///
    /// Points at infinity come back as non-finite coordinates; callers that
    /// draw or sample must tolerate that.
    #[inline]
    pub fn transform_point(&self, p: DVec2) -> DVec2 {
        let h = self.transform_homogeneous(p);
        DVec2::new(h.x / h.z, h.y / h.z)
    }
}

impl Default for DMat3 {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 9]> for DMat3 {
    #[inline]
    fn from(data: [f64; 9]) -> Self {
        Self { data }
    }
}

impl From<DMat3> for [f64; 9] {
    #[inline]
    fn from(m: DMat3) -> Self {
        m.data
    }
}

impl Index<usize> for DMat3 {
    type Output = f64;
    #[inline]
    fn index(&self, idx: usize) -> &f64 {
        &self.data[idx]
    }
}

impl IndexMut<usize> for DMat3 {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.data[idx]
    }
}

impl Mul for DMat3 {
    type Output = DMat3;
    #[inline]
    fn mul(self, rhs: DMat3) -> DMat3 {
        self.mul_mat(&rhs)
    }
}

impl Mul<DVec2> for DMat3 {
    type Output = DVec2;
    /// Homogeneous point transform: `matrix * point`.
    #[inline]
    fn mul(self, rhs: DVec2) -> DVec2 {
        self.transform_point(rhs)
    }
}

impl Mul<f64> for DMat3 {
    type Output = DMat3;
    #[inline]
    fn mul(self, rhs: f64) -> DMat3 {
        let mut out = self;
        for v in out.data.iter_mut() {
            *v *= rhs;
        }
        out
    }
}
