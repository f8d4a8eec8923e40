//! Homography model: 4-point samples, normalized DLT, symmetric transfer error.

use std::f64::consts::PI;

use glam::DVec2;
use nalgebra::{DMatrix, SVD};
use rand::Rng;
use rand::seq::index;
use tracing::trace;

use super::{AContrarioModel, NfaScore, NfaTable, OrsaOutcome, Residual};
use crate::constants::{MIN_SQUARED_ERROR, SAMPLE_SIZE};
use crate::math::DMat3;
use crate::matching::Correspondence;

/// Homography between two images of known size, fitted on correspondences.
///
/// The error of a correspondence is measured in both directions, each
/// normalized by the area of the image it is measured in; the larger of the
/// two counts.
#[derive(Debug, Clone)]
pub struct HomographyModel<'a> {
    correspondences: &'a [Correspondence],
    log_alpha0_1: f64,
    log_alpha0_2: f64,
}

impl<'a> HomographyModel<'a> {
    pub fn new(
        correspondences: &'a [Correspondence],
        dims1: (usize, usize),
        dims2: (usize, usize),
    ) -> Self {
        Self {
            correspondences,
            log_alpha0_1: log_alpha0(dims1),
            log_alpha0_2: log_alpha0(dims2),
        }
    }

    /// Symmetric residual of every correspondence under `h`.
    ///
    /// `None` when `h` is not invertible.
    pub(crate) fn residuals(&self, h: &DMat3) -> Option<Vec<Residual>> {
        let h_inv = h.inverse()?;
        let residuals = self
            .correspondences
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let fwd = squared_transfer_error(h, c.p1, c.p2);
                let bwd = squared_transfer_error(&h_inv, c.p2, c.p1);
                let alpha_fwd = self.log_alpha0_2 + fwd.max(MIN_SQUARED_ERROR).log10();
                let alpha_bwd = self.log_alpha0_1 + bwd.max(MIN_SQUARED_ERROR).log10();
                let (log_alpha, sq) = if alpha_fwd >= alpha_bwd {
                    (alpha_fwd, fwd)
                } else {
                    (alpha_bwd, bwd)
                };
                Residual {
                    log_alpha,
                    distance: sq.sqrt(),
                    index,
                }
            })
            .collect();
        Some(residuals)
    }

    fn fit_sample(&self, sample: &[usize]) -> Option<DMat3> {
        let (src, dst): (Vec<DVec2>, Vec<DVec2>) = sample
            .iter()
            .map(|&i| (self.correspondences[i].p1, self.correspondences[i].p2))
            .unzip();
        if has_collinear_triple(&src) || has_collinear_triple(&dst) {
            return None;
        }
        fit_homography(&src, &dst)
    }
}

impl AContrarioModel for HomographyModel<'_> {
    fn num_data(&self) -> usize {
        self.correspondences.len()
    }

    fn orsa<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_iterations: usize,
        max_precision: Option<f64>,
    ) -> Option<OrsaOutcome> {
        let n = self.num_data();
        if n <= SAMPLE_SIZE {
            return None;
        }
        let table = NfaTable::new(n, SAMPLE_SIZE);

        let mut reserve = max_iterations / 10;
        let mut budget = max_iterations - reserve;

        let mut pool: Vec<usize> = (0..n).collect();
        let mut best: Option<(NfaScore, DMat3, Vec<usize>)> = None;
        let mut iterations = 0;

        let mut t = 0;
        while t < budget {
            iterations += 1;

            let mut improved = false;
            if pool.len() >= SAMPLE_SIZE {
                let sample: Vec<usize> = index::sample(rng, pool.len(), SAMPLE_SIZE)
                    .iter()
                    .map(|i| pool[i])
                    .collect();

                if let Some(h) = self.fit_sample(&sample)
                    && let Some(mut residuals) = self.residuals(&h)
                {
                    let score = table.best(&mut residuals, max_precision);
                    let best_nfa = best.as_ref().map_or(f64::INFINITY, |b| b.0.log_nfa);
                    if score.inlier_count > 0 && score.log_nfa < best_nfa {
                        let mut inliers: Vec<usize> = residuals[..score.inlier_count]
                            .iter()
                            .map(|r| r.index)
                            .collect();
                        inliers.sort_unstable();
                        trace!(
                            iteration = t,
                            log_nfa = score.log_nfa,
                            inliers = inliers.len(),
                            precision = score.precision,
                            "better model"
                        );
                        best = Some((score, h, inliers));
                        improved = true;
                    }
                }
            }

            let meaningful = best.as_ref().is_some_and(|b| b.0.log_nfa < 0.0);
            if (improved && meaningful) || (t + 1 == budget && reserve > 0) {
                match &best {
                    None => {
                        // nothing found yet: draw one more from the reserve
                        reserve -= 1;
                        budget += 1;
                    }
                    Some((_, _, inliers)) => {
                        pool = inliers.clone();
                        if reserve > 0 {
                            budget = t + 1 + reserve;
                            reserve = 0;
                        }
                    }
                }
            }
            t += 1;
        }

        best.map(|(score, model, inliers)| OrsaOutcome {
            log_nfa: score.log_nfa,
            inliers,
            model,
            precision: score.precision,
            iterations,
        })
    }

    fn refine(&self, inliers: &[usize]) -> Option<DMat3> {
        if inliers.len() < SAMPLE_SIZE {
            return None;
        }
        let (src, dst): (Vec<DVec2>, Vec<DVec2>) = inliers
            .iter()
            .map(|&i| (self.correspondences[i].p1, self.correspondences[i].p2))
            .unzip();
        fit_homography(&src, &dst)
    }
}

/// `log10(pi / (w * h))`: probability scale of a random point in the image.
fn log_alpha0((width, height): (usize, usize)) -> f64 {
    (PI / (width.max(1) * height.max(1)) as f64).log10()
}

/// Squared distance between `h(from)` and `to`; infinite for points sent to infinity.
fn squared_transfer_error(h: &DMat3, from: DVec2, to: DVec2) -> f64 {
    match h.try_transform_point(from) {
        Some(p) if p.is_finite() => (p - to).length_squared(),
        _ => f64::INFINITY,
    }
}

/// True when any three of the points lie on one line (or coincide).
pub(crate) fn has_collinear_triple(points: &[DVec2]) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let ab = points[j] - points[i];
                let ac = points[k] - points[i];
                let cross = ab.perp_dot(ac);
                if cross.abs() <= 1e-9 * ab.length() * ac.length() {
                    return true;
                }
            }
        }
    }
    false
}

/// Homography mapping `src` onto `dst` by normalized Direct Linear Transform.
///
/// Exact for four points in general position, least squares for more.
/// Returns `None` for fewer than four points or a singular or non-finite
/// result. The result is scaled so that `h[8] == 1`.
pub fn fit_homography(src: &[DVec2], dst: &[DVec2]) -> Option<DMat3> {
    debug_assert_eq!(src.len(), dst.len());
    let n = src.len();
    if n < SAMPLE_SIZE {
        return None;
    }

    let (src_norm, src_t) = normalize_points(src);
    let (dst_norm, dst_t) = normalize_points(dst);

    // Each correspondence gives two rows of A h = 0:
    // [-x -y -1  0  0  0  x*x'  y*x'  x']
    // [ 0  0  0 -x -y -1  x*y'  y*y'  y']
    let mut a_data = vec![0.0f64; 2 * n * 9];
    for i in 0..n {
        let s = src_norm[i];
        let d = dst_norm[i];
        let base = i * 18;
        a_data[base..base + 9]
            .copy_from_slice(&[-s.x, -s.y, -1.0, 0.0, 0.0, 0.0, s.x * d.x, s.y * d.x, d.x]);
        a_data[base + 9..base + 18]
            .copy_from_slice(&[0.0, 0.0, 0.0, -s.x, -s.y, -1.0, s.x * d.y, s.y * d.y, d.y]);
    }
    let a = DMatrix::from_row_slice(2 * n, 9, &a_data);

    let h_norm = solve_homogeneous_svd(a)?;

    // H = T_dst^-1 * H_norm * T_src
    let h = dst_t.inverse()? * h_norm * src_t;
    let h = h.normalized()?;

    if !h.is_finite() || h.determinant().abs() < 1e-12 {
        return None;
    }
    Some(h)
}

/// Translate to the centroid and scale so the mean distance is sqrt(2).
fn normalize_points(points: &[DVec2]) -> (Vec<DVec2>, DMat3) {
    let c = points.iter().copied().sum::<DVec2>() / points.len() as f64;
    let avg_dist = points.iter().map(|p| (*p - c).length()).sum::<f64>() / points.len() as f64;
    if avg_dist < 1e-10 {
        return (points.to_vec(), DMat3::identity());
    }

    let scale = std::f64::consts::SQRT_2 / avg_dist;
    let normalized = points.iter().map(|p| (*p - c) * scale).collect();
    (
        normalized,
        DMat3::zoom_translation(scale, -c.x * scale, -c.y * scale),
    )
}

/// Null vector of `A` via SVD: the right singular vector of the smallest
/// singular value.
fn solve_homogeneous_svd(a: DMatrix<f64>) -> Option<DMat3> {
    let nrows = a.nrows();
    let ncols = a.ncols();

    // Thin SVD of an 8x9 system would drop the null vector; pad to square.
    let a = if nrows < ncols {
        let mut padded = DMatrix::zeros(ncols, ncols);
        padded.view_mut((0, 0), (nrows, ncols)).copy_from(&a);
        padded
    } else {
        a
    };

    let svd = SVD::new(a, false, true);
    let v_t = svd.v_t?;

    let smallest = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)?;

    let mut data = [0.0f64; 9];
    for (i, &val) in v_t.row(smallest).iter().enumerate() {
        data[i] = val;
    }
    Some(DMat3::from_array(data))
}
