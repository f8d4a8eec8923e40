//! A-contrario random sampling (ORSA).
//!
//! Instead of a fixed inlier threshold, every candidate model is scored by
//! its Number of False Alarms: the expected number of models at least as
//! good that pure noise would produce. For a model whose `k` best residuals
//! have normalized error `alpha_k`:
//!
//! ```text
//! log10 NFA(k) = log10(n - s) + log10(alpha_k) * (k - s)
//!              + log10 C(n, k) + log10 C(k, s)
//! ```
//!
//! where `s` is the minimal sample size. The model's NFA is the minimum over
//! `k > s`, and a model is meaningful when `log10 NFA < 0`. The inliers are
//! the `k` best residuals at that minimum, so no threshold is ever chosen by
//! hand.
//!
//! Sampling follows the usual ORSA schedule: a tenth of the iteration budget
//! is held in reserve; once a meaningful model shows up, later samples are
//! drawn from its inliers only and the reserve becomes the remaining budget.

mod homography;


pub use homography::{HomographyModel, fit_homography};

use rand::Rng;

use crate::math::DMat3;

/// Result of a sampling run.
#[derive(Debug, Clone)]
pub struct OrsaOutcome {
    /// `log10` of the best model's NFA. Meaningful when negative.
    pub log_nfa: f64,
    /// Indices of the inliers of the best model, ascending.
    pub inliers: Vec<usize>,
    pub model: DMat3,
    /// Pixel error of the worst inlier.
    pub precision: f64,
    /// Sampling iterations actually performed.
    pub iterations: usize,
}

impl OrsaOutcome {
    pub fn is_meaningful(&self) -> bool {
        self.log_nfa < 0.0
    }
}

/// A model estimated by a-contrario random sampling.
pub trait AContrarioModel {
    /// Number of data points the model is fitted on.
    fn num_data(&self) -> usize;

    /// Run the sampling loop.
    ///
    /// `max_precision` caps the pixel error an inlier may have; `None` means
    /// no cap. Returns `None` when no sample ever produced a model.
    fn orsa<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_iterations: usize,
        max_precision: Option<f64>,
    ) -> Option<OrsaOutcome>;

    /// Least-squares refit on the given inliers.
    fn refine(&self, inliers: &[usize]) -> Option<DMat3>;
}

/// Residual of one datum under a candidate model.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Residual {
    /// `log10` of the normalized error (probability of a random point doing as well).
    pub log_alpha: f64,
    /// Pixel error behind `log_alpha`.
    pub distance: f64,
    pub index: usize,
}

/// Best `(log_nfa, k, precision)` over a set of residuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NfaScore {
    pub log_nfa: f64,
    pub inlier_count: usize,
    pub precision: f64,
}

/// Precomputed log-combinatorics for a fixed data count and sample size.
#[derive(Debug, Clone)]
pub(crate) struct NfaTable {
    sample_size: usize,
    log_tests: f64,
    log_c_n: Vec<f64>,
    log_c_k: Vec<f64>,
}

impl NfaTable {
    pub fn new(n: usize, sample_size: usize) -> Self {
        debug_assert!(n > sample_size);
        Self {
            sample_size,
            log_tests: ((n - sample_size) as f64).log10(),
            log_c_n: log_combi_n(n),
            log_c_k: log_combi_k(sample_size, n),
        }
    }

    /// `log10 NFA(k)` for `k` inliers with worst normalized error `log_alpha`.
    #[inline]
    pub fn log_nfa(&self, k: usize, log_alpha: f64) -> f64 {
        self.log_tests
            + log_alpha * (k - self.sample_size) as f64
            + self.log_c_n[k]
            + self.log_c_k[k]
    }

    /// Sort residuals in place and find the `k` minimizing the NFA.
    ///
    /// The scan stops at the first residual whose distance exceeds
    /// `max_precision`.
    pub fn best(&self, residuals: &mut [Residual], max_precision: Option<f64>) -> NfaScore {
        residuals.sort_by(|a, b| a.log_alpha.total_cmp(&b.log_alpha));

        let mut best = NfaScore {
            log_nfa: f64::INFINITY,
            inlier_count: 0,
            precision: 0.0,
        };
        for (i, r) in residuals.iter().enumerate().skip(self.sample_size) {
            if let Some(cap) = max_precision
                && r.distance > cap
            {
                break;
            }
            let k = i + 1;
            let log_nfa = self.log_nfa(k, r.log_alpha);
            if log_nfa < best.log_nfa {
                best = NfaScore {
                    log_nfa,
                    inlier_count: k,
                    precision: r.distance,
                };
            }
        }
        best
    }
}

/// `log10 C(n, k)` for `k` in `0..=n`.
pub(crate) fn log_combi_n(n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n + 1];
    for k in 1..=n {
        out[k] = out[k - 1] + ((n - k + 1) as f64 / k as f64).log10();
    }
    out
}

/// `log10 C(k, s)` for `k` in `0..=n`. Entries below `s` are `-inf`.
pub(crate) fn log_combi_k(s: usize, n: usize) -> Vec<f64> {
    let mut out = vec![f64::NEG_INFINITY; n + 1];
    if s > n {
        return out;
    }
    out[s] = 0.0;
    for k in s + 1..=n {
        out[k] = out[k - 1] + (k as f64 / (k - s) as f64).log10();
    }
    out
}
