//! Robust homography estimation from putative correspondences.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::constants::MIN_CORRESPONDENCES;
use crate::math::DMat3;
use crate::matching::Correspondence;
use crate::orsa::{AContrarioModel, HomographyModel};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("insufficient correspondences: found {found}, need at least {required}")]
    InsufficientCorrespondences { found: usize, required: usize },

    #[error("no meaningful homography (log10 NFA {log_nfa:.2} after {iterations} iterations)")]
    EstimationFailed { log_nfa: f64, iterations: usize },
}

/// A successful estimate.
#[derive(Debug, Clone)]
pub struct HomographyEstimate {
    /// Maps image-1 coordinates to image-2 coordinates, `h[8] == 1`.
    pub homography: DMat3,
    /// Ascending, duplicate-free positions into the correspondence list.
    pub inliers: Vec<usize>,
    /// Pixel error of the worst inlier as found by sampling.
    pub precision: f64,
    pub log_nfa: f64,
    /// The model found by sampling, before the least-squares refit.
    pub sampled: DMat3,
    /// False when the least-squares refit failed and the sampled model was kept.
    pub refined: bool,
    pub iterations: usize,
}

/// Forward transfer error over a set of correspondences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualStats {
    pub mean: f64,
    pub max: f64,
}

impl HomographyEstimate {
    /// Mean and maximum `|H p1 - p2|` over the inliers.
    pub fn residual_stats(&self, correspondences: &[Correspondence]) -> ResidualStats {
        residual_stats(&self.homography, correspondences, &self.inliers)
    }

    /// Indices of correspondences not among the inliers, ascending.
    pub fn outliers(&self, count: usize) -> Vec<usize> {
        let mut next = self.inliers.iter().peekable();
        (0..count)
            .filter(|i| {
                if next.peek() == Some(&i) {
                    next.next();
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

pub fn residual_stats(h: &DMat3, correspondences: &[Correspondence], inliers: &[usize]) -> ResidualStats {
    if inliers.is_empty() {
        return ResidualStats { mean: 0.0, max: 0.0 };
    }
    let mut sum = 0.0;
    let mut max = 0.0f64;
    for &i in inliers {
        let c = &correspondences[i];
        let err = (h.transform_point(c.p1) - c.p2).length();
        sum += err;
        max = max.max(err);
    }
    ResidualStats {
        mean: sum / inliers.len() as f64,
        max,
    }
}

/// Estimate the homography from image 1 to image 2.
///
/// `max_precision`: maximum inlier pixel error, `None` for automatic.
/// Fewer than five correspondences fail without running the sampler.
pub fn estimate_homography<R: Rng + ?Sized>(
    correspondences: &[Correspondence],
    dims1: (usize, usize),
    dims2: (usize, usize),
    max_precision: Option<f64>,
    max_iterations: usize,
    rng: &mut R,
) -> Result<HomographyEstimate, EstimationError> {
    check_count(correspondences.len())?;
    let model = HomographyModel::new(correspondences, dims1, dims2);
    let estimate = estimate_with_model(&model, max_precision, max_iterations, rng)?;

    let before = residual_stats(&estimate.sampled, correspondences, &estimate.inliers);
    let after = estimate.residual_stats(correspondences);
    debug!(
        mean = before.mean,
        max = before.max,
        "residual error before refinement"
    );
    debug!(
        mean = after.mean,
        max = after.max,
        "residual error after refinement"
    );
    Ok(estimate)
}

/// Run sampling and refinement on any a-contrario model.
pub fn estimate_with_model<M, R>(
    model: &M,
    max_precision: Option<f64>,
    max_iterations: usize,
    rng: &mut R,
) -> Result<HomographyEstimate, EstimationError>
where
    M: AContrarioModel,
    R: Rng + ?Sized,
{
    check_count(model.num_data())?;

    let Some(outcome) = model.orsa(rng, max_iterations, max_precision) else {
        return Err(EstimationError::EstimationFailed {
            log_nfa: f64::INFINITY,
            iterations: max_iterations,
        });
    };
    if outcome.log_nfa > 0.0 {
        return Err(EstimationError::EstimationFailed {
            log_nfa: outcome.log_nfa,
            iterations: outcome.iterations,
        });
    }

    let mut inliers = outcome.inliers;
    inliers.sort_unstable();
    inliers.dedup();

    info!(
        inliers = inliers.len(),
        total = model.num_data(),
        log_nfa = outcome.log_nfa,
        precision = outcome.precision,
        iterations = outcome.iterations,
        "homography estimated"
    );

    let (homography, refined) = match model.refine(&inliers) {
        Some(h) => (h, true),
        None => {
            warn!("error in refinement, result is suspect");
            (outcome.model, false)
        }
    };
    let homography = homography.normalized().unwrap_or(homography);
    let sampled = outcome.model.normalized().unwrap_or(outcome.model);

    Ok(HomographyEstimate {
        homography,
        inliers,
        sampled,
        precision: outcome.precision,
        log_nfa: outcome.log_nfa,
        refined,
        iterations: outcome.iterations,
    })
}

fn check_count(found: usize) -> Result<(), EstimationError> {
    if found < MIN_CORRESPONDENCES {
        error!(
            found,
            required = MIN_CORRESPONDENCES,
            "at least {MIN_CORRESPONDENCES} matches are needed for a homography"
        );
        return Err(EstimationError::InsufficientCorrespondences {
            found,
            required: MIN_CORRESPONDENCES,
        });
    }
    Ok(())
}
