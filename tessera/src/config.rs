//! Configuration for a registration run.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::constants::{DEFAULT_MATCH_RATIO, ORSA_ITERATIONS};
use crate::mosaic::MosaicRequest;

/// Which rendered outputs a run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRequest {
    /// Inlier and outlier match views.
    pub visualization: bool,
    /// Combined mosaic.
    pub mosaic: bool,
    /// Image 1 warped into the mosaic frame on its own.
    pub warp1: bool,
    /// Image 2 warped into the mosaic frame on its own.
    pub warp2: bool,
}

impl OutputRequest {
    pub const ALL: OutputRequest = OutputRequest {
        visualization: true,
        mosaic: true,
        warp1: true,
        warp2: true,
    };

    pub const NONE: OutputRequest = OutputRequest {
        visualization: false,
        mosaic: false,
        warp1: false,
        warp2: false,
    };

    pub fn mosaic_request(&self) -> MosaicRequest {
        MosaicRequest {
            mosaic: self.mosaic,
            warp1: self.warp1,
            warp2: self.warp2,
        }
    }
}

impl Default for OutputRequest {
    fn default() -> Self {
        Self::ALL
    }
}

/// Registration configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum inlier pixel error. Zero or negative lets the estimator pick
    /// the most significant precision on its own.
    pub precision: f64,
    /// Nearest/second-nearest ratio passed to the correspondence finder.
    pub ratio: f32,
    /// Sampling iteration budget.
    pub max_iterations: usize,
    /// Random seed for reproducibility (None seeds from the clock).
    pub seed: Option<u64>,
    pub outputs: OutputRequest,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: 0.0,
            ratio: DEFAULT_MATCH_RATIO,
            max_iterations: ORSA_ITERATIONS,
            seed: None,
            outputs: OutputRequest::ALL,
        }
    }
}

impl Config {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            !self.precision.is_nan(),
            "precision must be a number, got {}",
            self.precision
        );
        assert!(
            self.ratio >= 0.0 && self.ratio <= 1.0,
            "ratio must be in [0, 1], got {}",
            self.ratio
        );
        assert!(self.max_iterations > 0, "max_iterations must be positive");
    }

    /// Precision cap for the estimator, `None` when automatic.
    pub fn max_precision(&self) -> Option<f64> {
        (self.precision > 0.0).then_some(self.precision)
    }

    /// Random source for one run: seeded from `seed` when set, from the
    /// wall clock otherwise.
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed.unwrap_or_else(clock_seed))
    }
}

/// Seconds and sub-second nanos of the wall clock folded into one seed.
pub fn clock_seed() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs() ^ (now.subsec_nanos() as u64).rotate_left(32)
}
