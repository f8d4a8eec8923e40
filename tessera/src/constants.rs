//! Numeric defaults shared by the estimator, the matcher and the boundary.

/// Default iteration budget of the a-contrario sampling loop.
pub const ORSA_ITERATIONS: usize = 10_000;

/// Fewest correspondences the estimator accepts.
pub const MIN_CORRESPONDENCES: usize = 5;

/// Points in a minimal homography sample.
pub const SAMPLE_SIZE: usize = 4;

/// Default nearest/second-nearest ratio for descriptor matching.
pub const DEFAULT_MATCH_RATIO: f32 = 0.6;

/// Squared residuals are clamped from below by this before taking logs.
pub const MIN_SQUARED_ERROR: f64 = 1e-12;
