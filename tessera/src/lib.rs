//! Tessera - robust homographic registration of image pairs.
//!
//! Given two images of roughly the same planar scene, tessera:
//! - finds point correspondences (pluggable, a corner matcher is built in)
//! - estimates the homography from image 1 to image 2 with ORSA, the
//!   a-contrario RANSAC that needs no inlier threshold
//! - renders inlier/outlier match views, each image warped into a shared
//!   frame and their averaged mosaic
//!
//! A C entry point ([`ffi::wrapper_estimate_homography`]) exposes the whole
//! pipeline to host languages.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tessera::{Config, CornerMatcher, register_with_seed};
//!
//! let config = Config { seed: Some(7), ..Default::default() };
//! let result = register_with_seed(&image1, &image2, &CornerMatcher::default(), &config);
//! if let Some(h) = result.homography() {
//!     println!("{} inliers, H = {:?}", result.inliers().len(), h);
//! }
//! ```

pub mod color;
pub mod config;
pub mod constants;
pub mod drawing;
pub mod estimator;
pub mod ffi;
pub mod image;
pub mod math;
pub mod matching;
pub mod mosaic;
pub mod orsa;
pub mod pipeline;
pub mod visualization;
pub mod warp;

// ============================================================================
// Images and geometry
// ============================================================================

pub use color::Color;
pub use self::image::{GrayImage, ImageError, PixelFormat, RgbImage};
pub use math::DMat3;

// ============================================================================
// Correspondences
// ============================================================================

pub use matching::{CornerMatcher, CornerMatcherConfig, Correspondence, CorrespondenceFinder};

// ============================================================================
// Estimation
// ============================================================================

pub use estimator::{
    EstimationError, HomographyEstimate, ResidualStats, estimate_homography,
    estimate_with_model,
};
pub use orsa::{AContrarioModel, HomographyModel, OrsaOutcome, fit_homography};

// ============================================================================
// Rendering
// ============================================================================

pub use mosaic::{MosaicOutputs, MosaicRequest, compose_mosaic, mosaic_dims};
pub use visualization::{MatchViews, VisualizationLayout, render_match_views};

// ============================================================================
// Pipeline
// ============================================================================

pub use config::{Config, OutputRequest};
pub use pipeline::{RegistrationResult, register, register_with_seed};

#[cfg(test)]
mod tests;
