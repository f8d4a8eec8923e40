//! Built-in correspondence finder: Harris corners with normalized patch
//! descriptors, matched by a nearest/second-nearest ratio test.
//!
//! It is neither scale nor rotation invariant. It serves pairs related by a
//! moderate projective warp and keeps the pipeline usable without an external
//! feature detector.

use glam::DVec2;
use tracing::debug;

use super::{Correspondence, CorrespondenceFinder};
use crate::image::GrayImage;

/// Configuration for [`CornerMatcher`].
#[derive(Debug, Clone)]
pub struct CornerMatcherConfig {
    /// Keep at most this many corners per image, strongest first.
    pub max_corners: usize,
    /// Descriptor patch is `(2r + 1)^2` samples.
    pub patch_radius: usize,
    /// Harris sensitivity `k` in `det - k * trace^2`.
    pub harris_k: f64,
    /// Minimum response as a fraction of the strongest response in the image.
    pub min_response: f64,
    /// Radius of the non-maximum suppression window.
    pub nms_radius: usize,
}

impl Default for CornerMatcherConfig {
    fn default() -> Self {
        Self {
            max_corners: 600,
            patch_radius: 5,
            harris_k: 0.04,
            min_response: 0.01,
            nms_radius: 3,
        }
    }
}

impl CornerMatcherConfig {
    pub fn validate(&self) {
        assert!(self.max_corners > 0, "max_corners must be positive");
        assert!(self.patch_radius > 0, "patch_radius must be positive");
        assert!(
            self.harris_k > 0.0 && self.harris_k < 0.25,
            "harris_k must be in (0, 0.25), got {}",
            self.harris_k
        );
        assert!(
            (0.0..1.0).contains(&self.min_response),
            "min_response must be in [0, 1), got {}",
            self.min_response
        );
        assert!(self.nms_radius > 0, "nms_radius must be positive");
    }
}

/// A detected corner and its descriptor.
#[derive(Debug, Clone)]
pub struct Feature {
    pub position: DVec2,
    pub response: f64,
    pub descriptor: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct CornerMatcher {
    config: CornerMatcherConfig,
}

impl CornerMatcher {
    pub fn new(config: CornerMatcherConfig) -> Self {
        config.validate();
        Self { config }
    }

    /// Detect corners and describe them.
    pub fn features(&self, image: &GrayImage) -> Vec<Feature> {
        let response = harris_response(image, self.config.harris_k);
        let border = self.config.patch_radius + 1;

        let max_response = response.iter().copied().fold(0.0f64, f64::max);
        if max_response <= 0.0 {
            return Vec::new();
        }
        let threshold = max_response * self.config.min_response;

        let width = image.width();
        let height = image.height();
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        let mut corners: Vec<(usize, usize, f64)> = Vec::new();
        for y in border..height - border {
            for x in border..width - border {
                let r = response[y * width + x];
                if r > threshold && is_local_max(&response, width, height, x, y, self.config.nms_radius)
                {
                    corners.push((x, y, r));
                }
            }
        }
        corners.sort_by(|a, b| b.2.total_cmp(&a.2));
        corners.truncate(self.config.max_corners);

        corners
            .into_iter()
            .filter_map(|(x, y, r)| {
                let descriptor = patch_descriptor(image, x, y, self.config.patch_radius)?;
                Some(Feature {
                    position: DVec2::new(x as f64, y as f64),
                    response: r,
                    descriptor,
                })
            })
            .collect()
    }
}

impl CorrespondenceFinder for CornerMatcher {
    fn find(&self, image1: &GrayImage, image2: &GrayImage, ratio: f32) -> Vec<Correspondence> {
        let features1 = self.features(image1);
        let features2 = self.features(image2);
        let matches = match_features(&features1, &features2, ratio);
        debug!(
            features1 = features1.len(),
            features2 = features2.len(),
            matches = matches.len(),
            "corner matching done"
        );
        matches
    }
}

/// Ratio-test matching: accept `a` ↔ nearest `b` when the nearest descriptor
/// distance is below `ratio` times the second nearest.
pub fn match_features(features1: &[Feature], features2: &[Feature], ratio: f32) -> Vec<Correspondence> {
    if features2.len() < 2 {
        return Vec::new();
    }
    let ratio_sq = (ratio as f64) * (ratio as f64);

    features1
        .iter()
        .filter_map(|a| {
            let mut best = f64::INFINITY;
            let mut second = f64::INFINITY;
            let mut best_idx = 0;
            for (idx, b) in features2.iter().enumerate() {
                let d = squared_distance(&a.descriptor, &b.descriptor);
                if d < best {
                    second = best;
                    best = d;
                    best_idx = idx;
                } else if d < second {
                    second = d;
                }
            }
            (best < ratio_sq * second)
                .then(|| Correspondence::new(a.position, features2[best_idx].position))
        })
        .collect()
}

fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum()
}

/// Harris response per pixel, computed from central-difference gradients
/// summed over a 3x3 window. Border pixels get zero.
fn harris_response(image: &GrayImage, k: f64) -> Vec<f64> {
    let width = image.width();
    let height = image.height();
    let mut response = vec![0.0; width * height];
    if width < 5 || height < 5 {
        return response;
    }

    let mut ixx = vec![0.0f64; width * height];
    let mut iyy = vec![0.0f64; width * height];
    let mut ixy = vec![0.0f64; width * height];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let gx = (*image.get(x + 1, y) - *image.get(x - 1, y)) as f64 * 0.5;
            let gy = (*image.get(x, y + 1) - *image.get(x, y - 1)) as f64 * 0.5;
            let i = y * width + x;
            ixx[i] = gx * gx;
            iyy[i] = gy * gy;
            ixy[i] = gx * gy;
        }
    }

    for y in 2..height - 2 {
        for x in 2..width - 2 {
            let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
            for wy in y - 1..=y + 1 {
                let row = wy * width;
                for wx in x - 1..=x + 1 {
                    sxx += ixx[row + wx];
                    syy += iyy[row + wx];
                    sxy += ixy[row + wx];
                }
            }
            let det = sxx * syy - sxy * sxy;
            let trace = sxx + syy;
            response[y * width + x] = det - k * trace * trace;
        }
    }
    response
}

/// Strict maximum in its window; ties resolve to the first pixel in raster order.
fn is_local_max(response: &[f64], width: usize, height: usize, x: usize, y: usize, radius: usize) -> bool {
    let r = response[y * width + x];
    let y0 = y.saturating_sub(radius);
    let y1 = (y + radius).min(height - 1);
    let x0 = x.saturating_sub(radius);
    let x1 = (x + radius).min(width - 1);
    for ny in y0..=y1 {
        for nx in x0..=x1 {
            if (nx, ny) == (x, y) {
                continue;
            }
            let other = response[ny * width + nx];
            let before = (ny, nx) < (y, x);
            if other > r || (before && other == r) {
                return false;
            }
        }
    }
    true
}

/// Mean-subtracted, unit-norm patch. `None` for flat patches.
fn patch_descriptor(image: &GrayImage, cx: usize, cy: usize, radius: usize) -> Option<Vec<f32>> {
    let mut patch = Vec::with_capacity((2 * radius + 1) * (2 * radius + 1));
    for y in cy - radius..=cy + radius {
        patch.extend_from_slice(&image.row(y)[cx - radius..=cx + radius]);
    }

    let mean = patch.iter().sum::<f32>() / patch.len() as f32;
    for v in patch.iter_mut() {
        *v -= mean;
    }
    let norm = patch.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm < 1e-3 {
        return None;
    }
    for v in patch.iter_mut() {
        *v /= norm;
    }
    Some(patch)
}
