//! Putative point correspondences between two images.

pub mod corners;

pub use corners::{CornerMatcher, CornerMatcherConfig};

use glam::DVec2;

use crate::image::GrayImage;

/// A putative match: `p1` in image 1 corresponds to `p2` in image 2.
///
/// Correspondences are identified by their position in the sequence the
/// finder returns; inlier indices refer to those positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub p1: DVec2,
    pub p2: DVec2,
}

impl Correspondence {
    pub fn new(p1: DVec2, p2: DVec2) -> Self {
        Self { p1, p2 }
    }

    #[inline]
    fn key(&self) -> [f64; 4] {
        [self.p1.x, self.p1.y, self.p2.x, self.p2.y]
    }
}

/// Produces correspondences between two grayscale images.
///
/// `ratio` is the nearest/second-nearest acceptance threshold: lower is
/// stricter.
pub trait CorrespondenceFinder {
    fn find(&self, image1: &GrayImage, image2: &GrayImage, ratio: f32) -> Vec<Correspondence>;
}

impl<F> CorrespondenceFinder for F
where
    F: Fn(&GrayImage, &GrayImage, f32) -> Vec<Correspondence>,
{
    fn find(&self, image1: &GrayImage, image2: &GrayImage, ratio: f32) -> Vec<Correspondence> {
        self(image1, image2, ratio)
    }
}

/// Sorts lexicographically by `(x1, y1, x2, y2)` and drops exact duplicates.
///
/// Detectors often report the same keypoint twice with different
/// orientations, which yields identical matches.
pub fn dedup_correspondences(correspondences: &mut Vec<Correspondence>) {
    correspondences.sort_by(|a, b| {
        a.key()
            .iter()
            .zip(b.key().iter())
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    correspondences.dedup_by(|a, b| a.key() == b.key());
}
