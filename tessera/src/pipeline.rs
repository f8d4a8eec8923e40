//! Typed registration entry point: images in, estimate and rendered views out.

use rand::Rng;
use tracing::info;

use crate::config::Config;
use crate::estimator::{EstimationError, HomographyEstimate, estimate_homography};
use crate::image::{RgbImage, to_gray};
use crate::math::DMat3;
use crate::matching::{Correspondence, CorrespondenceFinder, dedup_correspondences};
use crate::mosaic::{MosaicOutputs, compose_mosaic};
use crate::visualization::{MatchViews, render_match_views};

/// Everything one registration run produces.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
    /// Deduplicated correspondences; inlier indices refer to this list.
    pub correspondences: Vec<Correspondence>,
    pub estimate: Result<HomographyEstimate, EstimationError>,
    /// Row-major homography coefficients as reported to callers.
    ///
    /// Present whenever the sampler ran: the homography on success, zeros on
    /// failure. `None` when there were too few correspondences to try.
    pub coefficients: Option<[f64; 9]>,
    pub match_views: Option<MatchViews>,
    pub mosaic: Option<MosaicOutputs>,
}

impl RegistrationResult {
    pub fn is_success(&self) -> bool {
        self.estimate.is_ok()
    }

    pub fn homography(&self) -> Option<&DMat3> {
        self.estimate.as_ref().ok().map(|e| &e.homography)
    }

    /// Inlier indices, empty on failure.
    pub fn inliers(&self) -> &[usize] {
        self.estimate
            .as_ref()
            .map(|e| e.inliers.as_slice())
            .unwrap_or(&[])
    }
}

/// Register two images: find correspondences, estimate the homography from
/// image 1 to image 2 and render the requested outputs.
///
/// Match views are rendered whether or not estimation succeeds; the mosaic
/// only on success.
pub fn register<F, R>(
    image1: &RgbImage,
    image2: &RgbImage,
    finder: &F,
    config: &Config,
    rng: &mut R,
) -> RegistrationResult
where
    F: CorrespondenceFinder + ?Sized,
    R: Rng + ?Sized,
{
    config.validate();

    let gray1 = to_gray(image1);
    let gray2 = to_gray(image2);
    let dims1 = (gray1.width(), gray1.height());
    let dims2 = (gray2.width(), gray2.height());

    let mut correspondences = finder.find(&gray1, &gray2, config.ratio);
    let found = correspondences.len();
    dedup_correspondences(&mut correspondences);
    info!(
        found,
        unique = correspondences.len(),
        "correspondences found"
    );

    let estimate = estimate_homography(
        &correspondences,
        dims1,
        dims2,
        config.max_precision(),
        config.max_iterations,
        rng,
    );

    let coefficients = match &estimate {
        Ok(e) => Some(e.homography.to_array()),
        Err(EstimationError::EstimationFailed { .. }) => Some(DMat3::zeros().to_array()),
        Err(EstimationError::InsufficientCorrespondences { .. }) => None,
    };

    let homography = estimate.as_ref().ok().map(|e| &e.homography);
    let inliers: &[usize] = estimate.as_ref().map(|e| e.inliers.as_slice()).unwrap_or(&[]);

    let match_views = config.outputs.visualization.then(|| {
        render_match_views(&gray1, &gray2, &correspondences, inliers, homography)
    });

    let mosaic = homography.and_then(|h| {
        compose_mosaic(image1, image2, h, config.outputs.mosaic_request())
    });

    RegistrationResult {
        correspondences,
        estimate,
        coefficients,
        match_views,
        mosaic,
    }
}

/// [`register`] with the random source built from `config.seed` (or the clock).
pub fn register_with_seed<F>(
    image1: &RgbImage,
    image2: &RgbImage,
    finder: &F,
    config: &Config,
) -> RegistrationResult
where
    F: CorrespondenceFinder + ?Sized,
{
    let mut rng = config.rng();
    register(image1, image2, finder, config, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputRequest;
    use crate::image::GrayImage;
    use common::Buffer2;
    use glam::DVec2;

    fn fixed_finder(
        list: Vec<Correspondence>,
    ) -> impl Fn(&GrayImage, &GrayImage, f32) -> Vec<Correspondence> {
        move |_: &GrayImage, _: &GrayImage, _: f32| list.clone()
    }

    fn spread_points() -> Vec<DVec2> {
        [
            (10.0, 12.0),
            (85.0, 9.0),
            (50.0, 47.0),
            (14.0, 88.0),
            (91.0, 83.0),
            (33.0, 70.0),
            (70.0, 25.0),
            (61.0, 77.0),
        ]
        .into_iter()
        .map(|(x, y)| DVec2::new(x, y))
        .collect()
    }

    fn image() -> RgbImage {
        Buffer2::new_filled(100, 100, [128.0; 3])
    }

    #[test]
    fn test_identity_correspondences_register() {
        let corr: Vec<Correspondence> = spread_points()
            .into_iter()
            .map(|p| Correspondence::new(p, p))
            .collect();
        let finder = fixed_finder(corr.clone());
        let config = Config {
            precision: 1.0,
            seed: Some(1),
            ..Default::default()
        };
        let result = register_with_seed(&image(), &image(), &finder, &config);

        assert!(result.is_success());
        assert_eq!(result.inliers().len(), corr.len());
        let h = result.homography().unwrap();
        for (a, b) in h.as_array().iter().zip(DMat3::identity().as_array()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert!(result.match_views.is_some());
        let mosaic = result.mosaic.unwrap();
        assert!(mosaic.mosaic.is_some() && mosaic.warped1.is_some());
    }

    #[test]
    fn test_duplicates_are_removed_before_estimation() {
        let p = spread_points();
        let mut corr: Vec<Correspondence> = p.iter().map(|&p| Correspondence::new(p, p)).collect();
        corr.push(corr[0]);
        corr.push(corr[3]);
        let finder = fixed_finder(corr);
        let config = Config {
            seed: Some(2),
            outputs: OutputRequest::NONE,
            ..Default::default()
        };
        let result = register_with_seed(&image(), &image(), &finder, &config);
        assert_eq!(result.correspondences.len(), 8);
        assert!(result.match_views.is_none());
        assert!(result.mosaic.is_none());
    }

    #[test]
    fn test_too_few_correspondences() {
        let corr: Vec<Correspondence> = spread_points()[..3]
            .iter()
            .map(|&p| Correspondence::new(p, p))
            .collect();
        let finder = fixed_finder(corr);
        let config = Config {
            seed: Some(3),
            ..Default::default()
        };
        let result = register_with_seed(&image(), &image(), &finder, &config);
        assert!(matches!(
            result.estimate,
            Err(EstimationError::InsufficientCorrespondences {
                found: 3,
                required: 5
            })
        ));
        assert!(result.coefficients.is_none());
        assert!(result.mosaic.is_none());
        // views are still rendered, with every correspondence as an outlier
        assert!(result.match_views.is_some());
    }
}
