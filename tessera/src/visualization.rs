//! Side-by-side match views: an "in" canvas with inlier links and an "out"
//! canvas with outlier links and, when a homography is known, the residual
//! from each outlier's predicted position to its observed one.

use common::Buffer2;
use glam::DVec2;

use crate::color::Color;
use crate::drawing::DrawTarget;
use crate::image::{GrayImage, RgbImage, gray_to_rgb};
use crate::math::{DMat3, zoom_translation};
use crate::matching::Correspondence;
use crate::warp::warp_pair_into;

/// Geometry of the side-by-side canvas.
///
/// Both images are scaled by the same `zoom` so that together they span
/// `max(w1, w2)` pixels, then centered vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizationLayout {
    pub width: usize,
    pub height: usize,
    pub zoom: f64,
    pub placement1: DMat3,
    pub placement2: DMat3,
}

impl VisualizationLayout {
    /// The canvas height is truncated once, here. Buffers allocated from
    /// `width * height` always match what gets rendered.
    pub fn new(w1: usize, h1: usize, w2: usize, h2: usize) -> Self {
        let width = w1.max(w2);
        let zoom = width as f64 / (w1 + w2).max(1) as f64;
        let height = ((zoom * h1.max(h2) as f64) as usize).max(1);

        let placement1 = zoom_translation(zoom, 0.0, (height as f64 - h1 as f64 * zoom) / 2.0);
        let placement2 = zoom_translation(
            zoom,
            w1 as f64 * zoom,
            (height as f64 - h2 as f64 * zoom) / 2.0,
        );

        Self {
            width,
            height,
            zoom,
            placement1,
            placement2,
        }
    }

    /// Column of the separator between the two images.
    pub fn separator_x(&self, w1: usize) -> f64 {
        (w1 as f64 * self.zoom).trunc()
    }

    pub fn planar_len(&self) -> usize {
        self.width * self.height * 3
    }
}

/// The two rendered views.
#[derive(Debug, Clone)]
pub struct MatchViews {
    /// Inlier links.
    pub inliers: RgbImage,
    /// Outlier links and residuals.
    pub outliers: RgbImage,
}

/// Draw match evidence onto the two canvases.
///
/// Inliers get a green link in `inliers_view`. Outliers get a red link in
/// `outliers_view`, preceded by a yellow prediction-to-observation segment
/// when `homography` is given. Links run from `placement1(p1)` to
/// `placement2(p2)`.
pub fn draw_matches<T: DrawTarget + ?Sized>(
    correspondences: &[Correspondence],
    inliers: &[usize],
    homography: Option<&DMat3>,
    placement1: &DMat3,
    placement2: &DMat3,
    inliers_view: &mut T,
    outliers_view: &mut T,
) {
    let mut sorted = inliers.to_vec();
    sorted.sort_unstable();

    if let Some(h) = homography {
        let predict = *placement2 * *h;
        for_each_classified(correspondences, &sorted, |c, is_inlier| {
            if !is_inlier {
                outliers_view.draw_segment(predict * c.p1, *placement2 * c.p2, Color::YELLOW);
            }
        });
    }

    for_each_classified(correspondences, &sorted, |c, is_inlier| {
        let from = *placement1 * c.p1;
        let to = *placement2 * c.p2;
        if is_inlier {
            inliers_view.draw_segment(from, to, Color::GREEN);
        } else {
            outliers_view.draw_segment(from, to, Color::RED);
        }
    });
}

/// Single forward scan: a correspondence is an inlier iff its position is the
/// next unconsumed entry of `sorted_inliers`.
fn for_each_classified<F>(correspondences: &[Correspondence], sorted_inliers: &[usize], mut f: F)
where
    F: FnMut(&Correspondence, bool),
{
    let mut next = sorted_inliers.iter().peekable();
    for (i, c) in correspondences.iter().enumerate() {
        // skip duplicated indices so they do not stall the scan
        while next.peek().is_some_and(|&&j| j < i) {
            next.next();
        }
        let is_inlier = next.peek().is_some_and(|&&j| j == i);
        if is_inlier {
            next.next();
        }
        f(c, is_inlier);
    }
}

/// Render both views: the two grayscale images side by side on a white
/// background, a blue separator, then the match evidence.
pub fn render_match_views(
    gray1: &GrayImage,
    gray2: &GrayImage,
    correspondences: &[Correspondence],
    inliers: &[usize],
    homography: Option<&DMat3>,
) -> MatchViews {
    let (w1, h1) = (gray1.width(), gray1.height());
    let layout = VisualizationLayout::new(w1, h1, gray2.width(), gray2.height());

    let mut concat = Buffer2::new_filled(layout.width, layout.height, 255.0f32);
    warp_pair_into(
        gray1,
        &layout.placement1,
        gray2,
        &layout.placement2,
        &mut concat,
    );

    let mut inliers_view = gray_to_rgb(&concat);
    let sep_x = layout.separator_x(w1);
    inliers_view.draw_segment(
        DVec2::new(sep_x, 0.0),
        DVec2::new(sep_x, layout.height as f64),
        Color::BLUE,
    );
    let mut outliers_view = inliers_view.clone();

    draw_matches(
        correspondences,
        inliers,
        homography,
        &layout.placement1,
        &layout.placement2,
        &mut inliers_view,
        &mut outliers_view,
    );

    MatchViews {
        inliers: inliers_view,
        outliers: outliers_view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        segments: Vec<(DVec2, DVec2, Color)>,
    }

    impl DrawTarget for Recorder {
        fn draw_segment(&mut self, from: DVec2, to: DVec2, color: Color) {
            self.segments.push((from, to, color));
        }
    }

    impl Recorder {
        fn count(&self, color: Color) -> usize {
            self.segments.iter().filter(|s| s.2 == color).count()
        }
    }

    fn sample_correspondences(n: usize) -> Vec<Correspondence> {
        (0..n)
            .map(|i| {
                let p = DVec2::new(i as f64 * 3.0, 5.0 + i as f64);
                Correspondence::new(p, p + DVec2::new(1.0, 0.0))
            })
            .collect()
    }

    #[test]
    fn test_layout_equal_images() {
        let layout = VisualizationLayout::new(100, 100, 100, 100);
        assert_eq!(layout.width, 100);
        assert_eq!(layout.height, 50);
        assert_eq!(layout.zoom, 0.5);
        assert_eq!(layout.placement2 * DVec2::ZERO, DVec2::new(50.0, 0.0));
        assert_eq!(layout.separator_x(100), 50.0);
    }

    #[test]
    fn test_layout_height_never_zero() {
        let layout = VisualizationLayout::new(1000, 1, 1000, 1);
        assert_eq!(layout.height, 1);
    }

    #[test]
    fn test_layout_height_matches_canvas_for_odd_sizes() {
        for (w1, h1, w2, h2) in [(33, 17, 65, 91), (7, 3, 5, 11), (640, 480, 320, 241)] {
            let layout = VisualizationLayout::new(w1, h1, w2, h2);
            let g1 = GrayImage::new_filled(w1, h1, 0.0);
            let g2 = GrayImage::new_filled(w2, h2, 0.0);
            let views = render_match_views(&g1, &g2, &[], &[], None);
            assert_eq!(views.inliers.width(), layout.width);
            assert_eq!(views.inliers.height(), layout.height);
            assert_eq!(views.inliers.len() * 3, layout.planar_len());
        }
    }

    #[test]
    fn test_segment_counts_follow_classification() {
        let corr = sample_correspondences(8);
        let inliers = [6, 0, 3];
        let h = DMat3::identity();
        let mut inn = Recorder::default();
        let mut out = Recorder::default();
        draw_matches(
            &corr,
            &inliers,
            Some(&h),
            &DMat3::identity(),
            &DMat3::identity(),
            &mut inn,
            &mut out,
        );
        assert_eq!(inn.segments.len(), 3);
        assert_eq!(inn.count(Color::GREEN), 3);
        assert_eq!(out.count(Color::RED), 5);
        assert_eq!(out.count(Color::YELLOW), 5);
    }

    #[test]
    fn test_no_residual_overlay_without_homography() {
        let corr = sample_correspondences(6);
        let mut inn = Recorder::default();
        let mut out = Recorder::default();
        draw_matches(
            &corr,
            &[1, 2],
            None,
            &DMat3::identity(),
            &DMat3::identity(),
            &mut inn,
            &mut out,
        );
        assert_eq!(out.count(Color::YELLOW), 0);
        assert_eq!(out.count(Color::RED), 4);
        assert_eq!(inn.count(Color::GREEN), 2);
    }

    #[test]
    fn test_residual_goes_from_prediction_to_observation() {
        let corr = vec![Correspondence::new(DVec2::new(1.0, 1.0), DVec2::new(10.0, 10.0))];
        let h = DMat3::translation(2.0, 0.0);
        let p2 = DMat3::zoom_translation(0.5, 100.0, 0.0);
        let mut inn = Recorder::default();
        let mut out = Recorder::default();
        draw_matches(&corr, &[], Some(&h), &DMat3::identity(), &p2, &mut inn, &mut out);

        let (from, to, color) = out.segments[0];
        assert_eq!(color, Color::YELLOW);
        assert_eq!(from, DVec2::new(101.5, 0.5));
        assert_eq!(to, DVec2::new(105.0, 5.0));
        assert_eq!(out.segments[1], (DVec2::new(1.0, 1.0), to, Color::RED));
    }

    #[test]
    fn test_duplicate_inlier_indices_do_not_stall_the_scan() {
        let corr = sample_correspondences(4);
        let mut inn = Recorder::default();
        let mut out = Recorder::default();
        draw_matches(
            &corr,
            &[2, 1, 1],
            None,
            &DMat3::identity(),
            &DMat3::identity(),
            &mut inn,
            &mut out,
        );
        assert_eq!(inn.count(Color::GREEN), 2);
        assert_eq!(out.count(Color::RED), 2);
    }

    #[test]
    fn test_render_draws_separator_and_links() {
        let g = GrayImage::new_filled(20, 20, 0.0);
        let corr = vec![
            Correspondence::new(DVec2::new(2.0, 10.0), DVec2::new(2.0, 10.0)),
            Correspondence::new(DVec2::new(4.0, 4.0), DVec2::new(16.0, 16.0)),
        ];
        let views = render_match_views(&g, &g, &corr, &[0], Some(&DMat3::identity()));

        // separator at x = 10 in both views
        assert_eq!(views.inliers[(10, 0)], Color::BLUE.to_rgb());
        assert_eq!(views.outliers[(10, 9)], Color::BLUE.to_rgb());
        // inlier link row y = 5 from x = 1 to x = 11 in the "in" view only
        assert_eq!(views.inliers[(3, 5)], Color::GREEN.to_rgb());
        assert_ne!(views.outliers[(3, 5)], Color::GREEN.to_rgb());
        // outlier start point (2, 2) is red in "out"
        assert_eq!(views.outliers[(2, 2)], Color::RED.to_rgb());
        // background of the warped images is the black source
        assert_eq!(views.inliers[(5, 1)], [0.0; 3]);
    }
}
