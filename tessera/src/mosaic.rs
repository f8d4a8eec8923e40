//! Mosaic of two registered images, plus each image warped on its own.
//!
//! All three canvases are `max(w1, w2) x max(h1, h2)`, centered on the
//! overlap of image 1's footprint (through the homography) with image 2.

use common::Buffer2;
use glam::DVec2;
use tracing::debug;

use crate::color::Color;
use crate::image::RgbImage;
use crate::math::{DMat3, translation};
use crate::warp::{warp_into, warp_pair_into};

/// Axis-aligned integer rectangle `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rect {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Integer center, rounding toward zero.
    pub fn center(&self) -> (i64, i64) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }
}

/// Footprint of image 1 through `h`, intersected with image 2.
///
/// `None` when a corner of image 1 maps to infinity or behind the camera.
pub fn intersection_box(w1: usize, h1: usize, w2: usize, h2: usize, h: &DMat3) -> Option<Rect> {
    let corners = [
        DVec2::new(0.0, 0.0),
        DVec2::new(w1 as f64, 0.0),
        DVec2::new(0.0, h1 as f64),
        DVec2::new(w1 as f64, h1 as f64),
    ];

    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    for c in corners {
        let p = h.transform_homogeneous(c);
        if p.z.is_nan() || p.z <= 0.0 {
            return None;
        }
        let q = DVec2::new(p.x / p.z, p.y / p.z);
        if !q.is_finite() {
            return None;
        }
        min = min.min(q);
        max = max.max(q);
    }

    // clamp before casting so huge footprints stay representable
    let limit = 4.0 * (w2.max(h2) as f64 + 1.0);
    let footprint = Rect::new(
        min.x.clamp(-limit, limit).floor() as i64,
        min.y.clamp(-limit, limit).floor() as i64,
        max.x.clamp(-limit, limit).ceil() as i64,
        max.y.clamp(-limit, limit).ceil() as i64,
    );
    Some(footprint.intersect(&Rect::new(0, 0, w2 as i64, h2 as i64)))
}

/// Canvas size shared by the mosaic and the individual warps.
pub fn mosaic_dims(w1: usize, h1: usize, w2: usize, h2: usize) -> (usize, usize) {
    (w1.max(w2), h1.max(h2))
}

/// Translation taking the overlap center to the canvas center.
pub fn centering_translation(overlap: &Rect, width: usize, height: usize) -> DMat3 {
    let (xc, yc) = overlap.center();
    let xo = (width / 2) as i64;
    let yo = (height / 2) as i64;
    translation((xo - xc) as f64, (yo - yc) as f64)
}

/// Which canvases to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicRequest {
    pub mosaic: bool,
    /// Image 1 warped on its own.
    pub warp1: bool,
    /// Image 2 warped on its own.
    pub warp2: bool,
}

impl MosaicRequest {
    pub const ALL: MosaicRequest = MosaicRequest {
        mosaic: true,
        warp1: true,
        warp2: true,
    };

    pub fn any(&self) -> bool {
        self.mosaic || self.warp1 || self.warp2
    }
}

#[derive(Debug, Clone)]
pub struct MosaicOutputs {
    pub width: usize,
    pub height: usize,
    /// Both images in the shared frame, averaged where they overlap.
    pub mosaic: Option<RgbImage>,
    /// Image 1 through the centered homography.
    pub warped1: Option<RgbImage>,
    /// Image 2 through the centering translation.
    pub warped2: Option<RgbImage>,
}

/// Compose the requested canvases.
///
/// Returns `None` when nothing is requested or image 1's footprint does not
/// overlap image 2.
pub fn compose_mosaic(
    image1: &RgbImage,
    image2: &RgbImage,
    h: &DMat3,
    request: MosaicRequest,
) -> Option<MosaicOutputs> {
    if !request.any() {
        return None;
    }

    let (w1, h1) = (image1.width(), image1.height());
    let (w2, h2) = (image2.width(), image2.height());

    let overlap = match intersection_box(w1, h1, w2, h2, h) {
        Some(r) if !r.is_empty() => r,
        other => {
            debug!(overlap = ?other, "images do not overlap, skipping mosaic");
            return None;
        }
    };

    let (width, height) = mosaic_dims(w1, h1, w2, h2);
    let t = centering_translation(&overlap, width, height);
    let th = t * *h;
    let white = Color::WHITE.to_rgb();

    let mosaic = request.mosaic.then(|| {
        let mut canvas = Buffer2::new_filled(width, height, white);
        warp_pair_into(image1, &th, image2, &t, &mut canvas);
        canvas
    });

    let warped1 = request.warp1.then(|| {
        let mut canvas = Buffer2::new_filled(width, height, white);
        warp_into(image1, &th, &mut canvas);
        canvas
    });
    let warped2 = request.warp2.then(|| {
        let mut canvas = Buffer2::new_filled(width, height, white);
        warp_into(image2, &t, &mut canvas);
        canvas
    });

    debug!(width, height, ?overlap, "mosaic composed");

    Some(MosaicOutputs {
        width,
        height,
        mosaic,
        warped1,
        warped2,
    })
}
