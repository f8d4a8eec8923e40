//! C ABI entry point for host languages.
//!
//! Inputs are interleaved (HWC) float buffers in the 0-255 range: pixel
//! `(x, y)` channel `c` is at `(y * w + x) * channels + c`. Input is NOT read
//! per-channel planar, even though outputs are; pass image arrays as
//! `height x width x channels` the way image libraries hold them.
//!
//! Outputs are planar (CHW). Output pointers may be null to skip that output.
//! Buffer sizes are the caller's responsibility:
//!
//! | buffer | floats |
//! |---|---|
//! | `h` | 9 |
//! | `in_`, `out` | `3 * w * h` of [`crate::visualization::VisualizationLayout::new`] |
//! | `im1w`, `im2w`, `mosaic` | `3 * max(w1, w2) * max(h1, h2)` |

use std::ffi::c_int;
use std::slice;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error};

use crate::config::{Config, OutputRequest, clock_seed};
use crate::constants::{DEFAULT_MATCH_RATIO, ORSA_ITERATIONS};
use crate::image::{PixelFormat, RgbImage, planar_len, rgb_from_interleaved, write_planar};
use crate::matching::CornerMatcher;
use crate::pipeline::register;

/// Estimate the homography from image 1 to image 2 and render the requested
/// outputs. Returns `true` iff estimation succeeded.
///
/// `h` receives the nine row-major coefficients whenever estimation was
/// attempted, zeros on failure. With fewer than five correspondences it is
/// left untouched. Only the return value says whether `h` is valid.
///
/// `precision <= 0` lets the estimator choose the inlier tolerance.
///
/// # Safety
///
/// `image1` and `image2` must point to `w * h * c` floats (`c` being 1 or 3).
/// Every non-null output pointer must point to a buffer of the size listed in
/// the module documentation. No buffer may alias another.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn wrapper_estimate_homography(
    image1: *const f32,
    w1: c_int,
    h1: c_int,
    c1: c_int,
    image2: *const f32,
    w2: c_int,
    h2: c_int,
    c2: c_int,
    precision: f64,
    sift_ratio: f32,
    h: *mut f32,
    in_: *mut f32,
    out: *mut f32,
    im1w: *mut f32,
    im2w: *mut f32,
    mosaic: *mut f32,
) -> bool {
    common::log_setup::init_stderr_logging();

    // SAFETY: forwarded from the caller's contract.
    let Some(image1) = (unsafe { import(image1, w1, h1, c1, "image1") }) else {
        return false;
    };
    // SAFETY: forwarded from the caller's contract.
    let Some(image2) = (unsafe { import(image2, w2, h2, c2, "image2") }) else {
        return false;
    };

    let ratio = if (0.0..=1.0).contains(&sift_ratio) {
        sift_ratio
    } else {
        error!(sift_ratio, "ratio outside [0, 1], using {DEFAULT_MATCH_RATIO}");
        DEFAULT_MATCH_RATIO
    };

    let config = Config {
        precision: if precision.is_nan() { 0.0 } else { precision },
        ratio,
        max_iterations: ORSA_ITERATIONS,
        seed: None,
        outputs: OutputRequest {
            visualization: !in_.is_null() && !out.is_null(),
            mosaic: !mosaic.is_null(),
            warp1: !im1w.is_null(),
            warp2: !im2w.is_null(),
        },
    };

    let seed = clock_seed();
    debug!(seed, "seeding sampler from the clock");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let result = register(&image1, &image2, &CornerMatcher::default(), &config, &mut rng);

    if let Some(coefficients) = result.coefficients
        && !h.is_null()
    {
        // SAFETY: `h` is non-null and holds 9 floats per the caller's contract.
        let h = unsafe { slice::from_raw_parts_mut(h, 9) };
        for (dst, src) in h.iter_mut().zip(coefficients) {
            *dst = src as f32;
        }
    }

    if let Some(views) = &result.match_views {
        // SAFETY: both pointers were checked non-null when the views were requested.
        unsafe {
            export(in_, &views.inliers);
            export(out, &views.outliers);
        }
    }

    if let Some(outputs) = &result.mosaic {
        // SAFETY: null pointers are skipped; sizes per the caller's contract.
        unsafe {
            if let Some(img) = &outputs.mosaic {
                export(mosaic, img);
            }
            if let Some(img) = &outputs.warped1 {
                export(im1w, img);
            }
            if let Some(img) = &outputs.warped2 {
                export(im2w, img);
            }
        }
    }

    result.is_success()
}

/// Wrap a caller buffer as an RGB image; logs and returns `None` on bad input.
///
/// # Safety
///
/// A non-null `data` must point to `width * height * channels` floats.
unsafe fn import(
    data: *const f32,
    width: c_int,
    height: c_int,
    channels: c_int,
    name: &str,
) -> Option<RgbImage> {
    if data.is_null() || width <= 0 || height <= 0 || channels <= 0 {
        error!(name, width, height, channels, "invalid input image");
        return None;
    }
    let (width, height) = (width as usize, height as usize);
    let format = PixelFormat::from_channel_count(channels as usize);
    let len = width * height * format.channel_count();

    // SAFETY: `data` is non-null and holds `len` floats per the caller's contract.
    let samples = unsafe { slice::from_raw_parts(data, len) };
    match rgb_from_interleaved(samples, width, height, format) {
        Ok(image) => Some(image),
        Err(err) => {
            error!(name, %err, "cannot import image");
            None
        }
    }
}

/// Write `image` in planar layout to `dst` unless it is null.
///
/// # Safety
///
/// A non-null `dst` must point to `3 * width * height` writable floats.
unsafe fn export(dst: *mut f32, image: &RgbImage) {
    if dst.is_null() {
        return;
    }
    let len = planar_len(image.width(), image.height());
    // SAFETY: `dst` is non-null and holds `len` floats per the caller's contract.
    let out = unsafe { slice::from_raw_parts_mut(dst, len) };
    write_planar(image, out);
}
