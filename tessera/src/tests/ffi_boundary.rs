//! The C entry point driven the way a host language would call it.

use std::ptr;

use super::helpers::{blocks, blocks_interleaved};
use crate::ffi::wrapper_estimate_homography;
use crate::mosaic::mosaic_dims;
use crate::visualization::VisualizationLayout;

const SENTINEL: f32 = -7.0;

struct Outputs {
    h: Vec<f32>,
    in_: Vec<f32>,
    out: Vec<f32>,
    im1w: Vec<f32>,
    im2w: Vec<f32>,
    mosaic: Vec<f32>,
}

impl Outputs {
    fn sized_for(w1: usize, h1: usize, w2: usize, h2: usize) -> Self {
        let views = VisualizationLayout::new(w1, h1, w2, h2).planar_len();
        let (mw, mh) = mosaic_dims(w1, h1, w2, h2);
        let canvas = 3 * mw * mh;
        Self {
            h: vec![SENTINEL; 9],
            in_: vec![SENTINEL; views],
            out: vec![SENTINEL; views],
            im1w: vec![SENTINEL; canvas],
            im2w: vec![SENTINEL; canvas],
            mosaic: vec![SENTINEL; canvas],
        }
    }
}

fn untouched(buffer: &[f32]) -> bool {
    buffer.iter().all(|&v| v == SENTINEL)
}

fn fully_written(buffer: &[f32]) -> bool {
    buffer.iter().all(|&v| v != SENTINEL)
}

#[allow(clippy::too_many_arguments)]
fn call(
    image1: &[f32],
    (w1, h1, c1): (i32, i32, i32),
    image2: &[f32],
    (w2, h2, c2): (i32, i32, i32),
    precision: f64,
    ratio: f32,
    outputs: &mut Outputs,
) -> bool {
    // SAFETY: every buffer is sized per the entry point's contract.
    unsafe {
        wrapper_estimate_homography(
            image1.as_ptr(),
            w1,
            h1,
            c1,
            image2.as_ptr(),
            w2,
            h2,
            c2,
            precision,
            ratio,
            outputs.h.as_mut_ptr(),
            outputs.in_.as_mut_ptr(),
            outputs.out.as_mut_ptr(),
            outputs.im1w.as_mut_ptr(),
            outputs.im2w.as_mut_ptr(),
            outputs.mosaic.as_mut_ptr(),
        )
    }
}

fn assert_identity(h: &[f32]) {
    let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    for (i, (a, b)) in h.iter().zip(identity).enumerate() {
        assert!((a - b).abs() < 1e-3, "h[{i}] = {a}, expected {b}");
    }
    assert_eq!(h[8], 1.0);
}

#[test]
fn test_identical_textured_pair_registers_to_identity() {
    let image = blocks_interleaved(100, 100, 7);
    let mut outputs = Outputs::sized_for(100, 100, 100, 100);

    let ok = call(&image, (100, 100, 3), &image, (100, 100, 3), 1.0, 0.6, &mut outputs);

    assert!(ok);
    assert_identity(&outputs.h);
    assert!(fully_written(&outputs.in_));
    assert!(fully_written(&outputs.out));
    assert!(fully_written(&outputs.mosaic));
    assert!(fully_written(&outputs.im1w));
    assert!(fully_written(&outputs.im2w));
}

#[test]
fn test_single_channel_input_is_accepted() {
    let image = blocks(100, 100, 7);
    let mut outputs = Outputs::sized_for(100, 100, 100, 100);

    let ok = call(&image, (100, 100, 1), &image, (100, 100, 1), 0.0, 0.6, &mut outputs);

    assert!(ok);
    assert_identity(&outputs.h);
}

#[test]
fn test_out_of_range_ratio_falls_back_to_default() {
    let image = blocks_interleaved(100, 100, 7);
    let mut outputs = Outputs::sized_for(100, 100, 100, 100);

    let ok = call(&image, (100, 100, 3), &image, (100, 100, 3), 1.0, 3.5, &mut outputs);

    assert!(ok);
    assert_identity(&outputs.h);
}

#[test]
fn test_flat_images_leave_homography_untouched() {
    let image = vec![90.0f32; 3 * 60 * 40];
    let mut outputs = Outputs::sized_for(60, 40, 60, 40);

    let ok = call(&image, (60, 40, 3), &image, (60, 40, 3), 0.0, 0.6, &mut outputs);

    assert!(!ok);
    assert!(untouched(&outputs.h));
    // match views are rendered even without a model
    assert!(fully_written(&outputs.in_));
    assert!(fully_written(&outputs.out));
    assert!(untouched(&outputs.mosaic));
    assert!(untouched(&outputs.im1w));
    assert!(untouched(&outputs.im2w));
}

#[test]
fn test_unrelated_textures_report_zero_coefficients() {
    let image1 = blocks_interleaved(100, 100, 7);
    let image2 = blocks_interleaved(100, 100, 1234);
    let mut outputs = Outputs::sized_for(100, 100, 100, 100);

    // a ratio of 1 keeps every nearest neighbour, so the sampler always runs
    let ok = call(&image1, (100, 100, 3), &image2, (100, 100, 3), 1.0, 1.0, &mut outputs);

    assert!(!ok);
    assert_eq!(outputs.h, vec![0.0f32; 9]);
    assert!(fully_written(&outputs.in_));
    assert!(fully_written(&outputs.out));
    assert!(untouched(&outputs.mosaic));
    assert!(untouched(&outputs.im1w));
    assert!(untouched(&outputs.im2w));
}

#[test]
fn test_only_requested_warp_is_written() {
    let image = blocks_interleaved(100, 100, 7);
    let mut h = vec![SENTINEL; 9];
    let mut im2w = vec![SENTINEL; 3 * 100 * 100];

    // SAFETY: both images hold 3 * 100 * 100 floats, im2w is canvas sized.
    let ok = unsafe {
        wrapper_estimate_homography(
            image.as_ptr(),
            100,
            100,
            3,
            image.as_ptr(),
            100,
            100,
            3,
            1.0,
            0.6,
            h.as_mut_ptr(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            im2w.as_mut_ptr(),
            ptr::null_mut(),
        )
    };

    assert!(ok);
    assert!(fully_written(&im2w));
}

#[test]
fn test_null_input_is_rejected() {
    let image = blocks_interleaved(50, 50, 1);
    let mut h = vec![SENTINEL; 9];

    // SAFETY: the null image is rejected before any buffer is read.
    let ok = unsafe {
        wrapper_estimate_homography(
            ptr::null(),
            50,
            50,
            3,
            image.as_ptr(),
            50,
            50,
            3,
            0.0,
            0.6,
            h.as_mut_ptr(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
        )
    };

    assert!(!ok);
    assert!(untouched(&h));
}

#[test]
fn test_non_positive_dimensions_are_rejected() {
    let image = blocks_interleaved(50, 50, 1);
    let mut outputs = Outputs::sized_for(50, 50, 50, 50);

    assert!(!call(&image, (0, 50, 3), &image, (50, 50, 3), 0.0, 0.6, &mut outputs));
    assert!(!call(&image, (50, 50, 3), &image, (50, -2, 3), 0.0, 0.6, &mut outputs));
    assert!(untouched(&outputs.h));
    assert!(untouched(&outputs.in_));
}

#[test]
fn test_null_outputs_are_skipped() {
    let image = blocks_interleaved(100, 100, 7);
    let mut h = vec![SENTINEL; 9];

    // SAFETY: both images hold 3 * 100 * 100 floats; null outputs are skipped.
    let ok = unsafe {
        wrapper_estimate_homography(
            image.as_ptr(),
            100,
            100,
            3,
            image.as_ptr(),
            100,
            100,
            3,
            1.0,
            0.6,
            h.as_mut_ptr(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
        )
    };

    assert!(ok);
    assert_identity(&h);
}
