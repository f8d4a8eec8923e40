//! Conversion between flat float buffers and the internal image types.
//!
//! Inputs arrive interleaved (HWC). Outputs leave planar (CHW): every red
//! sample, then every green sample, then every blue sample.

use common::Buffer2;
use thiserror::Error;

use crate::color::luminance;

/// Single-channel image, samples in 0-255.
pub type GrayImage = Buffer2<f32>;

/// Three-channel image, samples in 0-255.
pub type RgbImage = Buffer2<[f32; 3]>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("pixel buffer too small: expected {expected} samples, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("image has zero width or height")]
    EmptyImage,
}

/// Layout of a caller-supplied pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One sample per pixel, replicated into all three channels on import.
    Gray,
    /// Three samples per pixel, passed through unchanged.
    Rgb,
}

impl PixelFormat {
    /// One channel means gray. Every other count is treated as RGB.
    pub fn from_channel_count(channels: usize) -> Self {
        if channels == 1 {
            PixelFormat::Gray
        } else {
            PixelFormat::Rgb
        }
    }

    pub fn channel_count(self) -> usize {
        match self {
            PixelFormat::Gray => 1,
            PixelFormat::Rgb => 3,
        }
    }
}

/// Builds an RGB image from an interleaved float buffer.
pub fn rgb_from_interleaved(
    data: &[f32],
    width: usize,
    height: usize,
    format: PixelFormat,
) -> Result<RgbImage, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::EmptyImage);
    }

    let pixel_count = width * height;
    let channels = format.channel_count();
    let expected = pixel_count * channels;
    if data.len() < expected {
        return Err(ImageError::BufferTooSmall {
            expected,
            actual: data.len(),
        });
    }

    let pixels: Vec<[f32; 3]> = match format {
        PixelFormat::Gray => data[..pixel_count].iter().map(|&v| [v, v, v]).collect(),
        PixelFormat::Rgb => data[..expected]
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect(),
    };

    Ok(Buffer2::new(width, height, pixels))
}

/// Rec. 709 luminance of every pixel.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    image.map(|&rgb| luminance(rgb))
}

/// Replicates the single channel into red, green and blue.
pub fn gray_to_rgb(image: &GrayImage) -> RgbImage {
    image.map(|&v| [v, v, v])
}

/// Number of floats a planar RGB buffer of this image occupies.
pub fn planar_len(width: usize, height: usize) -> usize {
    width * height * 3
}

/// Writes the image in planar layout into `out`, which must hold at least
/// `3 * width * height` floats.
pub fn write_planar(image: &RgbImage, out: &mut [f32]) {
    let plane = image.len();
    debug_assert!(out.len() >= plane * 3);

    let (red, rest) = out.split_at_mut(plane);
    let (green, rest) = rest.split_at_mut(plane);
    let blue = &mut rest[..plane];

    for (i, px) in image.iter().enumerate() {
        red[i] = px[0];
        green[i] = px[1];
        blue[i] = px[2];
    }
}

/// Planar serialization into a fresh vector.
pub fn to_planar(image: &RgbImage) -> Vec<f32> {
    let mut out = vec![0.0; planar_len(image.width(), image.height())];
    write_planar(image, &mut out);
    out
}
