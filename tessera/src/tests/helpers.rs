use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::math::DMat3;
use crate::matching::Correspondence;

/// Random axis-aligned blocks on a gray background, single channel.
pub fn blocks(width: usize, height: usize, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pixels = vec![128.0f32; width * height];
    for _ in 0..25 {
        let w = rng.random_range(4..14);
        let h = rng.random_range(4..14);
        let x0 = rng.random_range(0..width - w);
        let y0 = rng.random_range(0..height - h);
        let v: f32 = rng.random_range(0.0..255.0);
        for y in y0..y0 + h {
            pixels[y * width + x0..y * width + x0 + w].fill(v);
        }
    }
    pixels
}

/// [`blocks`] repeated into three interleaved channels.
pub fn blocks_interleaved(width: usize, height: usize, seed: u64) -> Vec<f32> {
    blocks(width, height, seed)
        .into_iter()
        .flat_map(|v| [v, v, v])
        .collect()
}

pub fn perspective() -> DMat3 {
    DMat3::from_rows([1.02, 0.05, 4.0], [-0.03, 0.98, -6.0], [1e-4, -5e-5, 1.0])
}

/// `count` correspondences under `h` with uniform noise of `noise` pixels per
/// coordinate; every `outlier_every`-th one is replaced by a random pair.
/// Returns the correspondences and the indices that were corrupted.
pub fn noisy_correspondences(
    h: &DMat3,
    count: usize,
    noise: f64,
    outlier_every: usize,
    seed: u64,
) -> (Vec<Correspondence>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut corrupted = Vec::new();
    let correspondences = (0..count)
        .map(|i| {
            let p1 = DVec2::new(rng.random_range(10.0..190.0), rng.random_range(10.0..190.0));
            if i % outlier_every == outlier_every - 1 {
                corrupted.push(i);
                let p2 = DVec2::new(rng.random_range(0.0..200.0), rng.random_range(0.0..200.0));
                return Correspondence::new(p1, p2);
            }
            let jitter = DVec2::new(rng.random_range(-noise..=noise), rng.random_range(-noise..=noise));
            Correspondence::new(p1, h.transform_point(p1) + jitter)
        })
        .collect();
    (correspondences, corrupted)
}

pub fn max_abs_diff(a: &[f64; 9], b: &[f64; 9]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
