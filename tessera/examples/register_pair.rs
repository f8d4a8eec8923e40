//! Example: register two photographs of a planar scene
//!
//! Estimates the homography from the first image to the second, prints it and
//! writes the rendered outputs next to each other in the output directory:
//!
//! ```text
//! <out_dir>/
//!   in.png           inlier links
//!   out.png          outlier links and residuals
//!   im1_warped.png   image 1 in the mosaic frame
//!   im2_warped.png   image 2 in the mosaic frame
//!   mosaic.png       both, averaged
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --example register_pair -- left.jpg right.jpg [out_dir] [precision]
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use common::log_setup::setup_logging;
use tessera::{Config, CornerMatcher, RgbImage, register_with_seed};

fn main() -> anyhow::Result<()> {
    setup_logging("info");

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("usage: register_pair <image1> <image2> [out_dir] [precision]");
    }
    let out_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("test_output"));
    let precision = match args.get(3) {
        Some(p) => p.parse().with_context(|| format!("invalid precision {p:?}"))?,
        None => 0.0,
    };

    let image1 = load(Path::new(&args[0]))?;
    let image2 = load(Path::new(&args[1]))?;
    fs::create_dir_all(&out_dir)?;

    let config = Config {
        precision,
        ..Default::default()
    };

    let start = Instant::now();
    let result = register_with_seed(&image1, &image2, &CornerMatcher::default(), &config);
    println!(
        "{} correspondences, registered in {:.2?}",
        result.correspondences.len(),
        start.elapsed()
    );

    match &result.estimate {
        Ok(estimate) => {
            println!(
                "{} inliers, precision {:.3} px, log NFA {:.2}",
                estimate.inliers.len(),
                estimate.precision,
                estimate.log_nfa
            );
            let h = estimate.homography.as_array();
            for row in h.chunks(3) {
                println!("  [{:>12.6} {:>12.6} {:>12.6}]", row[0], row[1], row[2]);
            }
        }
        Err(err) => println!("registration failed: {err}"),
    }

    if let Some(views) = &result.match_views {
        save(&views.inliers, &out_dir.join("in.png"))?;
        save(&views.outliers, &out_dir.join("out.png"))?;
    }
    if let Some(outputs) = &result.mosaic {
        let files = [
            (&outputs.warped1, "im1_warped.png"),
            (&outputs.warped2, "im2_warped.png"),
            (&outputs.mosaic, "mosaic.png"),
        ];
        for (image, name) in files {
            if let Some(image) = image {
                save(image, &out_dir.join(name))?;
            }
        }
    }

    println!("outputs written to {}", out_dir.display());
    Ok(())
}

fn load(path: &Path) -> anyhow::Result<RgbImage> {
    let decoded = image::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?
        .into_rgb8();
    let (width, height) = decoded.dimensions();
    let pixels = decoded
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();
    Ok(RgbImage::new(width as usize, height as usize, pixels))
}

fn save(image: &RgbImage, path: &Path) -> anyhow::Result<()> {
    let bytes: Vec<u8> = image
        .pixels()
        .iter()
        .flat_map(|px| px.map(|v| v.round().clamp(0.0, 255.0) as u8))
        .collect();
    let buffer = image::RgbImage::from_raw(image.width() as u32, image.height() as u32, bytes)
        .context("pixel buffer does not match the image size")?;
    buffer
        .save(path)
        .with_context(|| format!("cannot write {}", path.display()))
}
