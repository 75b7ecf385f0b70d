//! Image preparation for the segmentation network: histogram equalization
//! followed by conversion into a normalized NCHW batch tensor.

use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

/// Equalize one 256-bin channel histogram.
///
/// Standard CDF remap: `out = (cdf[v] - cdf_min) / (pixels - cdf_min) * 255`.
/// A channel with a single value is left unchanged (the remap is undefined
/// there and the contrast cannot be stretched anyway).
fn equalize_channel_lut(histogram: &[u32; 256], pixel_count: u32) -> [u8; 256] {
    let mut lut = [0u8; 256];

    let mut cdf = [0u32; 256];
    let mut running = 0u32;
    for (value, count) in histogram.iter().enumerate() {
        running += count;
        cdf[value] = running;
    }

    let cdf_min = cdf
        .iter()
        .copied()
        .find(|&c| c > 0)
        .unwrap_or(0);

    if cdf_min == pixel_count {
        // Single-valued channel: identity mapping
        for (value, entry) in lut.iter_mut().enumerate() {
            *entry = value as u8;
        }
        return lut;
    }

    let denom = (pixel_count - cdf_min) as f32;
    for (value, entry) in lut.iter_mut().enumerate() {
        let scaled = (cdf[value].saturating_sub(cdf_min)) as f32 / denom * 255.0;
        *entry = scaled.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Apply per-channel histogram equalization to an RGB image.
pub fn equalize_image(img: &RgbImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let pixel_count = width * height;

    let mut histograms = [[0u32; 256]; 3];
    for pixel in img.pixels() {
        for c in 0..3 {
            histograms[c][pixel[c] as usize] += 1;
        }
    }

    let luts: Vec<[u8; 256]> = histograms
        .iter()
        .map(|h| equalize_channel_lut(h, pixel_count))
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        let pixel = img.get_pixel(x, y);
        Rgb([
            luts[0][pixel[0] as usize],
            luts[1][pixel[1] as usize],
            luts[2][pixel[2] as usize],
        ])
    })
}

/// Convert an RGB image into a (1, 3, H, W) f32 tensor scaled to [0, 1].
pub fn image_to_batch_tensor(img: &RgbImage) -> Array4<f32> {
    let (width, height) = img.dimensions();
    let mut input_array = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for y in 0..height {
        for x in 0..width {
            let pixel = img.get_pixel(x, y);
            for c in 0..3 {
                input_array[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }
    }

    input_array
}

/// Prepare an image for inference: equalize, then tensorize with a batch
/// dimension. Returns the equalized image as well, since the mask is
/// applied onto it (not onto the raw file contents).
pub fn prepare_image(img: &DynamicImage) -> Result<(RgbImage, Array4<f32>)> {
    let equalized = equalize_image(&img.to_rgb8());
    let tensor = image_to_batch_tensor(&equalized);
    Ok((equalized, tensor))
}
