//! Crop compositing: merge a binary foreground mask with a source image
//! into a tightly cropped cutout.
//!
//! The bounding-box derivation lives in [`mask_bounds`] so the row/column
//! to (left, top, right, bottom) mapping stays in exactly one place.

use anyhow::Result;
use image::{GrayImage, Rgb, RgbImage};

/// Crop rectangle in image coordinates. `right` and `bottom` are exclusive,
/// so width = right - left and height = bottom - top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    /// Box covering an entire image of the given dimensions
    pub fn full_image(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Derive the crop box from a mask's nonzero extent, expanded by `margin`
/// pixels on every side and clamped to the image bounds.
///
/// Rows map to the y axis (top/bottom) and columns to the x axis
/// (left/right). Returns `None` for an all-zero mask; the caller decides
/// the fallback.
pub fn mask_bounds(mask: &GrayImage, margin: u32) -> Option<CropBox> {
    let (width, height) = mask.dimensions();

    let mut min_col = u32::MAX;
    let mut max_col = 0u32;
    let mut min_row = u32::MAX;
    let mut max_row = 0u32;
    let mut found = false;

    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] != 0 {
            found = true;
            min_col = min_col.min(x);
            max_col = max_col.max(x);
            min_row = min_row.min(y);
            max_row = max_row.max(y);
        }
    }

    if !found {
        return None;
    }

    Some(CropBox {
        left: min_col.saturating_sub(margin),
        top: min_row.saturating_sub(margin),
        right: (max_col + margin + 1).min(width),
        bottom: (max_row + margin + 1).min(height),
    })
}

/// Stencil the mask onto the image: background pixels become black,
/// foreground pixels keep their original color.
pub fn apply_mask(img: &RgbImage, mask: &GrayImage) -> Result<RgbImage> {
    if img.dimensions() != mask.dimensions() {
        return Err(anyhow::anyhow!(
            "Mask dimensions {:?} do not match image dimensions {:?}",
            mask.dimensions(),
            img.dimensions()
        ));
    }

    let (width, height) = img.dimensions();
    let masked = RgbImage::from_fn(width, height, |x, y| {
        if mask.get_pixel(x, y)[0] == 0 {
            Rgb([0, 0, 0])
        } else {
            *img.get_pixel(x, y)
        }
    });

    Ok(masked)
}

/// Produce the final cutout: apply the mask, then crop to the mask extent
/// plus margin. An all-zero mask (no foreground detected) falls back to the
/// full image rather than failing.
pub fn compose_cutout(img: &RgbImage, mask: &GrayImage, margin: u32) -> Result<RgbImage> {
    let (width, height) = img.dimensions();

    let crop_box = match mask_bounds(mask, margin) {
        Some(b) => b,
        None => {
            log::debug!("No foreground detected, keeping the full image extent");
            CropBox::full_image(width, height)
        }
    };

    let masked = apply_mask(img, mask)?;
    let cropped = image::imageops::crop_imm(
        &masked,
        crop_box.left,
        crop_box.top,
        crop_box.width(),
        crop_box.height(),
    )
    .to_image();

    Ok(cropped)
}
