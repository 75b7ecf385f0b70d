//! Mask extraction from raw segmentation scores.

use anyhow::Result;
use image::{GrayImage, Luma};
use ndarray::ArrayViewD;

/// Pixel value marking foreground in extracted masks.
pub const FOREGROUND_VALUE: u8 = 255;

/// Index of the foreground ("ear") class in the score tensor.
pub const FOREGROUND_CLASS: usize = 1;

/// Number of classes the segmentation network predicts.
pub const NUM_CLASSES: usize = 2;

/// Turn a (1, 2, H, W) class-score tensor into a binary 0/255 mask by
/// arg-max over the class dimension. Ties resolve to background, matching
/// arg-max conventions that return the first maximal index.
pub fn extract_mask(scores: &ArrayViewD<f32>) -> Result<GrayImage> {
    let shape = scores.shape();
    if shape.len() != 4 || shape[0] != 1 || shape[1] != NUM_CLASSES {
        return Err(anyhow::anyhow!(
            "Unexpected segmentation output shape {:?}, expected (1, {}, H, W)",
            shape,
            NUM_CLASSES
        ));
    }

    let height = shape[2];
    let width = shape[3];

    let mask = GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let background = scores[[0, 0, y as usize, x as usize]];
        let foreground = scores[[0, FOREGROUND_CLASS, y as usize, x as usize]];
        if foreground > background {
            Luma([FOREGROUND_VALUE])
        } else {
            Luma([0])
        }
    });

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn scores_with_foreground(
        width: usize,
        height: usize,
        foreground: &[(usize, usize)],
    ) -> ndarray::ArrayD<f32> {
        let mut scores = Array4::<f32>::zeros((1, 2, height, width));
        // Background wins everywhere by default
        scores.slice_mut(ndarray::s![0, 0, .., ..]).fill(1.0);
        for &(row, col) in foreground {
            scores[[0, 1, row, col]] = 2.0;
        }
        scores.into_dyn()
    }

    #[test]
    fn test_extract_mask_argmax() {
        let scores = scores_with_foreground(4, 3, &[(1, 2), (2, 0)]);
        let mask = extract_mask(&scores.view()).unwrap();

        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(mask.get_pixel(2, 1)[0], FOREGROUND_VALUE);
        assert_eq!(mask.get_pixel(0, 2)[0], FOREGROUND_VALUE);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(3, 2)[0], 0);
    }

    #[test]
    fn test_extract_mask_tie_is_background() {
        let scores = Array4::<f32>::zeros((1, 2, 2, 2)).into_dyn();
        let mask = extract_mask(&scores.view()).unwrap();
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_extract_mask_rejects_wrong_batch() {
        let scores = Array4::<f32>::zeros((2, 2, 4, 4)).into_dyn();
        let result = extract_mask(&scores.view());
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_mask_rejects_wrong_class_count() {
        let scores = Array4::<f32>::zeros((1, 3, 4, 4)).into_dyn();
        let result = extract_mask(&scores.view());
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_mask_rejects_wrong_rank() {
        let scores = ndarray::Array3::<f32>::zeros((2, 4, 4)).into_dyn();
        let result = extract_mask(&scores.view());
        assert!(result.is_err());
    }
}
