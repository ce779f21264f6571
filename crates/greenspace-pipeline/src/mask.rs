//! Binary vegetation mask.
//!
//! A [`Mask`] is a single-channel image where every pixel is either
//! [`Mask::SET`] (255, vegetation candidate) or [`Mask::UNSET`] (0).
//! Storing it as a `GrayImage` keeps it compatible with `imageproc`
//! morphology and lets it be encoded as a PNG for inspection.

use image::{GrayImage, Luma};

use crate::types::Dimensions;

/// A binary per-pixel classification with the dimensions of its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(GrayImage);

impl Mask {
    /// Intensity of a set pixel.
    pub const SET: u8 = 255;

    /// Intensity of an unset pixel.
    pub const UNSET: u8 = 0;

    /// An all-unset mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Build a mask by evaluating `f` at every coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { Self::SET } else { Self::UNSET }])
        }))
    }

    /// Wrap a grayscale image, treating any non-zero pixel as set.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| {
            image.get_pixel(x, y).0[0] != Self::UNSET
        })
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.0.width(), self.0.height())
    }

    /// Whether the pixel at `(x, y)` is set.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] != Self::UNSET
    }

    /// Mark the pixel at `(x, y)` as set or unset.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let v = if value { Self::SET } else { Self::UNSET };
        self.0.put_pixel(x, y, Luma([v]));
    }

    /// Number of set pixels.
    #[must_use]
    pub fn count_set(&self) -> u64 {
        self.0
            .pixels()
            .map(|p| u64::from(p.0[0] != Self::UNSET))
            .sum()
    }

    /// Borrow the underlying 0/255 image.
    #[must_use]
    pub const fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// Consume the mask, returning the underlying 0/255 image.
    #[must_use]
    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mask_is_empty() {
        let mask = Mask::new(4, 3);
        assert_eq!(mask.dimensions(), Dimensions::new(4, 3));
        assert_eq!(mask.count_set(), 0);
    }

    #[test]
    fn from_fn_stores_binary_intensities() {
        let mask = Mask::from_fn(3, 3, |x, y| x == y);
        assert_eq!(mask.count_set(), 3);
        assert_eq!(mask.as_gray().get_pixel(1, 1).0[0], Mask::SET);
        assert_eq!(mask.as_gray().get_pixel(0, 1).0[0], Mask::UNSET);
    }

    #[test]
    fn from_gray_normalizes_nonzero_to_set() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(1, 0, Luma([7]));
        let mask = Mask::from_gray(&gray);
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert_eq!(mask.into_gray().get_pixel(1, 0).0[0], Mask::SET);
    }

    #[test]
    fn set_and_get_agree() {
        let mut mask = Mask::new(5, 5);
        mask.set(2, 3, true);
        assert!(mask.get(2, 3));
        mask.set(2, 3, false);
        assert!(!mask.get(2, 3));
    }
}
