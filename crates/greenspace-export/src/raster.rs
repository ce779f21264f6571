//! Raster image encoding.
//!
//! Encodes the overlay (RGB) and the refined mask (8-bit grayscale) into
//! in-memory image files. Callers decide where the bytes go.

use greenspace_pipeline::{Mask, RgbImage};
use image::{ExtendedColorType, ImageEncoder};

/// Errors that can occur while encoding an image.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The encoder rejected the image.
    #[error("{format} encoding failed: {source}")]
    Encode {
        /// Target format.
        format: RasterFormat,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },

    /// The file extension does not name a supported format.
    #[error("unsupported output format '{0}' (expected png, jpg, jpeg or bmp)")]
    UnsupportedFormat(String),
}

/// Supported output raster formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RasterFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Baseline JPEG at quality 90.
    Jpeg,
    /// Uncompressed BMP.
    Bmp,
}

impl RasterFormat {
    /// JPEG quality used for overlays.
    pub const JPEG_QUALITY: u8 = 90;

    /// Pick a format from a file extension (case-insensitive, no dot).
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnsupportedFormat`] for anything else.
    pub fn from_extension(extension: &str) -> Result<Self, ExportError> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => f.write_str("PNG"),
            Self::Jpeg => f.write_str("JPEG"),
            Self::Bmp => f.write_str("BMP"),
        }
    }
}

/// Encode an RGB image in the requested format.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn encode_rgb(image: &RgbImage, format: RasterFormat) -> Result<Vec<u8>, ExportError> {
    encode(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
        format,
    )
}

/// Encode a mask as an 8-bit grayscale image (0 = background,
/// 255 = vegetation).
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn encode_mask(mask: &Mask, format: RasterFormat) -> Result<Vec<u8>, ExportError> {
    let gray = mask.as_gray();
    encode(
        gray.as_raw(),
        gray.width(),
        gray.height(),
        ExtendedColorType::L8,
        format,
    )
}

fn encode(
    buf: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
    format: RasterFormat,
) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    let result = match format {
        RasterFormat::Png => {
            image::codecs::png::PngEncoder::new(&mut out).write_image(buf, width, height, color)
        }
        RasterFormat::Jpeg => image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut out,
            RasterFormat::JPEG_QUALITY,
        )
        .write_image(buf, width, height, color),
        RasterFormat::Bmp => image::codecs::bmp::BmpEncoder::new(&mut out)
            .write_image(buf, width, height, color),
    };
    result.map_err(|source| ExportError::Encode { format, source })?;
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn png_round_trips_pixels() {
        let img = RgbImage::from_fn(5, 3, |x, y| {
            Rgb([u8::try_from(x * 40).unwrap(), 0, u8::try_from(y).unwrap()])
        });
        let bytes = encode_rgb(&img, RasterFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn mask_png_is_grayscale() {
        let mask = Mask::from_fn(4, 4, |x, _| x < 2);
        let bytes = encode_mask(&mask, RasterFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        let gray = decoded.to_luma8();
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
        assert_eq!(gray.get_pixel(3, 0).0[0], 0);
    }

    #[test]
    fn jpeg_and_bmp_decode_with_same_dimensions() {
        let img = RgbImage::from_pixel(8, 6, Rgb([0, 255, 0]));
        for format in [RasterFormat::Jpeg, RasterFormat::Bmp] {
            let bytes = encode_rgb(&img, format).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (8, 6), "{format}");
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(RasterFormat::from_extension("PNG").unwrap(), RasterFormat::Png);
        assert_eq!(RasterFormat::from_extension("jpeg").unwrap(), RasterFormat::Jpeg);
        assert_eq!(RasterFormat::from_extension("jpg").unwrap(), RasterFormat::Jpeg);
        assert_eq!(RasterFormat::from_extension("bmp").unwrap(), RasterFormat::Bmp);
        assert!(matches!(
            RasterFormat::from_extension("tiff"),
            Err(ExportError::UnsupportedFormat(ext)) if ext == "tiff"
        ));
    }
}
