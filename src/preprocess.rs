//! Image preprocessing for the detector.
//!
//! Letterboxes the input to the model's square input size, preserving aspect
//! ratio, and records the scale and padding offsets so detected boxes can be
//! mapped back to original pixel coordinates.

use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{IntoImageView, Resizer};
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array;

#[derive(Debug, Clone, Copy)]
pub struct PreprocessConfig {
    /// Square model input size in pixels.
    pub size: u32,
    /// Grey value used for the letterbox padding.
    pub pad_value: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            size: 640,
            pad_value: 114,
        }
    }
}

/// Parameters of one letterbox pass, needed to invert it.
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

#[derive(Debug)]
pub struct Processor {
    config: PreprocessConfig,
}

impl Processor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn size(&self) -> u32 {
        self.config.size
    }

    /// Letterbox the image into an NCHW float tensor in [0, 1].
    ///
    /// The resized image is centered on a grey canvas; the returned
    /// [`Letterbox`] carries the scale and offsets of that placement.
    pub fn preprocess(
        &self,
        image: &DynamicImage,
    ) -> Result<(Array<f32, ndarray::IxDyn>, Letterbox)> {
        let size = self.config.size;
        let (orig_w, orig_h) = (image.width(), image.height());
        let scale = (size as f32 / orig_w as f32).min(size as f32 / orig_h as f32);
        let new_w = ((orig_w as f32 * scale) as u32).clamp(1, size);
        let new_h = ((orig_h as f32 * scale) as u32).clamp(1, size);

        let src = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut dst = Image::new(
            new_w,
            new_h,
            src.pixel_type().context("unsupported pixel format")?,
        );
        let mut resizer = Resizer::new();
        let resize_options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Convolution(fast_image_resize::FilterType::Bilinear),
        );
        resizer
            .resize(&src, &mut dst, Some(&resize_options))
            .context("failed to resize image")?;
        let resized = RgbImage::from_raw(new_w, new_h, dst.buffer().to_vec())
            .context("resized buffer has unexpected layout")?;

        let pad = self.config.pad_value;
        let mut padded = RgbImage::from_pixel(size, size, Rgb([pad, pad, pad]));
        let pad_x = (size - new_w) / 2;
        let pad_y = (size - new_h) / 2;
        image::imageops::overlay(&mut padded, &resized, i64::from(pad_x), i64::from(pad_y));

        let mut tensor = Array::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in padded.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            tensor[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
            tensor[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
            tensor[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
        }

        Ok((
            tensor.into_dyn(),
            Letterbox {
                scale,
                pad_x: pad_x as f32,
                pad_y: pad_y as f32,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_padded_vertically() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1280, 640, Rgb([200, 0, 0])));
        let processor = Processor::new(PreprocessConfig::default());
        let (tensor, letterbox) = processor.preprocess(&img).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert!((letterbox.scale - 0.5).abs() < 1e-6);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 160.0);

        // Top rows are letterbox padding, the middle holds image content.
        let pad_grey = 114.0 / 255.0;
        assert!((tensor[[0, 0, 0, 0]] - pad_grey).abs() < 1e-6);
        assert!(tensor[[0, 0, 320, 320]] > 0.5);
    }

    #[test]
    fn square_image_fills_the_canvas() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 320, Rgb([0, 255, 0])));
        let processor = Processor::new(PreprocessConfig::default());
        let (_, letterbox) = processor.preprocess(&img).unwrap();

        assert!((letterbox.scale - 2.0).abs() < 1e-6);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 0.0);
    }

    #[test]
    fn values_are_normalized_to_unit_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([255, 128, 0])));
        let processor = Processor::new(PreprocessConfig {
            size: 64,
            ..PreprocessConfig::default()
        });
        let (tensor, _) = processor.preprocess(&img).unwrap();
        for &v in tensor.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
