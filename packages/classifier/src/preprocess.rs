use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::error::ClassifyError;

/// Short side length after the initial resize.
pub const RESIZE_SHORT_SIDE: u32 = 256;
/// Side length of the square center crop fed to the network.
pub const INPUT_SIZE: u32 = 224;
/// Per-channel mean of the training set (RGB).
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel standard deviation of the training set (RGB).
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// A dense `f32` tensor in NCHW layout.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

impl InputTensor {
    /// Value at `(channel, y, x)` of the first batch item.
    pub fn at(&self, channel: usize, y: usize, x: usize) -> f32 {
        let [_, _, h, w] = self.shape;
        self.data[channel * h * w + y * w + x]
    }
}

/// Resize, center-crop and normalize an image into a `1x3x224x224` tensor.
pub fn preprocess(img: &DynamicImage) -> Result<InputTensor, ClassifyError> {
    let rgb = img.to_rgb8();
    let resized = resize_short_side(&rgb, RESIZE_SHORT_SIDE)?;
    let cropped = center_crop(&resized, INPUT_SIZE);
    Ok(to_normalized_tensor(&cropped))
}

fn resize_short_side(img: &RgbImage, short: u32) -> Result<RgbImage, ClassifyError> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(ClassifyError::EmptyImage);
    }
    let (new_w, new_h) = if w <= h {
        (short, (u64::from(short) * u64::from(h) / u64::from(w)) as u32)
    } else {
        ((u64::from(short) * u64::from(w) / u64::from(h)) as u32, short)
    };
    if (new_w, new_h) == (w, h) {
        return Ok(img.clone());
    }
    Ok(imageops::resize(img, new_w, new_h, FilterType::Triangle))
}

fn center_crop(img: &RgbImage, size: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let left = ((f64::from(w) - f64::from(size)) / 2.0).round().max(0.0) as u32;
    let top = ((f64::from(h) - f64::from(size)) / 2.0).round().max(0.0) as u32;
    imageops::crop_imm(img, left, top, size, size).to_image()
}

fn to_normalized_tensor(img: &RgbImage) -> InputTensor {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    let plane = w * h;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in img.enumerate_pixels() {
        let offset = y as usize * w + x as usize;
        for c in 0..3 {
            let value = f32::from(pixel[c]) / 255.0;
            data[c * plane + offset] = (value - MEAN[c]) / STD[c];
        }
    }

    InputTensor {
        shape: [1, 3, h, w],
        data,
    }
}
