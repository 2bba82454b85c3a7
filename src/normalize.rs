//! MNIST-style canonicalization of a binary digit crop.

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::geometric_transformations::translate;
use imageproc::morphology::dilate;

/// Side of the normalized canvas
pub const CANVAS_SIZE: u32 = 28;
/// Side of the box the digit is fitted into before framing
pub const DIGIT_SIZE: u32 = 20;
/// Frame added around the fitted digit on every side
pub const MARGIN: u32 = (CANVAS_SIZE - DIGIT_SIZE) / 2;

/// Split of `diff` padding pixels between the two sides of the narrower
/// dimension: evenly when `diff` is even, all on the leading side otherwise.
pub fn padding_split(diff: u32) -> (u32, u32) {
    if diff % 2 == 0 {
        (diff / 2, diff / 2)
    } else {
        (diff, 0)
    }
}

/// Copies `image` onto a zeroed canvas grown by the given borders
pub fn pad(image: &GrayImage, top: u32, bottom: u32, left: u32, right: u32) -> GrayImage {
    let mut canvas = GrayImage::new(image.width() + left + right, image.height() + top + bottom);
    imageops::replace(&mut canvas, image, left as i64, top as i64);
    canvas
}

/// Pads the narrower dimension so the image becomes square
pub fn pad_to_square(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let (leading, trailing) = padding_split(width.abs_diff(height));

    if width < height {
        pad(image, 0, 0, leading, trailing)
    } else if width > height {
        pad(image, leading, trailing, 0, 0)
    } else {
        image.clone()
    }
}

/// Intensity-weighted centroid `(x, y)`; the origin when the image is blank
pub fn center_of_mass(image: &GrayImage) -> (f64, f64) {
    let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = pixel[0] as f64;
        m00 += value;
        m10 += x as f64 * value;
        m01 += y as f64 * value;
    }

    if m00 == 0.0 {
        (0.0, 0.0)
    } else {
        (m10 / m00, m01 / m00)
    }
}

/// Translates the image so its centroid lands on the canvas centre
pub fn center_by_mass(image: &GrayImage) -> GrayImage {
    let (cx, cy) = center_of_mass(image);
    let shift_x = (image.width() as f64 / 2.0 - cx).round() as i32;
    let shift_y = (image.height() as f64 / 2.0 - cy).round() as i32;

    translate(image, (shift_x, shift_y))
}

/// Normalizes a binary region into a 28×28 digit centred by mass.
///
/// # Arguments
///
/// * `roi` - Binary crop of a candidate digit, any size
/// * `dilation` - Radius of the square structuring element used to thicken strokes
pub fn normalize(roi: &GrayImage, dilation: u8) -> GrayImage {
    let thick = dilate(roi, Norm::LInf, dilation);
    let square = pad_to_square(&thick);
    let fitted = imageops::resize(&square, DIGIT_SIZE, DIGIT_SIZE, FilterType::Triangle);
    let framed = pad(&fitted, MARGIN, MARGIN, MARGIN, MARGIN);
    let centered = center_by_mass(&framed);

    // Resampling softens strokes
    dilate(&centered, Norm::LInf, dilation)
}
