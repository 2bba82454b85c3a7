use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, CANVAS_SIZE};

/// Constants of the photograph-to-sample pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Gaussian sigma, equivalent to an 11×11 kernel
    pub blur_sigma: f32,
    pub contrast_gain: f32,
    pub contrast_offset: f32,
    /// Inverted intensities strictly above this become ink
    pub threshold: u8,
    pub canny_low: f32,
    pub canny_high: f32,
    pub dilation: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            blur_sigma: 2.0,
            contrast_gain: 1.9,
            contrast_offset: 255.0,
            threshold: 180,
            canny_low: 50.0,
            canny_high: 255.0,
            dilation: 1,
        }
    }
}

/// Axis-aligned box around a detected region, in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    fn enclosing(contour: &Contour<u32>) -> Option<Self> {
        let first = contour.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &contour.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

/// A candidate digit: where it was found and its binary crop
#[derive(Debug, Clone)]
pub struct Region {
    pub bounds: BoundingBox,
    pub roi: GrayImage,
}

/// A region normalized into a 28×28 grid of intensities in [0, 1]
#[derive(Debug, Clone)]
pub struct Sample {
    pub bounds: BoundingBox,
    pub grid: Array2<f32>,
}

impl Sample {
    /// Single-row batch ready for inference
    pub fn flatten(&self) -> Array2<f32> {
        Array1::from_iter(self.grid.iter().copied()).insert_axis(Axis(0))
    }
}

/// Result of running a photograph through the pipeline
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Ink-vs-background image the regions were cropped from
    pub binary: GrayImage,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    pub config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Preprocessor { config }
    }

    /// Grayscale, blur, stretch contrast, invert and threshold
    pub fn binarize(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);

        let mut binary = GrayImage::new(blurred.width(), blurred.height());
        for (x, y, pixel) in blurred.enumerate_pixels() {
            let stretched = (pixel[0] as f32 * self.config.contrast_gain - self.config.contrast_offset)
                .clamp(0.0, 255.0) as u8;
            let inverted = 255 - stretched;
            let ink = if inverted > self.config.threshold { 255 } else { 0 };
            binary.put_pixel(x, y, Luma([ink]));
        }
        binary
    }

    /// Crops every external contour of the binary image's edges.
    /// Nested or overlapping regions are not merged.
    pub fn regions(&self, binary: &GrayImage) -> Vec<Region> {
        let edges = canny(binary, self.config.canny_low, self.config.canny_high);

        find_contours::<u32>(&edges)
            .iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
            .filter_map(BoundingBox::enclosing)
            .map(|bounds| {
                let roi = image::imageops::crop_imm(binary, bounds.x, bounds.y, bounds.width, bounds.height)
                    .to_image();
                Region { bounds, roi }
            })
            .collect()
    }

    /// Turns a region into a normalized sample
    pub fn sample(&self, region: &Region) -> Sample {
        let normalized = normalize(&region.roi, self.config.dilation);
        let grid = Array2::from_shape_fn((CANVAS_SIZE as usize, CANVAS_SIZE as usize), |(row, col)| {
            normalized.get_pixel(col as u32, row as u32)[0] as f32 / 255.0
        });

        Sample {
            bounds: region.bounds,
            grid,
        }
    }

    /// Full pipeline: zero or more samples per photograph
    pub fn extract(&self, image: &DynamicImage) -> Extraction {
        let binary = self.binarize(image);
        let regions = self.regions(&binary);
        debug!("found {} candidate regions", regions.len());

        let samples = regions
            .iter()
            .map(|region| {
                debug!("region {:?}", region.bounds);
                self.sample(region)
            })
            .collect();

        Extraction { binary, samples }
    }
}
