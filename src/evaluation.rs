use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use log::info;
use ndarray::ArrayView2;

use crate::data::argmax_rows;
use crate::error::Result;
use crate::preprocess::{BoundingBox, Preprocessor};
use crate::topology::Topology;

/// Width of the box drawn around each region
const BOX_THICKNESS: i32 = 4;

/// Segments lit per digit, bit 0 = top through bit 6 = middle (a..g)
const SEGMENTS: [u8; 10] = [
    0b011_1111, 0b000_0110, 0b101_1011, 0b100_1111, 0b110_0110,
    0b110_1101, 0b111_1101, 0b000_0111, 0b111_1111, 0b110_1111,
];

/// Fraction of examples whose predicted class matches the one-hot target, in [0, 1]
pub fn evaluate_on_labeled_set(model: &Topology, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
    if inputs.nrows() == 0 {
        return 0.0;
    }
    let predicted = argmax_rows(model.predict(inputs).view());
    let expected = argmax_rows(targets);
    let hits = predicted.iter().zip(&expected).filter(|(p, e)| p == e).count();

    hits as f32 / expected.len() as f32
}

/// Predictions for one photograph plus the annotated image for inspection
#[derive(Debug, Clone)]
pub struct CustomPrediction {
    pub path: PathBuf,
    pub regions: Vec<(BoundingBox, usize)>,
    pub annotated: RgbImage,
}

/// Runs every photograph through the preprocessing pipeline and the model.
///
/// When `out_dir` is given, it is created if needed and each annotated
/// image is written there as `{stem}.annotated.png`.
pub fn evaluate_on_custom_images<P: AsRef<Path>>(
    model: &Topology,
    paths: &[P],
    preprocessor: &Preprocessor,
    out_dir: Option<&Path>,
) -> Result<Vec<CustomPrediction>> {
    let mut results = Vec::with_capacity(paths.len());
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)?;
    }

    for path in paths {
        let path = path.as_ref();
        let photo = image::open(path)?;
        let extraction = preprocessor.extract(&photo);
        let mut annotated = image::DynamicImage::ImageLuma8(extraction.binary).to_rgb8();

        let mut regions = Vec::with_capacity(extraction.samples.len());
        for sample in &extraction.samples {
            let output = model.predict(sample.flatten().view());
            let digit = argmax_rows(output.view()).first().copied().unwrap_or(0);

            let color = Rgb([fastrand::u8(..), fastrand::u8(..), fastrand::u8(..)]);
            annotate(&mut annotated, &sample.bounds, digit, color);
            regions.push((sample.bounds, digit));
        }

        info!(
            "{}: {:?}",
            path.display(),
            regions.iter().map(|(_, digit)| *digit).collect::<Vec<_>>()
        );

        if let Some(dir) = out_dir {
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            annotated.save(dir.join(format!("{}.annotated.png", stem)))?;
        }

        results.push(CustomPrediction {
            path: path.to_path_buf(),
            regions,
            annotated,
        });
    }

    Ok(results)
}

/// Folder under `out` holding one model's annotated images, named after the
/// model file without its `.model.gz` suffix
pub fn annotation_dir(out: &Path, model_path: &Path) -> PathBuf {
    let name = model_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let stem = name.strip_suffix(".model.gz").unwrap_or(&name);
    out.join(stem)
}

/// Draws a box around the region and the predicted digit at its centre
pub fn annotate(canvas: &mut RgbImage, bounds: &BoundingBox, digit: usize, color: Rgb<u8>) {
    let (x, y) = (bounds.x as i32, bounds.y as i32);
    for i in 0..BOX_THICKNESS {
        let rect = Rect::at(x - i, y - i).of_size(bounds.width + 2 * i as u32, bounds.height + 2 * i as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }

    let height = (bounds.height as f32 / 3.0).max(12.0);
    let width = height / 2.0;
    let left = bounds.x as f32 + bounds.width as f32 / 2.0 - width / 2.0;
    let top = bounds.y as f32 + bounds.height as f32 / 2.0 - height / 2.0;
    draw_digit(canvas, digit, (left, top), (width, height), color);
}

fn draw_digit(canvas: &mut RgbImage, digit: usize, origin: (f32, f32), size: (f32, f32), color: Rgb<u8>) {
    let Some(&mask) = SEGMENTS.get(digit) else {
        return;
    };
    let (left, top) = origin;
    let (w, h) = size;
    let (right, middle, bottom) = (left + w, top + h / 2.0, top + h);

    let segments = [
        ((left, top), (right, top)),
        ((right, top), (right, middle)),
        ((right, middle), (right, bottom)),
        ((left, bottom), (right, bottom)),
        ((left, middle), (left, bottom)),
        ((left, top), (left, middle)),
        ((left, middle), (right, middle)),
    ];

    for (bit, (start, end)) in segments.iter().enumerate() {
        if mask & (1 << bit) == 0 {
            continue;
        }
        for offset in [0.0, 1.0] {
            draw_line_segment_mut(canvas, (start.0 + offset, start.1 + offset), (end.0 + offset, end.1 + offset), color);
        }
    }
}
