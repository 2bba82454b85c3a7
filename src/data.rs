use ndarray::{Array2, ArrayView2, Axis};
use ndarray::iter::AxisChunksIter;

use crate::error::{Error, Result};

/// Examples and their one-hot targets, one example per row
#[derive(Debug, Clone)]
pub struct Dataset {
    pub inputs: Array2<f32>,
    pub targets: Array2<f32>,
}

impl Dataset {
    pub fn new(inputs: Array2<f32>, targets: Array2<f32>) -> Result<Self> {
        if inputs.nrows() != targets.nrows() {
            return Err(Error::Dataset(format!(
                "{} examples but {} targets",
                inputs.nrows(),
                targets.nrows()
            )));
        }
        Ok(Dataset { inputs, targets })
    }

    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One epoch's worth of mini-batches; call again to restart
    pub fn batches(&self, batch_size: usize) -> MiniBatches<'_> {
        let size = batch_size.max(1);
        MiniBatches {
            inputs: self.inputs.axis_chunks_iter(Axis(0), size),
            targets: self.targets.axis_chunks_iter(Axis(0), size),
            index: 0,
        }
    }
}

/// Lazy sequence of `(inputs, targets, batch_index)` covering a dataset once
pub struct MiniBatches<'a> {
    inputs: AxisChunksIter<'a, f32, ndarray::Ix2>,
    targets: AxisChunksIter<'a, f32, ndarray::Ix2>,
    index: usize,
}

impl<'a> Iterator for MiniBatches<'a> {
    type Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let inputs = self.inputs.next()?;
        let targets = self.targets.next()?;
        let index = self.index;
        self.index += 1;
        Some((inputs, targets, index))
    }
}

/// Encodes class labels as rows with a single 1.0 in the label's column
pub fn one_hot(labels: &[u8], classes: usize) -> Result<Array2<f32>> {
    let mut hot = Array2::zeros((labels.len(), classes));
    for (row, &label) in labels.iter().enumerate() {
        let label = label as usize;
        if label >= classes {
            return Err(Error::Dataset(format!("label {} outside {} classes", label, classes)));
        }
        hot[[row, label]] = 1.0;
    }
    Ok(hot)
}

/// Column index of the largest value in each row
pub fn argmax_rows(values: ArrayView2<f32>) -> Vec<usize> {
    values
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
                .0
        })
        .collect()
}
