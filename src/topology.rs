use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layer::Layer;

/// Flattened 28×28 digit image
pub const INPUT_WIDTH: usize = 28 * 28;
/// One class per digit
pub const OUTPUT_WIDTH: usize = 10;

/// Ordered stack of stages making up a classifier.
///
/// The loss node is never part of a topology; it belongs to the training
/// wrapper, so a topology is always ready for inference or persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub layers: Vec<Layer>,
}

impl Topology {
    pub fn new(layers: Vec<Layer>) -> Self {
        Topology { layers }
    }

    /// Builds `affine → bias → relu` per hidden width followed by an
    /// `affine → bias → softmax` classification head.
    ///
    /// # Arguments
    ///
    /// * `hidden` - Hidden layer widths, in order from the input side
    pub fn for_hidden_layers(hidden: &[usize]) -> Result<Self> {
        if hidden.is_empty() {
            return Err(Error::InvalidHyperparameter(
                "at least one hidden layer is required".to_string(),
            ));
        }
        if let Some(position) = hidden.iter().position(|&width| width == 0) {
            return Err(Error::InvalidHyperparameter(format!(
                "hidden layer {} has zero width",
                position
            )));
        }

        let mut layers = Vec::with_capacity(3 * (hidden.len() + 1));
        let mut previous_width = INPUT_WIDTH;

        for &width in hidden {
            layers.push(Layer::affine(previous_width, width));
            layers.push(Layer::bias(width));
            layers.push(Layer::relu());
            previous_width = width;
        }

        layers.push(Layer::affine(previous_width, OUTPUT_WIDTH));
        layers.push(Layer::bias(OUTPUT_WIDTH));
        layers.push(Layer::softmax());

        Ok(Topology { layers })
    }

    /// Width expected by the first affine stage
    pub fn input_width(&self) -> Option<usize> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Affine { weights } => Some(weights.nrows()),
            _ => None,
        })
    }

    pub fn output_width(&self) -> Option<usize> {
        let input = self.input_width()?;
        Some(self.layers.iter().fold(input, |width, layer| layer.output_width(width)))
    }

    /// Inference over a batch, one example per row
    pub fn predict(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.forward(current.view());
        }
        current
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Writes the topology as gzip-compressed bincode
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        bincode::serialize_into(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Topology> {
        let file = File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(bincode::deserialize_from(decoder)?)
    }
}
