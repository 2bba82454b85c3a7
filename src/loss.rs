use ndarray::{Array2, ArrayView2, Zip};

/// Probabilities are clamped to this floor when computing gradients
const PROBABILITY_FLOOR: f32 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loss {
    CrossEntropyLoss,
}

impl Loss {
    /// Mean loss over the batch.
    ///
    /// Only target entries greater than zero contribute, so a prediction that
    /// assigns zero probability to the target class yields positive infinity.
    pub fn calculate(&self, prediction: ArrayView2<f32>, target: ArrayView2<f32>) -> f32 {
        match self {
            Loss::CrossEntropyLoss => {
                let examples = prediction.nrows().max(1) as f32;
                let total = Zip::from(&prediction)
                    .and(&target)
                    .fold(0.0f32, |acc, &p, &t| if t > 0.0 { acc - t * p.ln() } else { acc });
                total / examples
            }
        }
    }

    /// Gradient of the mean loss with respect to the prediction
    pub fn gradient(&self, prediction: ArrayView2<f32>, target: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Loss::CrossEntropyLoss => {
                let examples = prediction.nrows().max(1) as f32;
                Zip::from(&prediction)
                    .and(&target)
                    .map_collect(|&p, &t| -t / (p.max(PROBABILITY_FLOOR) * examples))
            }
        }
    }
}
