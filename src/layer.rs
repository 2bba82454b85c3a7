use crate::activation::ActivationType;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Spread of the normal distribution bias vectors start from
const BIAS_INIT_STD_DEV: f32 = 0.01;

/// One stage of a feed-forward topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    /// `x · W` with `W` shaped (inputs × outputs)
    Affine { weights: Array2<f32> },
    /// `x + b`, broadcast over every example in the batch
    Bias { bias: Array1<f32> },
    Activation(ActivationType),
}

/// Gradient of a trainable stage, shaped like its parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Gradient {
    Weights(Array2<f32>),
    Bias(Array1<f32>),
}

impl Layer {
    /// Constructs an affine stage with randomized weights
    ///
    /// # Arguments
    ///
    /// * `inputs` - Width of the incoming activations
    /// * `outputs` - Width this stage produces
    pub fn affine(inputs: usize, outputs: usize) -> Self {
        // Assume He normalization, the hidden stages feed rectifiers
        let std_dev = (2.0 / inputs as f32).sqrt();
        let mut rng = rand::rng();
        let weights = Array2::from_shape_fn((inputs, outputs), |_| {
            let z: f32 = rng.sample(StandardNormal);
            z * std_dev
        });

        Layer::Affine { weights }
    }

    /// Constructs a bias stage with small randomized offsets
    pub fn bias(size: usize) -> Self {
        let mut rng = rand::rng();
        let bias = Array1::from_shape_fn(size, |_| {
            let z: f32 = rng.sample(StandardNormal);
            z * BIAS_INIT_STD_DEV
        });

        Layer::Bias { bias }
    }

    pub fn relu() -> Self {
        Layer::Activation(ActivationType::ReLU)
    }

    pub fn softmax() -> Self {
        Layer::Activation(ActivationType::Softmax)
    }

    /// Width this stage produces given the width it receives
    pub fn output_width(&self, input_width: usize) -> usize {
        match self {
            Layer::Affine { weights } => weights.ncols(),
            Layer::Bias { .. } | Layer::Activation(_) => input_width,
        }
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            Layer::Affine { weights } => weights.len(),
            Layer::Bias { bias } => bias.len(),
            Layer::Activation(_) => 0,
        }
    }

    /// Forward propagation of a batch (one example per row)
    pub fn forward(&self, input: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Layer::Affine { weights } => {
                assert_eq!(input.ncols(), weights.nrows(), "Input size does not match layer's input size");
                input.dot(weights)
            }
            Layer::Bias { bias } => {
                assert_eq!(input.ncols(), bias.len(), "Input size does not match layer's input size");
                &input + bias
            }
            Layer::Activation(activation) => activation.forward(input),
        }
    }

    /// Back propagation of a batch
    ///
    /// Returns the gradient for the previous stage and, for trainable stages,
    /// the gradient of this stage's own parameter.
    pub fn backward(
        &self,
        input: ArrayView2<f32>,
        output: ArrayView2<f32>,
        grad_output: ArrayView2<f32>,
    ) -> (Array2<f32>, Option<Gradient>) {
        match self {
            Layer::Affine { weights } => {
                let weight_grads = input.t().dot(&grad_output);
                (grad_output.dot(&weights.t()), Some(Gradient::Weights(weight_grads)))
            }
            Layer::Bias { .. } => {
                let bias_grads = grad_output.sum_axis(Axis(0));
                (grad_output.to_owned(), Some(Gradient::Bias(bias_grads)))
            }
            Layer::Activation(activation) => (activation.backward(input, output, grad_output), None),
        }
    }

    /// Moves the parameter against its gradient
    pub fn apply_gradient(&mut self, gradient: &Gradient, learning_rate: f32) {
        match (self, gradient) {
            (Layer::Affine { weights }, Gradient::Weights(grads)) => {
                weights.scaled_add(-learning_rate, grads);
            }
            (Layer::Bias { bias }, Gradient::Bias(grads)) => {
                bias.scaled_add(-learning_rate, grads);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_affine_backward_shapes() {
        let layer = Layer::affine(3, 2);
        let input = array![[1.0, 2.0, 3.0], [0.0, 1.0, 0.0]];
        let output = layer.forward(input.view());
        assert_eq!(output.dim(), (2, 2));

        let (grad_input, grad) = layer.backward(input.view(), output.view(), Array2::ones((2, 2)).view());
        assert_eq!(grad_input.dim(), (2, 3));
        match grad {
            Some(Gradient::Weights(w)) => assert_eq!(w.dim(), (3, 2)),
            other => panic!("unexpected gradient {:?}", other),
        }
    }

    #[test]
    fn test_bias_gradient_sums_over_batch() {
        let layer = Layer::Bias { bias: array![0.0, 0.0] };
        let input = array![[1.0, 1.0], [2.0, 2.0]];
        let output = layer.forward(input.view());
        let (_, grad) = layer.backward(input.view(), output.view(), array![[1.0, 2.0], [3.0, 4.0]].view());

        assert_eq!(grad, Some(Gradient::Bias(array![4.0, 6.0])));
    }

    #[test]
    fn test_apply_gradient() {
        let mut layer = Layer::Bias { bias: array![1.0, 1.0] };
        layer.apply_gradient(&Gradient::Bias(array![1.0, -1.0]), 0.5);

        assert_eq!(layer, Layer::Bias { bias: array![0.5, 1.5] });
    }
}
