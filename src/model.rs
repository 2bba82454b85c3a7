use ndarray::{Array2, ArrayView2};

use crate::error::Result;
use crate::layer::Gradient;
use crate::loss::Loss;
use crate::topology::Topology;

/// What the sweep needs from a model under training.
///
/// `forward` evaluates the loss node appended to the classifier, `backward`
/// fills gradients from the most recent `forward`, and `update` moves every
/// trainable parameter against its gradient.
pub trait Trainable {
    fn forward(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32;
    fn backward(&mut self);
    fn update(&mut self, learning_rate: f32);

    /// Output of the stage preceding the loss node on the most recent forward pass
    fn predictions(&self) -> Option<&Array2<f32>>;

    /// Deep copy of the classifier, loss node excluded
    fn snapshot(&self) -> Topology;
}

/// Constructs a fresh, independently initialized model per combination
pub trait ModelBuilder {
    type Model: Trainable;

    fn build(&self, hidden: &[usize]) -> Result<Self::Model>;
}

/// Builds dense `Network`s through `Topology::for_hidden_layers`
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseBuilder;

impl ModelBuilder for DenseBuilder {
    type Model = Network;

    fn build(&self, hidden: &[usize]) -> Result<Network> {
        Ok(Network::new(Topology::for_hidden_layers(hidden)?, Loss::CrossEntropyLoss))
    }
}

/// Feed-forward classifier with a loss node attached for training
#[derive(Debug, Clone)]
pub struct Network {
    pub topology: Topology,
    pub loss: Loss,
    // activations[0] is the input, activations[i + 1] the output of layer i
    activations: Vec<Array2<f32>>,
    targets: Option<Array2<f32>>,
    gradients: Vec<Option<Gradient>>,
}

impl Network {
    pub fn new(topology: Topology, loss: Loss) -> Self {
        let gradients = vec![None; topology.layers.len()];
        Network {
            topology,
            loss,
            activations: Vec::new(),
            targets: None,
            gradients,
        }
    }

    /// Inference only: no caches are touched
    pub fn predict(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.topology.predict(inputs)
    }

    pub fn gradients(&self) -> &[Option<Gradient>] {
        &self.gradients
    }

    pub fn zero_gradients(&mut self) {
        self.gradients.iter_mut().for_each(|g| *g = None);
    }
}

impl Trainable for Network {
    fn forward(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let mut activations = Vec::with_capacity(self.topology.layers.len() + 1);
        activations.push(inputs.to_owned());
        for layer in &self.topology.layers {
            let next = layer.forward(activations[activations.len() - 1].view());
            activations.push(next);
        }

        let loss = match activations.last() {
            Some(output) => self.loss.calculate(output.view(), targets),
            None => 0.0,
        };

        self.activations = activations;
        self.targets = Some(targets.to_owned());
        loss
    }

    fn backward(&mut self) {
        let (Some(output), Some(targets)) = (self.activations.last(), self.targets.as_ref()) else {
            return;
        };

        let mut grad = self.loss.gradient(output.view(), targets.view());
        for (i, layer) in self.topology.layers.iter().enumerate().rev() {
            let (grad_input, param_grad) =
                layer.backward(self.activations[i].view(), self.activations[i + 1].view(), grad.view());
            self.gradients[i] = param_grad;
            grad = grad_input;
        }
    }

    fn update(&mut self, learning_rate: f32) {
        for (layer, gradient) in self.topology.layers.iter_mut().zip(&self.gradients) {
            if let Some(gradient) = gradient {
                layer.apply_gradient(gradient, learning_rate);
            }
        }
    }

    fn predictions(&self) -> Option<&Array2<f32>> {
        self.activations.last().filter(|_| self.activations.len() > 1)
    }

    fn snapshot(&self) -> Topology {
        self.topology.clone()
    }
}
