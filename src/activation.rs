use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Enum representing the activation stages a topology can contain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationType {
    ReLU,
    Softmax,
}

impl ActivationType {
    /// Applies the activation row by row (one row per example)
    pub fn forward(&self, z: ArrayView2<f32>) -> Array2<f32> {
        match self {
            ActivationType::ReLU => z.mapv(|x| x.max(0.0)),
            ActivationType::Softmax => {
                let mut out = z.to_owned();
                for mut row in out.axis_iter_mut(Axis(0)) {
                    // Shift by the row max so exp never overflows
                    let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
                    row.mapv_inplace(|x| (x - max).exp());
                    let sum = row.sum();
                    row.mapv_inplace(|x| x / sum);
                }
                out
            }
        }
    }

    /// Gradient with respect to the activation input.
    ///
    /// # Arguments
    ///
    /// * `input` - What was fed into the activation on the forward pass
    /// * `output` - What the activation produced on the forward pass
    /// * `grad_output` - Gradient flowing back from the next stage
    pub fn backward(
        &self,
        input: ArrayView2<f32>,
        output: ArrayView2<f32>,
        grad_output: ArrayView2<f32>,
    ) -> Array2<f32> {
        match self {
            ActivationType::ReLU => {
                let mask = input.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 });
                &grad_output * &mask
            }
            ActivationType::Softmax => {
                // Jacobian-vector product: p * (g - <g, p>)
                let dot = (&grad_output * &output).sum_axis(Axis(1)).insert_axis(Axis(1));
                &output * &(&grad_output - &dot)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_relu() {
        let z = array![[-1.0, 2.0, 0.0]];
        assert_eq!(ActivationType::ReLU.forward(z.view()), array![[0.0, 2.0, 0.0]]);

        let grad = ActivationType::ReLU.backward(z.view(), z.view(), array![[1.0, 1.0, 1.0]].view());
        assert_eq!(grad, array![[0.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let z = array![[1.0, 2.0, 3.0], [1000.0, 1000.0, 1000.0]];
        let p = ActivationType::Softmax.forward(z.view());

        for row in p.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
        assert!((p[[1, 0]] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_backward_of_constant_gradient_is_zero() {
        let z = array![[0.5, -0.5, 2.0]];
        let p = ActivationType::Softmax.forward(z.view());
        let grad = ActivationType::Softmax.backward(z.view(), p.view(), array![[1.0, 1.0, 1.0]].view());

        assert!(grad.iter().all(|g| g.abs() < 1e-6));
    }
}
