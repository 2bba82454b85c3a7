use digits::{ActivationType, Layer};
use ndarray::{array, Array2};

#[test]
fn test_layer_initialization() {
    let layer = Layer::affine(
        3,  // inputs
        4,  // outputs
    );

    match &layer {
        Layer::Affine { weights } => assert_eq!(weights.dim(), (3, 4)),
        other => panic!("expected an affine layer, got {:?}", other),
    }
    assert_eq!(layer.output_width(3), 4);
    assert_eq!(layer.parameter_count(), 3 * 4);

    // Randomized, not all zero
    assert!(match &layer {
        Layer::Affine { weights } => weights.iter().any(|&w| w != 0.0),
        _ => false,
    });
}

#[test]
fn test_forward_propagate() {
    let stages = [Layer::affine(3, 2), Layer::bias(2), Layer::relu()];

    let mut output = array![[1.0, 2.0, 3.0]];
    for stage in &stages {
        output = stage.forward(output.view());
    }

    // Verify output dimensions
    assert_eq!(output.dim(), (1, 2));

    // ReLU ensures non-negative
    assert!(output.iter().all(|&v| v >= 0.0));
}

#[test]
#[should_panic(expected = "Input size does not match layer's input size")]
fn test_forward_propagate_invalid_input_size() {
    let layer = Layer::affine(3, 2);

    // Try to forward propagate with incorrect input size
    let invalid_input = array![[1.0, 2.0]];
    layer.forward(invalid_input.view());
}

#[test]
fn test_parameter_count() {
    assert_eq!(Layer::affine(3, 4).parameter_count(), 12);
    assert_eq!(Layer::bias(4).parameter_count(), 4);
    assert_eq!(Layer::softmax().parameter_count(), 0);
}

#[test]
fn test_activation_stages_keep_width() {
    let softmax = Layer::Activation(ActivationType::Softmax);
    let output = softmax.forward(Array2::zeros((2, 5)).view());

    assert_eq!(softmax.output_width(5), 5);
    assert!(output.iter().all(|&p| (p - 0.2).abs() < 1e-6));
}

#[test]
fn test_reinitialized_weights_differ() {
    let first = Layer::affine(3, 4);
    let second = Layer::affine(3, 4);

    assert_ne!(first, second, "Each construction should draw fresh weights");
}
