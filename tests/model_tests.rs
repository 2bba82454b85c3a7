use std::env;
use std::fs;

use digits::{
    ActivationType, DenseBuilder, Layer, Loss, ModelBuilder, Network, Optimizer, Topology, Trainable,
    INPUT_WIDTH, OUTPUT_WIDTH,
};
use ndarray::Array2;

fn stage_names(topology: &Topology) -> Vec<String> {
    topology
        .layers
        .iter()
        .map(|layer| match layer {
            Layer::Affine { weights } => format!("affine {}->{}", weights.nrows(), weights.ncols()),
            Layer::Bias { bias } => format!("bias {}", bias.len()),
            Layer::Activation(ActivationType::ReLU) => "relu".to_string(),
            Layer::Activation(ActivationType::Softmax) => "softmax".to_string(),
        })
        .collect()
}

/// Two examples with disjoint active pixels and different classes
fn toy_batch() -> (Array2<f32>, Array2<f32>) {
    let mut inputs = Array2::zeros((2, INPUT_WIDTH));
    let mut targets = Array2::zeros((2, OUTPUT_WIDTH));
    for i in 0..100 {
        inputs[[0, i]] = 1.0;
        inputs[[1, INPUT_WIDTH - 1 - i]] = 1.0;
    }
    targets[[0, 3]] = 1.0;
    targets[[1, 7]] = 1.0;
    (inputs, targets)
}

#[test]
fn test_single_hidden_layer_topology() {
    let topology = Topology::for_hidden_layers(&[128]).unwrap();

    assert_eq!(
        stage_names(&topology),
        vec!["affine 784->128", "bias 128", "relu", "affine 128->10", "bias 10", "softmax"]
    );
}

#[test]
fn test_two_hidden_layer_topology() {
    let topology = Topology::for_hidden_layers(&[64, 32]).unwrap();

    assert_eq!(topology.layers.len(), 9);
    assert_eq!(
        stage_names(&topology),
        vec![
            "affine 784->64",
            "bias 64",
            "relu",
            "affine 64->32",
            "bias 32",
            "relu",
            "affine 32->10",
            "bias 10",
            "softmax"
        ]
    );
    assert_eq!(topology.input_width(), Some(INPUT_WIDTH));
    assert_eq!(topology.output_width(), Some(OUTPUT_WIDTH));
}

#[test]
fn test_empty_or_zero_width_layers_rejected() {
    assert!(Topology::for_hidden_layers(&[]).is_err());
    assert!(Topology::for_hidden_layers(&[16, 0]).is_err());
    assert!(DenseBuilder.build(&[]).is_err());
}

#[test]
fn test_parameter_count_accuracy() {
    // (784*4 + 4) + (4*10 + 10)
    let topology = Topology::for_hidden_layers(&[4]).unwrap();
    assert_eq!(topology.parameter_count(), 784 * 4 + 4 + 4 * 10 + 10);
}

#[test]
fn test_inference() {
    let topology = Topology::for_hidden_layers(&[8]).unwrap();
    let (inputs, _) = toy_batch();
    let output = topology.predict(inputs.view());

    assert_eq!(output.dim(), (2, OUTPUT_WIDTH));
    for row in output.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_training_reduces_loss() {
    let mut model = Network::new(Topology::for_hidden_layers(&[16]).unwrap(), Loss::CrossEntropyLoss);
    let optimizer = Optimizer::new(0.1);
    let (inputs, targets) = toy_batch();

    let initial = model.forward(inputs.view(), targets.view());
    for _ in 0..50 {
        model.forward(inputs.view(), targets.view());
        model.backward();
        optimizer.step(&mut model);
    }
    let trained = model.forward(inputs.view(), targets.view());

    assert!(initial.is_finite() && trained.is_finite());
    assert!(trained >= 0.0);
    assert!(trained < initial, "loss went from {} to {}", initial, trained);
}

#[test]
fn test_predictions_are_head_output() {
    let mut model = DenseBuilder.build(&[8]).unwrap();
    assert!(model.predictions().is_none());

    let (inputs, targets) = toy_batch();
    model.forward(inputs.view(), targets.view());
    let predictions = model.predictions().unwrap().clone();

    assert_eq!(predictions, model.predict(inputs.view()));
}

#[test]
fn test_snapshot_is_independent_of_live_model() {
    let mut model = DenseBuilder.build(&[8]).unwrap();
    let snapshot = model.snapshot();
    let (inputs, targets) = toy_batch();

    model.forward(inputs.view(), targets.view());
    model.backward();
    Optimizer::new(0.5).step(&mut model);

    assert_ne!(model.topology, snapshot);
    assert_eq!(snapshot.layers.len(), 6);
}

#[test]
fn test_save_and_load() {
    let topology = Topology::for_hidden_layers(&[5]).unwrap();
    let path = env::temp_dir().join(format!("digits-model-test-{}.model.gz", std::process::id()));

    topology.save(&path).unwrap();
    let loaded = Topology::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(loaded, topology);
}
