mod activation;
mod error;
mod layer;
mod loss;
mod model;
mod optimizer;
mod topology;
pub mod data;
pub mod evaluation;
pub mod hyperparameters;
pub mod metrics;
pub mod mnist;
pub mod normalize;
pub mod plot;
pub mod preprocess;
pub mod retention;
pub mod trainer;

pub use activation::ActivationType;
pub use data::Dataset;
pub use error::{Error, Result};
pub use evaluation::{annotation_dir, evaluate_on_custom_images, evaluate_on_labeled_set};
pub use hyperparameters::{Combination, LearningRate, Schedule, SweepConfig};
pub use layer::{Gradient, Layer};
pub use loss::Loss;
pub use metrics::{EpochMetrics, MetricsLog, MetricsRecord};
pub use model::{DenseBuilder, ModelBuilder, Network, Trainable};
pub use optimizer::Optimizer;
pub use preprocess::{PreprocessConfig, Preprocessor, Sample};
pub use retention::{BestEntry, BestModels};
pub use topology::{Topology, INPUT_WIDTH, OUTPUT_WIDTH};
pub use trainer::{RunOutcome, SweepReport, SweepTrainer};
