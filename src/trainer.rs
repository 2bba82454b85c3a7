use log::{info, warn};

use crate::data::{argmax_rows, Dataset};
use crate::error::{Error, Result};
use crate::hyperparameters::{Combination, SweepConfig};
use crate::metrics::{EpochMetrics, MetricsLog};
use crate::model::{DenseBuilder, ModelBuilder, Trainable};
use crate::optimizer::Optimizer;
use crate::retention::{BestEntry, BestModels};
use crate::topology::{INPUT_WIDTH, OUTPUT_WIDTH};

/// How training a single combination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Training loss went non-finite; `batch` is zero-based
    Diverged { epoch: usize, batch: usize },
}

/// Everything a sweep produces
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub metrics: MetricsLog,
    pub best: BestModels,
    /// One outcome per combination, in sweep order
    pub outcomes: Vec<(String, RunOutcome)>,
}

/// Trains one model per hyperparameter combination and keeps the best few
pub struct SweepTrainer<B: ModelBuilder = DenseBuilder> {
    config: SweepConfig,
    builder: B,
}

impl SweepTrainer<DenseBuilder> {
    pub fn new(config: SweepConfig) -> Self {
        SweepTrainer {
            config,
            builder: DenseBuilder,
        }
    }
}

impl<B: ModelBuilder> SweepTrainer<B> {
    pub fn with_builder(config: SweepConfig, builder: B) -> Self {
        SweepTrainer { config, builder }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Runs the whole grid. Every combination is validated before any
    /// training starts, so a malformed grid fails fast.
    pub fn run(&self, training: &Dataset, validation: &Dataset) -> Result<SweepReport> {
        let combinations = self.config.combinations()?;
        let mut metrics = MetricsLog::new();
        let mut best = BestModels::new(self.config.keep_best)?;
        let mut outcomes = Vec::with_capacity(combinations.len());

        for combination in &combinations {
            let outcome = self.train_combination(combination, training, validation, &mut metrics, &mut best)?;
            outcomes.push((combination.key(), outcome));
        }

        Ok(SweepReport {
            metrics,
            best,
            outcomes,
        })
    }

    /// Trains and validates a single combination, recording each completed
    /// epoch into `metrics` and offering it to `best`.
    pub fn train_combination(
        &self,
        combination: &Combination,
        training: &Dataset,
        validation: &Dataset,
        metrics: &mut MetricsLog,
        best: &mut BestModels,
    ) -> Result<RunOutcome> {
        if training.is_empty() {
            return Err(Error::Dataset("training set is empty".to_string()));
        }
        check_shape("training", training)?;
        check_shape("validation", validation)?;

        let key = combination.key();
        let epochs = combination.epochs();
        let validation_target = argmax_rows(validation.targets.view());

        info!("++ NEW MODEL: {} ++", key);
        metrics.begin(&key);

        // Model and optimizer live only for this combination
        let mut model = self.builder.build(combination.layers())?;
        let mut optimizer = Optimizer::new(0.0);

        for epoch in 1..=epochs {
            optimizer.learning_rate = combination.learning_rate().rate(epochs, epoch - 1);

            let mut training_loss = 0.0;
            for (inputs, targets, batch) in training.batches(combination.batch_size()) {
                training_loss = model.forward(inputs, targets);

                if !training_loss.is_finite() {
                    warn!("e: {} | batch: {}. Vanishing gradient: abort...", epoch, batch + 1);
                    return Ok(RunOutcome::Diverged { epoch, batch });
                }

                model.backward();
                optimizer.step(&mut model);
            }

            let validation_loss = model.forward(validation.inputs.view(), validation.targets.view());
            let validation_accuracy = match model.predictions() {
                Some(predictions) => accuracy_percent(&argmax_rows(predictions.view()), &validation_target),
                None => 0.0,
            };

            let epoch_metrics = EpochMetrics {
                training_loss,
                validation_loss,
                validation_accuracy,
            };
            metrics.record(&key, epoch, epoch_metrics);

            let retained = best.accepts(validation_accuracy)
                && best.offer(BestEntry {
                    key: key.clone(),
                    epoch,
                    accuracy: validation_accuracy,
                    model: model.snapshot(),
                });

            info!(
                "\t e:{} | train loss: {:.3} | val loss: {:.3} | val accuracy: {:.2}% | learn rate: {:.2} {}",
                epoch,
                training_loss,
                validation_loss,
                validation_accuracy,
                optimizer.learning_rate,
                if retained { "*" } else { "" }
            );
        }

        Ok(RunOutcome::Completed)
    }
}

/// Rejects sets the classifier cannot consume
fn check_shape(name: &str, data: &Dataset) -> Result<()> {
    if data.inputs.ncols() != INPUT_WIDTH || data.targets.ncols() != OUTPUT_WIDTH {
        return Err(Error::Dataset(format!(
            "{} set is {} inputs × {} targets wide, expected {} × {}",
            name,
            data.inputs.ncols(),
            data.targets.ncols(),
            INPUT_WIDTH,
            OUTPUT_WIDTH
        )));
    }
    Ok(())
}

fn accuracy_percent(predicted: &[usize], expected: &[usize]) -> f32 {
    if expected.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(expected).filter(|(p, e)| p == e).count();
    hits as f32 / expected.len() as f32 * 100.0
}
