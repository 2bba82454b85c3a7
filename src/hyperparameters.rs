use std::fmt;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the learning rate evolves over a combination's epochs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    Constant { rate: f32 },
    /// Linear interpolation from `start` on the first epoch to `end` on the last
    LinearDecay { start: f32, end: f32 },
}

impl Schedule {
    /// Rate for the zero-based `epoch` out of `epochs`
    pub fn rate(&self, epochs: usize, epoch: usize) -> f32 {
        match *self {
            Schedule::Constant { rate } => rate,
            Schedule::LinearDecay { start, end } => {
                if epochs <= 1 {
                    return start;
                }
                let t = epoch.min(epochs - 1) as f32 / (epochs - 1) as f32;
                start + (end - start) * t
            }
        }
    }
}

/// A named learning-rate schedule; the id is what appears in combination keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningRate {
    pub id: String,
    pub schedule: Schedule,
}

impl LearningRate {
    pub fn constant(id: impl Into<String>, rate: f32) -> Self {
        LearningRate {
            id: id.into(),
            schedule: Schedule::Constant { rate },
        }
    }

    pub fn linear_decay(id: impl Into<String>, start: f32, end: f32) -> Self {
        LearningRate {
            id: id.into(),
            schedule: Schedule::LinearDecay { start, end },
        }
    }

    pub fn rate(&self, epochs: usize, epoch: usize) -> f32 {
        self.schedule.rate(epochs, epoch)
    }
}

/// One point of the hyperparameter grid. Validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    epochs: usize,
    layers: Vec<usize>,
    batch_size: usize,
    learning_rate: LearningRate,
}

impl Combination {
    pub fn new(
        epochs: usize,
        layers: Vec<usize>,
        batch_size: usize,
        learning_rate: LearningRate,
    ) -> Result<Self> {
        if epochs == 0 {
            return Err(Error::InvalidHyperparameter("epoch budget must be positive".to_string()));
        }
        if layers.is_empty() {
            return Err(Error::InvalidHyperparameter("layer sizes must not be empty".to_string()));
        }
        if layers.contains(&0) {
            return Err(Error::InvalidHyperparameter(format!(
                "layer sizes must be positive, got {:?}",
                layers
            )));
        }
        if batch_size == 0 {
            return Err(Error::InvalidHyperparameter("batch size must be positive".to_string()));
        }

        Ok(Combination {
            epochs,
            layers,
            batch_size,
            learning_rate,
        })
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn learning_rate(&self) -> &LearningRate {
        &self.learning_rate
    }

    /// Key indexing metrics and naming saved models, e.g. `(100, (300,), 16, '0.99')`
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.layers.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        let layers = if widths.len() == 1 {
            format!("({},)", widths[0])
        } else {
            format!("({})", widths.join(", "))
        };
        write!(
            f,
            "({}, {}, {}, '{}')",
            self.epochs, layers, self.batch_size, self.learning_rate.id
        )
    }
}

/// The grid a sweep iterates over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub epochs: Vec<usize>,
    pub layers: Vec<Vec<usize>>,
    pub batch_sizes: Vec<usize>,
    pub learning_rates: Vec<LearningRate>,
    /// How many of the best-scoring models to retain
    pub keep_best: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            epochs: vec![100],
            layers: vec![
                vec![170],
                vec![300],
                vec![900],
                vec![300, 300],
                vec![900, 100],
                vec![170, 100, 70],
                vec![300, 200, 100],
            ],
            batch_sizes: vec![16, 32, 128],
            learning_rates: vec![LearningRate::constant("0.99", 0.99)],
            keep_best: 5,
        }
    }
}

impl SweepConfig {
    /// Cartesian product epochs × layers × batch sizes × learning rates,
    /// with the last list varying fastest.
    pub fn combinations(&self) -> Result<Vec<Combination>> {
        iproduct!(&self.epochs, &self.layers, &self.batch_sizes, &self.learning_rates)
            .map(|(&epochs, layers, &batch_size, learning_rate)| {
                Combination::new(epochs, layers.clone(), batch_size, learning_rate.clone())
            })
            .collect()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
