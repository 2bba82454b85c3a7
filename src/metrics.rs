use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metrics recorded after one completed epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Loss of the final training batch of the epoch
    pub training_loss: f32,
    pub validation_loss: f32,
    /// Percentage in [0, 100]
    pub validation_accuracy: f32,
}

/// Epoch number (1-based) to that epoch's metrics
pub type MetricsRecord = BTreeMap<usize, EpochMetrics>;

/// Every combination's record, keyed by combination key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsLog {
    records: BTreeMap<String, MetricsRecord>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an empty record for `key`, replacing any earlier run's record
    pub fn begin(&mut self, key: &str) {
        self.records.insert(key.to_string(), MetricsRecord::new());
    }

    pub fn record(&mut self, key: &str, epoch: usize, metrics: EpochMetrics) {
        self.records.entry(key.to_string()).or_default().insert(epoch, metrics);
    }

    pub fn get(&self, key: &str) -> Option<&MetricsRecord> {
        self.records.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &self.records)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let records = serde_json::from_reader(reader)?;
        Ok(MetricsLog { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_discards_earlier_record() {
        let mut log = MetricsLog::new();
        let metrics = EpochMetrics {
            training_loss: 1.0,
            validation_loss: 1.0,
            validation_accuracy: 10.0,
        };
        log.begin("k");
        log.record("k", 1, metrics);
        log.record("k", 2, metrics);

        log.begin("k");
        assert_eq!(log.get("k").map(|r| r.len()), Some(0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_json_uses_epoch_numbers_as_keys() {
        let mut log = MetricsLog::new();
        log.record(
            "(1, (4,), 2, 'c')",
            1,
            EpochMetrics {
                training_loss: 0.5,
                validation_loss: 0.25,
                validation_accuracy: 75.0,
            },
        );

        let json = serde_json::to_string(&log.records).unwrap();
        assert_eq!(
            json,
            r#"{"(1, (4,), 2, 'c')":{"1":{"training_loss":0.5,"validation_loss":0.25,"validation_accuracy":75.0}}}"#
        );
    }
}
