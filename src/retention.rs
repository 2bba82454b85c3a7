use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::topology::Topology;

/// A model worth keeping, frozen at the epoch it scored
#[derive(Debug, Clone, PartialEq)]
pub struct BestEntry {
    pub key: String,
    pub epoch: usize,
    pub accuracy: f32,
    pub model: Topology,
}

impl BestEntry {
    /// File name the entry is persisted under
    pub fn file_name(&self) -> String {
        format!("digits-{}-{}-{:.2}.model.gz", self.key, self.epoch, self.accuracy)
    }
}

/// Bounded top-K store of entries across a whole sweep.
///
/// Entries are kept ascending by accuracy, so the front is the next to be
/// evicted. A full store only admits an entry scoring strictly above its
/// current minimum.
#[derive(Debug, Clone)]
pub struct BestModels {
    capacity: usize,
    entries: Vec<BestEntry>,
}

impl BestModels {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidHyperparameter(
                "retention capacity must be at least 1".to_string(),
            ));
        }
        Ok(BestModels {
            capacity,
            entries: Vec::with_capacity(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowest-scoring entry first
    pub fn entries(&self) -> &[BestEntry] {
        &self.entries
    }

    pub fn best(&self) -> Option<&BestEntry> {
        self.entries.last()
    }

    /// Whether an entry with this score would be retained right now.
    /// Lets callers skip snapshotting a model that would be discarded.
    pub fn accepts(&self, accuracy: f32) -> bool {
        if self.entries.len() < self.capacity {
            return true;
        }
        match self.entries.first() {
            Some(lowest) => accuracy > lowest.accuracy,
            None => true,
        }
    }

    /// Offers an entry; returns whether it was retained
    pub fn offer(&mut self, entry: BestEntry) -> bool {
        if !self.accepts(entry.accuracy) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }

        // Ahead of equal scores, so earlier entries outlive later ties
        let position = self.entries.partition_point(|e| e.accuracy < entry.accuracy);
        self.entries.insert(position, entry);
        true
    }

    /// Writes every retained model into `dir`, returning the paths written
    pub fn save_all<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let path = dir.as_ref().join(entry.file_name());
            entry.model.save(&path)?;
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn into_entries(self) -> Vec<BestEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, accuracy: f32) -> BestEntry {
        BestEntry {
            key: key.to_string(),
            epoch: 1,
            accuracy,
            model: Topology::new(Vec::new()),
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(BestModels::new(0).is_err());
    }

    #[test]
    fn test_evicts_lowest_when_full() {
        let mut best = BestModels::new(2).unwrap();
        assert!(best.offer(entry("a", 50.0)));
        assert!(best.offer(entry("b", 70.0)));
        assert!(best.offer(entry("c", 60.0)));

        let keys: Vec<_> = best.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "b"]);
        assert_eq!(best.best().map(|e| e.key.as_str()), Some("b"));
    }

    #[test]
    fn test_ties_do_not_replace() {
        let mut best = BestModels::new(1).unwrap();
        assert!(best.offer(entry("first", 80.0)));
        assert!(!best.offer(entry("second", 80.0)));

        assert_eq!(best.entries()[0].key, "first");
    }

    #[test]
    fn test_file_name() {
        let mut e = entry("(2, (4,), 2, 'c')", 87.456);
        e.epoch = 2;
        assert_eq!(e.file_name(), "digits-(2, (4,), 2, 'c')-2-87.46.model.gz");
    }
}
