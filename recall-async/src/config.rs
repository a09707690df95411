//! Configuration of [`AsyncTrainer`](crate::AsyncTrainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`AsyncTrainer`](crate::AsyncTrainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AsyncTrainerConfig {
    /// The maximal number of optimization steps.
    pub max_train_steps: usize,

    /// Number of windows per sampled batch.
    pub sample_batch_size: usize,

    /// Window length of sampled batches.
    pub num_steps: usize,

    /// Interval of writing records, in optimization steps.
    pub record_interval: usize,
}

impl Default for AsyncTrainerConfig {
    fn default() -> Self {
        Self {
            max_train_steps: 1000,
            sample_batch_size: 64,
            num_steps: 2,
            record_interval: 100,
        }
    }
}

impl AsyncTrainerConfig {
    /// Sets the maximal number of optimization steps.
    pub fn max_train_steps(mut self, v: usize) -> Self {
        self.max_train_steps = v;
        self
    }

    /// Sets the number of windows per sampled batch.
    pub fn sample_batch_size(mut self, v: usize) -> Self {
        self.sample_batch_size = v;
        self
    }

    /// Sets the window length of sampled batches.
    pub fn num_steps(mut self, v: usize) -> Self {
        self.num_steps = v;
        self
    }

    /// Sets the interval of writing records in optimization steps.
    pub fn record_interval(mut self, v: usize) -> Self {
        self.record_interval = v;
        self
    }

    /// Constructs [`AsyncTrainerConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`AsyncTrainerConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
