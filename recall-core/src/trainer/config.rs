//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Number of training iterations.
    pub max_iterations: usize,

    /// Collection steps performed at the start of each iteration.
    pub collect_steps_per_iter: usize,

    /// Collection steps taken before the first optimization step, for
    /// filling the replay buffer.
    pub warmup_period: usize,

    /// Number of windows per sampled batch.
    pub sample_batch_size: usize,

    /// Window length of sampled batches.
    pub num_steps: usize,

    /// Interval of writing records, in optimization steps.
    pub record_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            collect_steps_per_iter: 1,
            warmup_period: 100,
            sample_batch_size: 64,
            num_steps: 2,
            record_interval: 200,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training iterations.
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }

    /// Sets the collection steps per iteration.
    pub fn collect_steps_per_iter(mut self, v: usize) -> Self {
        self.collect_steps_per_iter = v;
        self
    }

    /// Sets the warmup period in collection steps.
    pub fn warmup_period(mut self, v: usize) -> Self {
        self.warmup_period = v;
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

    /// Constructs [`TrainerConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
