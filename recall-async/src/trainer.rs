//! Training loop consuming a shared buffer.
use crate::{AsyncTrainerConfig, CollectorStat};
use anyhow::Result;
use crossbeam_channel::Receiver;
use log::info;
use recall_core::{
    record::{Record, RecordValue::Scalar, Recorder},
    replay_buffer::SharedReplayBuffer,
    Learner,
};
use std::time::SystemTime;

/// Consumes sampled batches from a shared buffer while a collector fills it
/// on another thread.
///
/// The trainer pulls from the buffer's [`stream`], so it simply suspends
/// until the collector has written enough records for the first batch;
/// no explicit warmup bookkeeping is needed. Collection progress received
/// over the stat channel is folded into the written records.
///
/// [`stream`]: SharedReplayBuffer::stream
pub struct AsyncTrainer {
    max_train_steps: usize,
    sample_batch_size: usize,
    num_steps: usize,
    record_interval: usize,
}

impl AsyncTrainer {
    /// Constructs a trainer.
    pub fn build(config: AsyncTrainerConfig) -> Self {
        Self {
            max_train_steps: config.max_train_steps,
            sample_batch_size: config.sample_batch_size,
            num_steps: config.num_steps,
            record_interval: config.record_interval,
        }
    }

    /// Runs the training loop until `max_train_steps` optimization steps
    /// were taken.
    pub fn train<L: Learner>(
        &mut self,
        learner: &mut L,
        buffer: &SharedReplayBuffer,
        stats: &Receiver<CollectorStat>,
        recorder: &mut dyn Recorder,
    ) -> Result<()> {
        let mut stream = buffer.stream(self.sample_batch_size, self.num_steps);
        let mut timer = SystemTime::now();
        let mut opt_steps_for_ops = 0;

        for opt_steps in 1..=self.max_train_steps {
            let batch = stream.next().expect("batch streams are infinite");
            let loss = learner.train(&batch)?;
            opt_steps_for_ops += 1;

            if opt_steps % self.record_interval == 0 {
                let mut record = Record::from_scalar("loss", loss);
                record.insert("opt_steps", Scalar(opt_steps as f32));
                let elapsed = timer.elapsed()?.as_secs_f32();
                record.insert("opt_steps_per_sec", Scalar(opt_steps_for_ops as f32 / elapsed));
                if let Some(stat) = stats.try_iter().last() {
                    record.insert("env_steps", Scalar(stat.env_steps as f32));
                    record.insert("episodes", Scalar(stat.episodes as f32));
                }
                info!("opt_steps {}, loss {}", opt_steps, loss);
                recorder.write(record);
                timer = SystemTime::now();
                opt_steps_for_ops = 0;
            }
        }

        Ok(())
    }
}
