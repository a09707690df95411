//! Train a learner from collected experience.
mod collector;
mod config;
use crate::{
    base::{Env, Learner, Policy, TrajectorySampler, TrajectoryWriter},
    error::RecallError,
    record::{Record, RecordValue::Scalar, Recorder},
};
use anyhow::Result;
pub use collector::Collector;
pub use config::TrainerConfig;
use log::info;
use std::time::{Duration, SystemTime};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Synchronous training loop interleaving collection and optimization on one
/// thread.
///
/// Each iteration performs `collect_steps_per_iter` collection steps. Once
/// `warmup_period` collection steps have filled the buffer, it also samples
/// one batch and performs one optimization step. Objects interact as follows:
///
/// ```mermaid
/// graph LR
///     A[Policy]-->|Value|B[Env]
///     B -->|TimeStep|A
///     B -->|Trajectory|C[ReplayBuffer]
///     C -->|TrajectoryBatch|D[Learner]
/// ```
///
/// During warmup, sampling that would fail with
/// [`InsufficientData`](RecallError::InsufficientData) skips the
/// optimization step instead of failing the run; the condition resolves as
/// collection proceeds. For concurrent collection and training on separate
/// threads, see the async harness crate.
pub struct Trainer {
    max_iterations: usize,
    collect_steps_per_iter: usize,
    warmup_period: usize,
    sample_batch_size: usize,
    num_steps: usize,
    record_interval: usize,

    /// Optimization steps since the last record, for computing throughput.
    opt_steps_for_ops: usize,

    /// Time spent in optimization steps since the last record.
    timer_for_ops: Duration,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            collect_steps_per_iter: config.collect_steps_per_iter,
            warmup_period: config.warmup_period,
            sample_batch_size: config.sample_batch_size,
            num_steps: config.num_steps,
            record_interval: config.record_interval,
            opt_steps_for_ops: 0,
            timer_for_ops: Duration::new(0, 0),
        }
    }

    /// Returns optimization steps per second, then resets the counters.
    fn opt_steps_per_sec(&mut self) -> f32 {
        let osps = 1000. * self.opt_steps_for_ops as f32 / (self.timer_for_ops.as_millis() as f32);
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        osps
    }

    /// Runs the training loop.
    pub fn train<E, P, L, B>(
        &mut self,
        collector: &mut Collector<E>,
        policy: &mut P,
        learner: &mut L,
        buffer: &mut B,
        recorder: &mut dyn Recorder,
    ) -> Result<()>
    where
        E: Env,
        P: Policy,
        L: Learner,
        B: TrajectoryWriter + TrajectorySampler,
    {
        let mut collect_steps = 0;
        let mut opt_steps = 0;

        for iteration in 1..=self.max_iterations {
            for _ in 0..self.collect_steps_per_iter {
                collector.collect_step(policy, buffer)?;
                collect_steps += 1;
            }
            if collect_steps < self.warmup_period {
                continue;
            }

            let timer = SystemTime::now();
            let batch = match buffer.get_next(self.sample_batch_size, self.num_steps) {
                Ok(batch) => batch,
                Err(err) => match err.downcast_ref::<RecallError>() {
                    // still warming up; resolves as collection proceeds
                    Some(RecallError::InsufficientData { .. }) => continue,
                    _ => return Err(err),
                },
            };
            let loss = learner.train(&batch)?;
            opt_steps += 1;
            self.opt_steps_for_ops += 1;
            self.timer_for_ops += timer.elapsed()?;

            if opt_steps % self.record_interval == 0 {
                let mut record = Record::from_scalar("loss", loss);
                record.insert("opt_steps", Scalar(opt_steps as f32));
                record.insert("env_steps", Scalar(collector.env_steps() as f32));
                record.insert("episodes", Scalar(collector.episodes() as f32));
                record.insert("opt_steps_per_sec", Scalar(self.opt_steps_per_sec()));
                info!(
                    "iteration {}, opt_steps {}, loss {}",
                    iteration, opt_steps, loss
                );
                recorder.write(record);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{card_spec, CardEnv, CardEnvConfig, CountingLearner, DrawPolicy},
        record::BufferedRecorder,
        replay_buffer::ReplayBuffer,
    };

    #[test]
    fn trains_after_warmup_and_records_losses() {
        let config = TrainerConfig::default()
            .max_iterations(50)
            .collect_steps_per_iter(1)
            .warmup_period(10)
            .sample_batch_size(4)
            .num_steps(2)
            .record_interval(10);
        let mut trainer = Trainer::build(config);
        let mut collector = Collector::<CardEnv>::build(&CardEnvConfig::default(), 2).unwrap();
        let mut policy = DrawPolicy::new(15);
        let mut learner = CountingLearner::new(card_spec());
        let mut buffer = ReplayBuffer::new(card_spec(), 2, 1000);
        let mut recorder = BufferedRecorder::new();

        trainer
            .train(
                &mut collector,
                &mut policy,
                &mut learner,
                &mut buffer,
                &mut recorder,
            )
            .unwrap();

        // iterations 10..=50 each perform one optimization step
        assert_eq!(learner.train_calls, 41);
        assert_eq!(recorder.len(), 4);
        for record in recorder.iter() {
            assert!(record.get_scalar("loss").is_some());
            assert!(record.get_scalar("opt_steps_per_sec").is_some());
        }
        assert_eq!(buffer.len(), 50);
    }
}
