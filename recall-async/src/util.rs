//! Utility function.
use crate::{AsyncCollector, AsyncTrainer, AsyncTrainerConfig};
use anyhow::Result;
use crossbeam_channel::unbounded;
use recall_core::{
    record::Recorder,
    replay_buffer::{ReplayBuffer, ReplayBufferConfig, SharedReplayBuffer},
    Collector, Env, Learner, Policy,
};

/// Runs asynchronous training.
///
/// Builds a shared replay buffer with the learner's collection spec, spawns
/// an [`AsyncCollector`] thread driving one environment per lane, runs an
/// [`AsyncTrainer`] on the calling thread, and stops and joins the collector
/// once training finishes. The two communicate over a [`crossbeam_channel`].
pub fn train_async<E, P, L>(
    env_config: &E::Config,
    policy: P,
    learner: &mut L,
    buffer_config: &ReplayBufferConfig,
    trainer_config: &AsyncTrainerConfig,
    recorder: &mut dyn Recorder,
) -> Result<()>
where
    E: Env + Send + 'static,
    P: Policy + Send + 'static,
    L: Learner,
{
    let spec = learner.collect_spec().clone();
    let buffer = SharedReplayBuffer::new(ReplayBuffer::build(buffer_config, spec));
    let collector = Collector::<E>::build(env_config, buffer_config.batch_size)?;

    let (stat_s, stat_r) = unbounded();
    let mut async_collector = AsyncCollector::spawn(
        collector,
        policy,
        buffer.clone(),
        stat_s,
        trainer_config.record_interval,
    );

    let mut trainer = AsyncTrainer::build(trainer_config.clone());
    let result = trainer.train(learner, &buffer, &stat_r, recorder);
    async_collector.stop()?;
    result
}
