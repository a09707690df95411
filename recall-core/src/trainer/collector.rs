//! Experience collection: the producer side of the replay buffer.
use crate::{
    base::{Env, Policy, TrajectoryWriter},
    trajectory::{TimeStep, Trajectory},
    value::Value,
};
use anyhow::Result;

/// Drives one environment instance per buffer lane and writes the resulting
/// trajectories.
///
/// Each [`collect_step`] obtains the current time step of every lane
/// (resetting environments that are unstarted or whose episode just ended),
/// queries the policy once per lane, steps each environment, and appends the
/// assembled records with a single `add_batch` call. Writing one record per
/// lane per step keeps lanes uniformly filled.
///
/// [`collect_step`]: Collector::collect_step
pub struct Collector<E: Env> {
    envs: Vec<E>,
    time_steps: Vec<Option<TimeStep>>,
    policy_states: Vec<Option<Value>>,
    env_steps: usize,
    episodes: usize,
}

impl<E: Env> Collector<E> {
    /// Builds `batch_size` environments from one config, seeding each lane
    /// differently.
    pub fn build(config: &E::Config, batch_size: usize) -> Result<Self> {
        let envs = (0..batch_size)
            .map(|ix| E::build(config, ix as u64))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_envs(envs))
    }

    /// Wraps already-built environments, one per lane.
    pub fn from_envs(envs: Vec<E>) -> Self {
        assert!(!envs.is_empty(), "collector needs at least one environment");
        let n = envs.len();
        Self {
            envs,
            time_steps: (0..n).map(|_| None).collect(),
            policy_states: (0..n).map(|_| None).collect(),
            env_steps: 0,
            episodes: 0,
        }
    }

    /// Number of lanes driven by this collector.
    pub fn batch_size(&self) -> usize {
        self.envs.len()
    }

    /// Total environment steps taken across all lanes.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// Episodes completed across all lanes.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Performs one collection step on every lane and appends one record per
    /// lane to the writer.
    pub fn collect_step<P, W>(&mut self, policy: &mut P, writer: &mut W) -> Result<()>
    where
        P: Policy,
        W: TrajectoryWriter,
    {
        let mut items = Vec::with_capacity(self.envs.len());
        for (ix, env) in self.envs.iter_mut().enumerate() {
            let current = match self.time_steps[ix].take() {
                Some(step) => step,
                None => {
                    self.policy_states[ix] = None;
                    env.reset()?
                }
            };

            let mut policy_step = policy.action(&current, self.policy_states[ix].take());
            let next = env.step(&policy_step.action)?;
            self.policy_states[ix] = policy_step.state.take();
            items.push(Trajectory::from_transition(&current, policy_step, &next));

            self.env_steps += 1;
            if next.is_last() {
                self.episodes += 1;
                self.time_steps[ix] = None;
            } else {
                self.time_steps[ix] = Some(next);
            }
        }
        writer.add_batch(items)
    }
}
