//! This module is used for tests.
use crate::{
    base::{Env, Learner, Policy, PolicyStep},
    spec::DataSpec,
    trajectory::{StepKind, TimeStep, TrajectoryBatch, TrajectorySpec},
    value::{ElementType, Value},
};
use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// The trajectory spec shared by [`CardEnv`]-based tests.
pub fn card_spec() -> TrajectorySpec {
    TrajectorySpec::new(
        DataSpec::tensor(vec![1], ElementType::F32),
        DataSpec::scalar(ElementType::I64),
    )
}

/// Configuration of [`CardEnv`].
#[derive(Clone, Debug)]
pub struct CardEnvConfig {
    /// Sums above this end the episode with zero reward.
    pub bust_threshold: i64,

    /// Cards are worth `1..=max_card`.
    pub max_card: i64,
}

impl Default for CardEnvConfig {
    fn default() -> Self {
        Self {
            bust_threshold: 21,
            max_card: 10,
        }
    }
}

/// A toy card-drawing environment.
///
/// The observation is the running card sum; action 1 draws another card,
/// action 0 stops and scores the sum as reward. Drawing past the bust
/// threshold ends the episode with zero reward.
pub struct CardEnv {
    config: CardEnvConfig,
    sum: i64,
    done: bool,
    rng: StdRng,
    observation_spec: DataSpec,
    action_spec: DataSpec,
}

impl CardEnv {
    fn observe(&self) -> Value {
        Value::from_f32(vec![1], vec![self.sum as f32]).expect("shape matches data")
    }
}

impl Env for CardEnv {
    type Config = CardEnvConfig;

    fn build(config: &Self::Config, seed: u64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            sum: 0,
            done: true,
            rng: StdRng::seed_from_u64(seed),
            observation_spec: DataSpec::tensor(vec![1], ElementType::F32),
            action_spec: DataSpec::scalar(ElementType::I64),
        })
    }

    fn reset(&mut self) -> Result<TimeStep> {
        self.sum = 0;
        self.done = false;
        Ok(TimeStep {
            step_kind: StepKind::First,
            reward: Value::scalar_f32(0.0),
            discount: 1.0,
            observation: self.observe(),
        })
    }

    fn step(&mut self, action: &Value) -> Result<TimeStep> {
        if self.done {
            return Err(anyhow!("episode is over; call reset()"));
        }
        let draw = action
            .as_tensor()
            .and_then(|t| t.as_i64())
            .and_then(|v| v.first().copied())
            .ok_or_else(|| anyhow!("action must be a scalar i64"))?;

        let (step_kind, reward, discount) = if draw == 1 {
            self.sum += self.rng.gen_range(1..=self.config.max_card);
            if self.sum > self.config.bust_threshold {
                self.done = true;
                (StepKind::Last, 0.0, 0.0)
            } else {
                (StepKind::Mid, 0.0, 1.0)
            }
        } else {
            self.done = true;
            (StepKind::Last, self.sum as f32, 0.0)
        };

        Ok(TimeStep {
            step_kind,
            reward: Value::scalar_f32(reward),
            discount,
            observation: self.observe(),
        })
    }

    fn observation_spec(&self) -> &DataSpec {
        &self.observation_spec
    }

    fn action_spec(&self) -> &DataSpec {
        &self.action_spec
    }
}

/// Draws while the card sum is below a fixed stand threshold.
pub struct DrawPolicy {
    stand_at: i64,
}

impl DrawPolicy {
    /// A policy standing at the given sum.
    pub fn new(stand_at: i64) -> Self {
        Self { stand_at }
    }
}

impl Policy for DrawPolicy {
    fn action(&mut self, time_step: &TimeStep, _state: Option<Value>) -> PolicyStep {
        let sum = time_step
            .observation
            .as_tensor()
            .and_then(|t| t.as_f32())
            .and_then(|v| v.first().copied())
            .expect("card observations are f32[1]");
        let draw = (sum as i64) < self.stand_at;
        PolicyStep::new(Value::scalar_i64(draw as i64))
    }
}

/// Counts training calls and returns a decaying fake loss.
pub struct CountingLearner {
    spec: TrajectorySpec,

    /// Number of batches trained on so far.
    pub train_calls: usize,
}

impl CountingLearner {
    /// A learner collecting experience of the given spec.
    pub fn new(spec: TrajectorySpec) -> Self {
        Self {
            spec,
            train_calls: 0,
        }
    }
}

impl Learner for CountingLearner {
    fn collect_spec(&self) -> &TrajectorySpec {
        &self.spec
    }

    fn train(&mut self, batch: &TrajectoryBatch) -> Result<f32> {
        if batch.is_empty() {
            return Err(anyhow!("cannot train on an empty batch"));
        }
        self.train_calls += 1;
        Ok(1.0 / self.train_calls as f32)
    }
}
