//! Trajectory records: the unit of storage of a replay buffer.
use crate::{
    base::PolicyStep,
    error::RecallError,
    spec::DataSpec,
    value::{ElementType, Value},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Position of a step within an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum StepKind {
    /// The first step of an episode.
    First,

    /// An intermediate step.
    Mid,

    /// The final step of an episode.
    Last,
}

/// What an environment emits at every interaction step.
#[derive(Clone, Debug)]
pub struct TimeStep {
    /// Position of this step within its episode.
    pub step_kind: StepKind,

    /// Reward earned by the preceding action. Zero on the first step.
    pub reward: Value,

    /// Discount applied to future rewards, in `[0, 1]`. Zero ends the
    /// episode's return.
    pub discount: f32,

    /// Observation of the environment state.
    pub observation: Value,
}

impl TimeStep {
    /// Whether this step ends its episode.
    pub fn is_last(&self) -> bool {
        self.step_kind == StepKind::Last
    }
}

/// One stored transition: an observation, the action taken on it, and the
/// outcome reported by the following time step. Immutable once written.
#[derive(Clone, Debug)]
pub struct Trajectory {
    /// Position of the observed step within its episode.
    pub step_kind: StepKind,

    /// Observation the action was taken on.
    pub observation: Value,

    /// Action applied to the environment.
    pub action: Value,

    /// Auxiliary data emitted by the policy, if the buffer's spec declares
    /// any.
    pub policy_info: Option<Value>,

    /// Reward reported by the following time step.
    pub reward: Value,

    /// Discount reported by the following time step, in `[0, 1]`.
    pub discount: f32,
}

impl Trajectory {
    /// Assembles a record from one environment transition: the current time
    /// step, the policy output applied to it, and the resulting time step.
    /// Kind and observation come from the current step; reward and discount
    /// from the next.
    pub fn from_transition(step: &TimeStep, policy_step: PolicyStep, next_step: &TimeStep) -> Self {
        Self {
            step_kind: step.step_kind,
            observation: step.observation.clone(),
            action: policy_step.action,
            policy_info: policy_step.info,
            reward: next_step.reward.clone(),
            discount: next_step.discount,
        }
    }
}

/// The buffer-wide data contract: one spec per record field, fixed at buffer
/// construction and checked on every write.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrajectorySpec {
    /// Spec of observations.
    pub observation: DataSpec,

    /// Spec of actions.
    pub action: DataSpec,

    /// Spec of auxiliary policy data; `None` forbids it.
    pub policy_info: Option<DataSpec>,

    /// Spec of rewards.
    pub reward: DataSpec,
}

impl TrajectorySpec {
    /// A spec with the given observation and action specs, a scalar f32
    /// reward, and no policy info.
    pub fn new(observation: DataSpec, action: DataSpec) -> Self {
        Self {
            observation,
            action,
            policy_info: None,
            reward: DataSpec::scalar(ElementType::F32),
        }
    }

    /// Declares auxiliary policy data.
    pub fn with_policy_info(mut self, spec: DataSpec) -> Self {
        self.policy_info = Some(spec);
        self
    }

    /// Replaces the reward spec.
    pub fn with_reward(mut self, spec: DataSpec) -> Self {
        self.reward = spec;
        self
    }

    /// Checks a record against this spec, including the discount range.
    pub fn validate(&self, record: &Trajectory) -> Result<(), RecallError> {
        self.observation
            .validate_at("observation", &record.observation)?;
        self.action.validate_at("action", &record.action)?;
        match (&self.policy_info, &record.policy_info) {
            (None, None) => {}
            (Some(spec), Some(info)) => spec.validate_at("policy_info", info)?,
            (Some(spec), None) => {
                return Err(RecallError::SpecMismatch {
                    at: "policy_info".to_string(),
                    expected: spec.describe(),
                    found: "absent".to_string(),
                })
            }
            (None, Some(info)) => {
                return Err(RecallError::SpecMismatch {
                    at: "policy_info".to_string(),
                    expected: "absent".to_string(),
                    found: info.describe(),
                })
            }
        }
        self.reward.validate_at("reward", &record.reward)?;
        if !(0.0..=1.0).contains(&record.discount) {
            return Err(RecallError::SpecMismatch {
                at: "discount".to_string(),
                expected: "float in [0, 1]".to_string(),
                found: record.discount.to_string(),
            });
        }
        Ok(())
    }
}

/// A batch of records sampled or gathered from a replay buffer.
///
/// `dims` gives the leading dimensions shared by every field: `[k]` for
/// single-step samples (the time dimension is dropped when `num_steps == 1`),
/// `[k, m]` for `m`-step windows, `[batch_size, n]` for full snapshots.
/// `step_kind` and `discount` are flattened in row-major order over `dims`;
/// the structured fields carry `dims` as extra leading dimensions on every
/// leaf tensor.
#[derive(Clone, Debug)]
pub struct TrajectoryBatch {
    dims: Vec<usize>,
    step_kind: Vec<StepKind>,
    observation: Value,
    action: Value,
    policy_info: Option<Value>,
    reward: Value,
    discount: Vec<f32>,
}

impl TrajectoryBatch {
    /// Stacks single records into a batch of leading shape `[k]`.
    pub(crate) fn stack_samples(spec: &TrajectorySpec, records: &[&Trajectory]) -> Result<Self> {
        if records.is_empty() {
            return Ok(Self::empty(spec, vec![0]));
        }
        Ok(Self {
            dims: vec![records.len()],
            step_kind: records.iter().map(|r| r.step_kind).collect(),
            observation: Value::stack(&field(records, |r| &r.observation))?,
            action: Value::stack(&field(records, |r| &r.action))?,
            policy_info: stack_info(spec, records)?,
            reward: Value::stack(&field(records, |r| &r.reward))?,
            discount: records.iter().map(|r| r.discount).collect(),
        })
    }

    /// Stacks `num_steps`-long windows into a batch of leading shape
    /// `[windows.len(), num_steps]`.
    pub(crate) fn stack_windows(
        spec: &TrajectorySpec,
        windows: &[Vec<&Trajectory>],
        num_steps: usize,
    ) -> Result<Self> {
        let dims = vec![windows.len(), num_steps];
        if windows.is_empty() || num_steps == 0 {
            return Ok(Self::empty(spec, dims));
        }
        let stack2 = |get: &dyn Fn(&Trajectory) -> &Value| -> Result<Value> {
            let rows = windows
                .iter()
                .map(|w| Value::stack(&w.iter().map(|&r| get(r)).collect::<Vec<_>>()))
                .collect::<Result<Vec<_>>>()?;
            Value::stack(&rows.iter().collect::<Vec<_>>())
        };
        let policy_info = match &spec.policy_info {
            None => None,
            Some(_) => Some(stack2(&|r| {
                r.policy_info.as_ref().expect("validated record has info")
            })?),
        };
        let flat: Vec<&Trajectory> = windows.iter().flatten().copied().collect();
        Ok(Self {
            dims,
            step_kind: flat.iter().map(|r| r.step_kind).collect(),
            observation: stack2(&|r| &r.observation)?,
            action: stack2(&|r| &r.action)?,
            policy_info,
            reward: stack2(&|r| &r.reward)?,
            discount: flat.iter().map(|r| r.discount).collect(),
        })
    }

    fn empty(spec: &TrajectorySpec, dims: Vec<usize>) -> Self {
        Self {
            step_kind: vec![],
            observation: spec.observation.empty_value(&dims),
            action: spec.action.empty_value(&dims),
            policy_info: spec.policy_info.as_ref().map(|s| s.empty_value(&dims)),
            reward: spec.reward.empty_value(&dims),
            discount: vec![],
            dims,
        }
    }

    /// Leading dimensions shared by every field.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of sampled windows (the first leading dimension).
    pub fn len(&self) -> usize {
        self.dims[0]
    }

    /// Whether the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.num_records() == 0
    }

    /// Total number of records across all windows.
    pub fn num_records(&self) -> usize {
        self.dims.iter().product()
    }

    /// Step kinds, flattened in row-major order over [`dims`](Self::dims).
    pub fn step_kind(&self) -> &[StepKind] {
        &self.step_kind
    }

    /// Stacked observations.
    pub fn observation(&self) -> &Value {
        &self.observation
    }

    /// Stacked actions.
    pub fn action(&self) -> &Value {
        &self.action
    }

    /// Stacked policy info, if the spec declares any.
    pub fn policy_info(&self) -> Option<&Value> {
        self.policy_info.as_ref()
    }

    /// Stacked rewards.
    pub fn reward(&self) -> &Value {
        &self.reward
    }

    /// Discounts, flattened in row-major order over [`dims`](Self::dims).
    pub fn discount(&self) -> &[f32] {
        &self.discount
    }

    /// Decomposes the batch into its fields:
    /// `(step_kind, observation, action, policy_info, reward, discount)`.
    pub fn unpack(
        self,
    ) -> (
        Vec<StepKind>,
        Value,
        Value,
        Option<Value>,
        Value,
        Vec<f32>,
    ) {
        (
            self.step_kind,
            self.observation,
            self.action,
            self.policy_info,
            self.reward,
            self.discount,
        )
    }
}

fn field<'a>(records: &[&'a Trajectory], get: fn(&'a Trajectory) -> &'a Value) -> Vec<&'a Value> {
    records.iter().map(|&r| get(r)).collect()
}

fn stack_info(spec: &TrajectorySpec, records: &[&Trajectory]) -> Result<Option<Value>> {
    match &spec.policy_info {
        None => Ok(None),
        Some(_) => {
            let infos: Vec<&Value> = records
                .iter()
                .map(|r| r.policy_info.as_ref().expect("validated record has info"))
                .collect();
            Ok(Some(Value::stack(&infos)?))
        }
    }
}
