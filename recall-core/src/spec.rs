//! Data specifications: the shape and type contract of stored values.
use crate::{
    error::RecallError,
    value::{ElementType, Tensor, Value},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spec of a leaf tensor: a fixed shape and element type.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TensorSpec {
    /// Shape of conforming tensors. A scalar has the empty shape.
    pub shape: Vec<usize>,

    /// Element type of conforming tensors.
    pub dtype: ElementType,
}

impl TensorSpec {
    /// A spec with the given shape and element type.
    pub fn new(shape: Vec<usize>, dtype: ElementType) -> Self {
        Self { shape, dtype }
    }

    /// A scalar spec.
    pub fn scalar(dtype: ElementType) -> Self {
        Self {
            shape: vec![],
            dtype,
        }
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.dtype, self.shape)
    }
}

/// A recursively structured data specification.
///
/// Spec trees mirror the [`Value`] trees they validate: a leaf constrains a
/// tensor's shape and element type; `Named` and `Tuple` nodes constrain the
/// structure of their children. Every record written to a replay buffer must
/// conform to the spec tree fixed at the buffer's construction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum DataSpec {
    /// A leaf tensor spec.
    Tensor(TensorSpec),

    /// An ordered mapping of named child specs.
    Named(Vec<(String, DataSpec)>),

    /// An ordered grouping of unnamed child specs.
    Tuple(Vec<DataSpec>),
}

impl DataSpec {
    /// A leaf spec with the given shape and element type.
    pub fn tensor(shape: Vec<usize>, dtype: ElementType) -> Self {
        DataSpec::Tensor(TensorSpec::new(shape, dtype))
    }

    /// A scalar leaf spec.
    pub fn scalar(dtype: ElementType) -> Self {
        DataSpec::Tensor(TensorSpec::scalar(dtype))
    }

    /// Checks a value against this spec.
    pub fn validate(&self, value: &Value) -> Result<(), RecallError> {
        self.validate_at("", value)
    }

    /// Checks a value against this spec, reporting `at` as the location of
    /// any mismatch.
    pub(crate) fn validate_at(&self, at: &str, value: &Value) -> Result<(), RecallError> {
        let mismatch = || RecallError::SpecMismatch {
            at: at.to_string(),
            expected: self.describe(),
            found: value.describe(),
        };
        match (self, value) {
            (DataSpec::Tensor(spec), Value::Tensor(t)) => {
                if t.shape() != &spec.shape[..] || t.element_type() != spec.dtype {
                    return Err(mismatch());
                }
                Ok(())
            }
            (DataSpec::Named(specs), Value::Named(fields)) => {
                if specs.len() != fields.len() {
                    return Err(mismatch());
                }
                for ((name, spec), (field_name, field)) in specs.iter().zip(fields.iter()) {
                    if name != field_name {
                        return Err(mismatch());
                    }
                    spec.validate_at(&join(at, name), field)?;
                }
                Ok(())
            }
            (DataSpec::Tuple(specs), Value::Tuple(children)) => {
                if specs.len() != children.len() {
                    return Err(mismatch());
                }
                for (ix, (spec, child)) in specs.iter().zip(children.iter()).enumerate() {
                    spec.validate_at(&join(at, &ix.to_string()), child)?;
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }

    /// A value of this spec's structure whose leaves are empty tensors with
    /// the given leading dimensions prepended. At least one leading dimension
    /// must be zero.
    pub(crate) fn empty_value(&self, leading: &[usize]) -> Value {
        match self {
            DataSpec::Tensor(spec) => {
                Value::Tensor(Tensor::empty(spec.dtype, leading, &spec.shape))
            }
            DataSpec::Named(specs) => Value::Named(
                specs
                    .iter()
                    .map(|(name, spec)| (name.clone(), spec.empty_value(leading)))
                    .collect(),
            ),
            DataSpec::Tuple(specs) => {
                Value::Tuple(specs.iter().map(|spec| spec.empty_value(leading)).collect())
            }
        }
    }

    /// Short structural description, used in spec mismatch reports.
    pub(crate) fn describe(&self) -> String {
        match self {
            DataSpec::Tensor(spec) => spec.to_string(),
            DataSpec::Named(specs) => {
                let names: Vec<&str> = specs.iter().map(|(n, _)| n.as_str()).collect();
                format!("named({})", names.join(", "))
            }
            DataSpec::Tuple(specs) => format!("tuple of {}", specs.len()),
        }
    }
}

fn join(at: &str, name: &str) -> String {
    if at.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", at, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_validation() {
        let spec = DataSpec::tensor(vec![2], ElementType::F32);
        assert!(spec
            .validate(&Value::from_f32(vec![2], vec![0.0, 1.0]).unwrap())
            .is_ok());
        assert!(spec
            .validate(&Value::from_f32(vec![3], vec![0.0; 3]).unwrap())
            .is_err());
        assert!(spec
            .validate(&Value::from_i64(vec![2], vec![0, 1]).unwrap())
            .is_err());
    }

    #[test]
    fn mismatch_reports_path() {
        let spec = DataSpec::Named(vec![
            ("pos".to_string(), DataSpec::scalar(ElementType::F32)),
            ("card".to_string(), DataSpec::scalar(ElementType::I64)),
        ]);
        let value = Value::Named(vec![
            ("pos".to_string(), Value::scalar_f32(0.0)),
            ("card".to_string(), Value::scalar_f32(0.0)),
        ]);
        let err = spec.validate_at("observation", &value).unwrap_err();
        match err {
            RecallError::SpecMismatch { at, .. } => assert_eq!(at, "observation/card"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn structural_mismatch_is_rejected() {
        let spec = DataSpec::Tuple(vec![
            DataSpec::scalar(ElementType::F32),
            DataSpec::scalar(ElementType::F32),
        ]);
        assert!(spec.validate(&Value::scalar_f32(0.0)).is_err());
        assert!(spec
            .validate(&Value::Tuple(vec![Value::scalar_f32(0.0)]))
            .is_err());
        assert!(spec
            .validate(&Value::Tuple(vec![
                Value::scalar_f32(0.0),
                Value::scalar_f32(1.0),
            ]))
            .is_ok());
    }

    #[test]
    fn empty_value_conforms_with_zero_leading_dim() {
        let spec = DataSpec::Named(vec![(
            "obs".to_string(),
            DataSpec::tensor(vec![4], ElementType::F32),
        )]);
        let empty = spec.empty_value(&[3, 0]);
        let t = empty.field("obs").unwrap().as_tensor().unwrap();
        assert_eq!(t.shape(), &[3, 0, 4]);
        assert_eq!(t.numel(), 0);
    }

    #[test]
    fn spec_yaml_roundtrip() {
        let spec = DataSpec::Named(vec![
            (
                "obs".to_string(),
                DataSpec::tensor(vec![2, 3], ElementType::F32),
            ),
            ("act".to_string(), DataSpec::scalar(ElementType::I64)),
        ]);
        let yaml = serde_yaml::to_string(&spec).unwrap();
        let spec2: DataSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(spec, spec2);
    }
}
