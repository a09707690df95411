//! Structured values stored in and sampled from replay buffers.
//!
//! A [`Value`] is either a leaf [`Tensor`] or a tree of named or positional
//! children. Every value written to a buffer is validated against a
//! [`DataSpec`](crate::DataSpec) of the same tree shape, so operations on
//! stored values can rely on structural uniformity.
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a leaf tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ElementType {
    /// 32-bit float.
    F32,

    /// 64-bit signed integer.
    I64,

    /// Boolean.
    Bool,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::F32 => write!(f, "f32"),
            ElementType::I64 => write!(f, "i64"),
            ElementType::Bool => write!(f, "bool"),
        }
    }
}

/// Flat, row-major storage of a leaf tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    /// 32-bit float elements.
    F32(Vec<f32>),

    /// 64-bit signed integer elements.
    I64(Vec<i64>),

    /// Boolean elements.
    Bool(Vec<bool>),
}

impl TensorData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::Bool(v) => v.len(),
        }
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the storage.
    pub fn element_type(&self) -> ElementType {
        match self {
            TensorData::F32(_) => ElementType::F32,
            TensorData::I64(_) => ElementType::I64,
            TensorData::Bool(_) => ElementType::Bool,
        }
    }

    /// Empty storage of the given element type.
    pub fn empty(dtype: ElementType) -> Self {
        match dtype {
            ElementType::F32 => TensorData::F32(vec![]),
            ElementType::I64 => TensorData::I64(vec![]),
            ElementType::Bool => TensorData::Bool(vec![]),
        }
    }

    fn append(&mut self, other: &TensorData) -> Result<()> {
        match (self, other) {
            (TensorData::F32(a), TensorData::F32(b)) => a.extend_from_slice(b),
            (TensorData::I64(a), TensorData::I64(b)) => a.extend_from_slice(b),
            (TensorData::Bool(a), TensorData::Bool(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(anyhow!(
                    "cannot append {} data to {} data",
                    b.element_type(),
                    a.element_type()
                ))
            }
        }
        Ok(())
    }
}

/// A dense tensor with row-major layout. A scalar has the empty shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: TensorData,
}

impl Tensor {
    /// Creates a tensor, checking that the data length matches the shape.
    pub fn new(shape: Vec<usize>, data: TensorData) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(anyhow!(
                "shape {:?} requires {} elements, data has {}",
                shape,
                numel,
                data.len()
            ));
        }
        Ok(Self { shape, data })
    }

    /// A scalar f32 tensor.
    pub fn scalar_f32(v: f32) -> Self {
        Self {
            shape: vec![],
            data: TensorData::F32(vec![v]),
        }
    }

    /// A scalar i64 tensor.
    pub fn scalar_i64(v: i64) -> Self {
        Self {
            shape: vec![],
            data: TensorData::I64(vec![v]),
        }
    }

    /// An f32 tensor of the given shape.
    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        Self::new(shape, TensorData::F32(data))
    }

    /// An i64 tensor of the given shape.
    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Result<Self> {
        Self::new(shape, TensorData::I64(data))
    }

    /// An empty tensor whose shape is `leading` followed by `shape`.
    /// At least one leading dimension must be zero.
    pub(crate) fn empty(dtype: ElementType, leading: &[usize], shape: &[usize]) -> Self {
        let full: Vec<usize> = leading.iter().chain(shape.iter()).copied().collect();
        debug_assert_eq!(full.iter().product::<usize>(), 0);
        Self {
            shape: full,
            data: TensorData::empty(dtype),
        }
    }

    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element type of the tensor.
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Underlying storage.
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// The elements as an f32 slice, if this is an f32 tensor.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            TensorData::F32(v) => Some(v),
            _ => None,
        }
    }

    /// The elements as an i64 slice, if this is an i64 tensor.
    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.data {
            TensorData::I64(v) => Some(v),
            _ => None,
        }
    }

    /// The elements as a bool slice, if this is a bool tensor.
    pub fn as_bool(&self) -> Option<&[bool]> {
        match &self.data {
            TensorData::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Stacks tensors of identical shape and dtype along a new leading axis.
    fn stack(items: &[&Tensor]) -> Result<Tensor> {
        let first = items
            .first()
            .ok_or_else(|| anyhow!("cannot stack zero tensors"))?;
        let mut data = TensorData::empty(first.element_type());
        for t in items {
            if t.shape != first.shape {
                return Err(anyhow!(
                    "cannot stack tensors of shapes {:?} and {:?}",
                    first.shape,
                    t.shape
                ));
            }
            data.append(&t.data)?;
        }
        let mut shape = Vec::with_capacity(first.shape.len() + 1);
        shape.push(items.len());
        shape.extend_from_slice(&first.shape);
        Tensor::new(shape, data)
    }
}

/// A structured value: a leaf tensor or a tree of them.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A leaf tensor.
    Tensor(Tensor),

    /// An ordered mapping of named children.
    Named(Vec<(String, Value)>),

    /// An ordered grouping of unnamed children.
    Tuple(Vec<Value>),
}

impl Value {
    /// A scalar f32 leaf.
    pub fn scalar_f32(v: f32) -> Self {
        Value::Tensor(Tensor::scalar_f32(v))
    }

    /// A scalar i64 leaf.
    pub fn scalar_i64(v: i64) -> Self {
        Value::Tensor(Tensor::scalar_i64(v))
    }

    /// An f32 leaf of the given shape.
    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        Ok(Value::Tensor(Tensor::from_f32(shape, data)?))
    }

    /// An i64 leaf of the given shape.
    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Result<Self> {
        Ok(Value::Tensor(Tensor::from_i64(shape, data)?))
    }

    /// The leaf tensor, if this value is a leaf.
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Looks up a named child.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Named(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Stacks structurally identical values along a new leading axis.
    ///
    /// Every leaf tensor of the result carries one extra leading dimension of
    /// size `items.len()`. Fails on an empty slice or on structural
    /// disagreement; values drawn from one spec-validated buffer never
    /// disagree.
    pub fn stack(items: &[&Value]) -> Result<Value> {
        match items.first() {
            None => Err(anyhow!("cannot stack zero values")),
            Some(Value::Tensor(_)) => {
                let leaves = items
                    .iter()
                    .map(|v| v.as_tensor().ok_or_else(|| anyhow!("mixed value kinds")))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Tensor(Tensor::stack(&leaves)?))
            }
            Some(Value::Named(fields)) => {
                let mut out = Vec::with_capacity(fields.len());
                for (ix, (name, _)) in fields.iter().enumerate() {
                    let children = items
                        .iter()
                        .map(|v| match v {
                            Value::Named(f) if f.len() == fields.len() && f[ix].0 == *name => {
                                Ok(&f[ix].1)
                            }
                            _ => Err(anyhow!("mixed value kinds")),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    out.push((name.clone(), Value::stack(&children)?));
                }
                Ok(Value::Named(out))
            }
            Some(Value::Tuple(children)) => {
                let mut out = Vec::with_capacity(children.len());
                for ix in 0..children.len() {
                    let nth = items
                        .iter()
                        .map(|v| match v {
                            Value::Tuple(c) if c.len() == children.len() => Ok(&c[ix]),
                            _ => Err(anyhow!("mixed value kinds")),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    out.push(Value::stack(&nth)?);
                }
                Ok(Value::Tuple(out))
            }
        }
    }

    /// Short structural description, used in spec mismatch reports.
    pub(crate) fn describe(&self) -> String {
        match self {
            Value::Tensor(t) => format!("{}{:?}", t.element_type(), t.shape()),
            Value::Named(fields) => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                format!("named({})", names.join(", "))
            }
            Value::Tuple(children) => format!("tuple of {}", children.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_rejects_shape_data_mismatch() {
        assert!(Tensor::from_f32(vec![2, 2], vec![0.0; 3]).is_err());
        assert!(Tensor::from_f32(vec![2, 2], vec![0.0; 4]).is_ok());
    }

    #[test]
    fn scalar_has_empty_shape() {
        let t = Tensor::scalar_f32(1.5);
        assert!(t.shape().is_empty());
        assert_eq!(t.numel(), 1);
        assert_eq!(t.as_f32(), Some(&[1.5][..]));
    }

    #[test]
    fn stack_prepends_a_dimension() {
        let a = Value::from_f32(vec![2], vec![1.0, 2.0]).unwrap();
        let b = Value::from_f32(vec![2], vec![3.0, 4.0]).unwrap();
        let stacked = Value::stack(&[&a, &b]).unwrap();
        let t = stacked.as_tensor().unwrap();
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.as_f32(), Some(&[1.0, 2.0, 3.0, 4.0][..]));
    }

    #[test]
    fn stack_recurses_into_named_values() {
        let item = |x: f32, c: i64| {
            Value::Named(vec![
                ("pos".to_string(), Value::scalar_f32(x)),
                ("card".to_string(), Value::scalar_i64(c)),
            ])
        };
        let (a, b) = (item(0.5, 3), item(0.75, 7));
        let stacked = Value::stack(&[&a, &b]).unwrap();
        let pos = stacked.field("pos").unwrap().as_tensor().unwrap();
        assert_eq!(pos.shape(), &[2]);
        assert_eq!(pos.as_f32(), Some(&[0.5, 0.75][..]));
        let card = stacked.field("card").unwrap().as_tensor().unwrap();
        assert_eq!(card.as_i64(), Some(&[3, 7][..]));
    }

    #[test]
    fn stack_twice_yields_two_leading_dims() {
        let vals: Vec<Value> = (0..6).map(|i| Value::scalar_f32(i as f32)).collect();
        let rows: Vec<Value> = vals
            .chunks(3)
            .map(|c| Value::stack(&c.iter().collect::<Vec<_>>()).unwrap())
            .collect();
        let grid = Value::stack(&rows.iter().collect::<Vec<_>>()).unwrap();
        let t = grid.as_tensor().unwrap();
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.as_f32(), Some(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0][..]));
    }

    #[test]
    fn stack_rejects_mixed_structures() {
        let a = Value::scalar_f32(0.0);
        let b = Value::Tuple(vec![Value::scalar_f32(0.0)]);
        assert!(Value::stack(&[&a, &b]).is_err());
        assert!(Value::stack(&[]).is_err());
    }
}
