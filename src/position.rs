/*!
The parameter-space position of a Markov chain.

A [`Position`] maps named model parameters (e.g. a global mean, a global
scale, a vector of per-group offsets) to scalar or vector values. Transition
kernels consume a position and return a new one with the same schema: the
same parameter names, the same kinds, the same vector lengths.

# Examples

```rust
use mcmc_driver::position::Position;

let p = Position::new()
    .with("mu", 0.0)
    .with("tau", 1.0)
    .with("theta", vec![0.0; 8]);
assert_eq!(p.n_coords(), 10);
assert_eq!(p.scalar("mu"), Some(0.0));

let shifted = p.map(|x| x + 1.0);
assert!(shifted.same_schema(&p));
assert_eq!(shifted.scalar("mu"), Some(1.0));
```
*/

use ndarray::Array1;
use std::collections::BTreeMap;

/// A single parameter value: either a scalar or a fixed-length vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Vector(Array1<f64>),
}

impl Value {
    /// Number of scalar coordinates stored in this value.
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `other` has the same kind and the same length.
    pub fn same_shape(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Scalar(_), Value::Scalar(_)) => true,
            (Value::Vector(a), Value::Vector(b)) => a.len() == b.len(),
            _ => false,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            Value::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Array1<f64>> {
        match self {
            Value::Scalar(_) => None,
            Value::Vector(v) => Some(v),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<Array1<f64>> for Value {
    fn from(v: Array1<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(Array1::from(v))
    }
}

impl From<&[f64]> for Value {
    fn from(v: &[f64]) -> Self {
        Value::Vector(Array1::from(v.to_vec()))
    }
}

/// An ordered mapping from parameter names to values.
///
/// Parameters are kept in name order so that flattened views ([`coords`],
/// [`coord_names`]) are stable across steps and chains.
///
/// [`coords`]: Position::coords
/// [`coord_names`]: Position::coord_names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Position {
    params: BTreeMap<String, Value>,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.params.get(name).and_then(Value::as_scalar)
    }

    pub fn vector(&self, name: &str) -> Option<&Array1<f64>> {
        self.params.get(name).and_then(Value::as_vector)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of named parameters.
    pub fn n_params(&self) -> usize {
        self.params.len()
    }

    /// Total number of scalar coordinates across all parameters.
    pub fn n_coords(&self) -> usize {
        self.params.values().map(Value::len).sum()
    }

    /// True if `other` has the same parameter names, kinds, and vector
    /// lengths. Values are not compared.
    pub fn same_schema(&self, other: &Position) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|((ka, va), (kb, vb))| ka == kb && va.same_shape(vb))
    }

    /// A human-readable schema description, e.g. `["mu", "theta[8]"]`.
    pub fn schema_signature(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|(k, v)| match v {
                Value::Scalar(_) => k.clone(),
                Value::Vector(xs) => format!("{}[{}]", k, xs.len()),
            })
            .collect()
    }

    /// Flattened coordinate names in parameter order, vectors expanded as
    /// `name[0]`, `name[1]`, ...
    pub fn coord_names(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.n_coords());
        for (k, v) in &self.params {
            match v {
                Value::Scalar(_) => out.push(k.clone()),
                Value::Vector(xs) => out.extend((0..xs.len()).map(|i| format!("{}[{}]", k, i))),
            }
        }
        out
    }

    /// Flattened coordinate values, aligned with [`coord_names`].
    ///
    /// [`coord_names`]: Position::coord_names
    pub fn coords(&self) -> Array1<f64> {
        let mut out = Vec::with_capacity(self.n_coords());
        for v in self.params.values() {
            match v {
                Value::Scalar(x) => out.push(*x),
                Value::Vector(xs) => out.extend(xs.iter().copied()),
            }
        }
        Array1::from(out)
    }

    /// Applies `f` to every coordinate, returning a new position with the
    /// same schema.
    pub fn map(&self, mut f: impl FnMut(f64) -> f64) -> Position {
        let params = self
            .params
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::Scalar(x) => Value::Scalar(f(*x)),
                    Value::Vector(xs) => Value::Vector(xs.mapv(&mut f)),
                };
                (k.clone(), v)
            })
            .collect();
        Position { params }
    }
}

impl FromIterator<(String, Value)> for Position {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Position {
            params: iter.into_iter().collect(),
        }
    }
}
