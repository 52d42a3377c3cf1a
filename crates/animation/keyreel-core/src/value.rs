//! Leaf values held in snapshots and the interpolation rule attached to each.

use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Value`], used for structure checks and dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Scalar,
    Integer,
    Vector,
    IntVector,
    Matrix,
    Bool,
    Categorical,
    Text,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Integer => "integer",
            ValueKind::Vector => "vector",
            ValueKind::IntVector => "int_vector",
            ValueKind::Matrix => "matrix",
            ValueKind::Bool => "bool",
            ValueKind::Categorical => "categorical",
            ValueKind::Text => "text",
        }
    }

    /// Kinds with a continuous interpolant.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueKind::Scalar
                | ValueKind::Integer
                | ValueKind::Vector
                | ValueKind::IntVector
                | ValueKind::Matrix
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    /// Real-valued scalar (opacity, gamma, zoom, ...)
    Scalar(f64),
    /// Integer scalar; interpolates linearly and truncates toward zero
    Integer(i64),
    /// Fixed-length numeric vector (center, scale, translate, angles, ...)
    Vector(Vec<f64>),
    /// Fixed-length integer vector (dims current step, axis order)
    IntVector(Vec<i64>),
    /// Row-major matrix (layer rotate / affine)
    Matrix(Vec<Vec<f64>>),
    /// Step-only boolean
    Bool(bool),
    /// Step-only enumerated label (blending, colormap name, ...)
    Categorical(String),
    /// Step-only free text
    Text(String),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Integer(_) => ValueKind::Integer,
            Value::Vector(_) => ValueKind::Vector,
            Value::IntVector(_) => ValueKind::IntVector,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::Bool(_) => ValueKind::Bool,
            Value::Categorical(_) => ValueKind::Categorical,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Shape description used in mismatch diagnostics, e.g. `vector[3]`.
    pub fn shape(&self) -> String {
        match self {
            Value::Vector(v) => format!("vector[{}]", v.len()),
            Value::IntVector(v) => format!("int_vector[{}]", v.len()),
            Value::Matrix(rows) => {
                let cols = rows.first().map(Vec::len).unwrap_or(0);
                format!("matrix[{}x{}]", rows.len(), cols)
            }
            other => other.kind().name().to_string(),
        }
    }

    /// Whether two values have the same kind and the same dimensions.
    pub fn same_shape(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Vector(a), Value::Vector(b)) => a.len() == b.len(),
            (Value::IntVector(a), Value::IntVector(b)) => a.len() == b.len(),
            (Value::Matrix(a), Value::Matrix(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(ra, rb)| ra.len() == rb.len())
            }
            _ => self.kind() == other.kind(),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        if let Value::Vector(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Convenience constructors
    pub fn vec3(x: f64, y: f64, z: f64) -> Self {
        Value::Vector(vec![x, y, z])
    }

    pub fn label(s: impl Into<String>) -> Self {
        Value::Categorical(s.into())
    }
}

/// How a leaf moves between two keyframes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationKind {
    /// Linear for numeric kinds, midpoint step for everything else.
    #[default]
    Default,
    /// Geometric interpolation for strictly positive scale factors (zoom).
    Log,
    /// Shortest-arc quaternion slerp over an Euler-angle triple in degrees.
    Slerp,
    /// Switch from start to end value at the midpoint.
    Step,
}

impl InterpolationKind {
    pub fn name(&self) -> &'static str {
        match self {
            InterpolationKind::Default => "default",
            InterpolationKind::Log => "log",
            InterpolationKind::Slerp => "slerp",
            InterpolationKind::Step => "step",
        }
    }
}

/// A snapshot leaf: the captured value plus the rule used to interpolate it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Leaf {
    pub value: Value,
    #[serde(default, skip_serializing_if = "is_default_kind")]
    pub interpolation: InterpolationKind,
}

fn is_default_kind(kind: &InterpolationKind) -> bool {
    *kind == InterpolationKind::Default
}

impl Leaf {
    pub fn new(value: Value, interpolation: InterpolationKind) -> Self {
        Self {
            value,
            interpolation,
        }
    }
}

impl From<Value> for Leaf {
    fn from(value: Value) -> Self {
        Leaf::new(value, InterpolationKind::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_compare_dimensions() {
        assert!(Value::vec3(0.0, 1.0, 2.0).same_shape(&Value::vec3(5.0, 5.0, 5.0)));
        assert!(!Value::Vector(vec![0.0; 2]).same_shape(&Value::vec3(0.0, 0.0, 0.0)));
        assert!(!Value::Scalar(1.0).same_shape(&Value::Integer(1)));
        let m3 = Value::Matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let m_bad = Value::Matrix(vec![vec![1.0, 0.0], vec![0.0]]);
        assert!(!m3.same_shape(&m_bad));
        assert_eq!(m3.shape(), "matrix[2x2]");
    }

    #[test]
    fn leaf_serializes_without_default_kind() {
        let leaf = Leaf::from(Value::Scalar(0.5));
        let json = serde_json::to_value(&leaf).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "value": { "type": "scalar", "data": 0.5 } })
        );

        let zoom = Leaf::new(Value::Scalar(2.0), InterpolationKind::Log);
        let json = serde_json::to_string(&zoom).unwrap();
        let back: Leaf = serde_json::from_str(&json).unwrap();
        assert_eq!(back, zoom);
    }
}
