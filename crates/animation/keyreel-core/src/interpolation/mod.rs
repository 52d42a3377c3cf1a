//! Type-dispatched snapshot interpolation.
//!
//! Each leaf carries its own [`InterpolationKind`]; dispatch is a match on
//! that rule and the pair of values:
//! - `Default`: numeric kinds interpolate linearly (integers truncate),
//!   everything else steps at the midpoint.
//! - `Log`: geometric interpolation of strictly positive scalars.
//! - `Slerp`: shortest-arc quaternion slerp of a 3-vector of Euler angles.
//! - `Step`: midpoint switch for any kind.
//!
//! `t == 0` and `t == 1` return clones of the endpoints, so the boundary
//! frames are bit-exact regardless of the rule.

pub mod functions;

use indexmap::IndexMap;

use crate::error::KeyreelError;
use crate::path::AttrPath;
use crate::snapshot::{check_leaves, missing_key, Node, Snapshot};
use crate::value::{InterpolationKind, Leaf, Value};
use functions::{lerp, lerp_int, lerp_log, lerp_slice, slerp_euler, step};

/// Interpolate two snapshots of identical structure at fraction `t`.
///
/// Fails with [`KeyreelError::StructureMismatch`] when the path sets, value
/// shapes or interpolation rules differ, with
/// [`KeyreelError::UnsupportedRule`] when a rule does not fit its value, and with
/// [`KeyreelError::InvalidFraction`] for non-finite `t`. Values of `t`
/// outside `[0, 1]` (overshooting easings) extrapolate continuous leaves.
pub fn interpolate(a: &Snapshot, b: &Snapshot, t: f64) -> Result<Snapshot, KeyreelError> {
    check_fraction(t)?;
    let mut stack: Vec<&str> = Vec::new();
    let root = interpolate_group(a.root(), b.root(), t, &mut stack)?;
    Ok(Snapshot::from_root(root))
}

/// Interpolate a single leaf. `path` is used for diagnostics only.
pub fn interpolate_leaf(
    path: &AttrPath,
    a: &Leaf,
    b: &Leaf,
    t: f64,
) -> Result<Leaf, KeyreelError> {
    check_fraction(t)?;
    check_leaves(path, a, b)?;
    if t == 0.0 {
        return Ok(a.clone());
    }
    if t == 1.0 {
        return Ok(b.clone());
    }
    let value = match a.interpolation {
        InterpolationKind::Default => default_value(&a.value, &b.value, t),
        InterpolationKind::Step => step(&a.value, &b.value, t).clone(),
        InterpolationKind::Log => log_value(path, &a.value, &b.value, t)?,
        InterpolationKind::Slerp => slerp_value(path, &a.value, &b.value, t)?,
    };
    Ok(Leaf::new(value, a.interpolation))
}

fn check_fraction(t: f64) -> Result<(), KeyreelError> {
    if t.is_finite() {
        Ok(())
    } else {
        Err(KeyreelError::InvalidFraction { t })
    }
}

fn interpolate_group<'a>(
    a: &'a IndexMap<String, Node>,
    b: &'a IndexMap<String, Node>,
    t: f64,
    stack: &mut Vec<&'a str>,
) -> Result<IndexMap<String, Node>, KeyreelError> {
    if let Some((key, only_in_b)) = missing_key(a, b) {
        stack.push(key);
        let side = if only_in_b { "start" } else { "end" };
        return Err(KeyreelError::mismatch(
            &AttrPath::from_stack(stack),
            format!("missing from {side} snapshot"),
        ));
    }
    let mut out = IndexMap::with_capacity(a.len());
    for (key, na) in a {
        stack.push(key);
        let node = match (na, &b[key.as_str()]) {
            (Node::Group(ga), Node::Group(gb)) => {
                Node::Group(interpolate_group(ga, gb, t, stack)?)
            }
            (Node::Leaf(la), Node::Leaf(lb)) => {
                Node::Leaf(interpolate_leaf(&AttrPath::from_stack(stack), la, lb, t)?)
            }
            _ => {
                return Err(KeyreelError::mismatch(
                    &AttrPath::from_stack(stack),
                    "group in one snapshot, leaf in the other",
                ))
            }
        };
        stack.pop();
        out.insert(key.clone(), node);
    }
    Ok(out)
}

/// Shapes have already been checked equal.
fn default_value(a: &Value, b: &Value, t: f64) -> Value {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(lerp(*x, *y, t)),
        (Value::Integer(x), Value::Integer(y)) => Value::Integer(lerp_int(*x, *y, t)),
        (Value::Vector(x), Value::Vector(y)) => Value::Vector(lerp_slice(x, y, t)),
        (Value::IntVector(x), Value::IntVector(y)) => Value::IntVector(
            x.iter()
                .zip(y.iter())
                .map(|(p, q)| lerp_int(*p, *q, t))
                .collect(),
        ),
        (Value::Matrix(x), Value::Matrix(y)) => Value::Matrix(
            x.iter()
                .zip(y.iter())
                .map(|(rx, ry)| lerp_slice(rx, ry, t))
                .collect(),
        ),
        // Bool, categorical and text have no continuous interpolant.
        _ => step(a, b, t).clone(),
    }
}

fn log_value(path: &AttrPath, a: &Value, b: &Value, t: f64) -> Result<Value, KeyreelError> {
    let (x, y) = match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => (*x, *y),
        _ => {
            return Err(KeyreelError::UnsupportedRule {
                path: path.clone(),
                rule: InterpolationKind::Log.name(),
                found: a.shape(),
            })
        }
    };
    for v in [x, y] {
        if v <= 0.0 || !v.is_finite() {
            return Err(KeyreelError::NonPositiveLogValue {
                path: path.clone(),
                value: v,
            });
        }
    }
    Ok(Value::Scalar(lerp_log(x, y, t)))
}

fn slerp_value(path: &AttrPath, a: &Value, b: &Value, t: f64) -> Result<Value, KeyreelError> {
    match (a, b) {
        (Value::Vector(x), Value::Vector(y)) if x.len() == 3 => {
            let angles = slerp_euler([x[0], x[1], x[2]], [y[0], y[1], y[2]], t);
            Ok(Value::Vector(angles.to_vec()))
        }
        _ => Err(KeyreelError::UnsupportedRule {
            path: path.clone(),
            rule: InterpolationKind::Slerp.name(),
            found: a.shape(),
        }),
    }
}
