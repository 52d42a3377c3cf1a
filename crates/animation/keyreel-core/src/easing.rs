//! Easing functions: pure remaps of linear progress `u ∈ [0,1]` to eased progress.
//!
//! Presets follow the classic Penner/AHEasing family. Named presets without a
//! suffix (`"cubic"`, `"sine"`, ...) are the symmetric in-out curves; `_in` and
//! `_out` select one-sided forms. `ease_in`, `ease_out` and `ease_in_out` are
//! aliases for the cubic curves. `back` and `elastic` overshoot `[0,1]` between
//! the endpoints; every curve maps 0 to 0 and 1 to 1.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use crate::error::KeyreelError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Curve {
    Quadratic,
    Cubic,
    Quintic,
    Sine,
    Circular,
    Exponential,
    Elastic,
    Back,
    Bounce,
}

impl Curve {
    pub const ALL: [Curve; 9] = [
        Curve::Quadratic,
        Curve::Cubic,
        Curve::Quintic,
        Curve::Sine,
        Curve::Circular,
        Curve::Exponential,
        Curve::Elastic,
        Curve::Back,
        Curve::Bounce,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Curve::Quadratic => "quadratic",
            Curve::Cubic => "cubic",
            Curve::Quintic => "quintic",
            Curve::Sine => "sine",
            Curve::Circular => "circular",
            Curve::Exponential => "exponential",
            Curve::Elastic => "elastic",
            Curve::Back => "back",
            Curve::Bounce => "bounce",
        }
    }

    fn from_name(name: &str) -> Option<Curve> {
        Curve::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Accelerating form on [0,1].
    fn ease_in(&self, p: f64) -> f64 {
        match self {
            Curve::Quadratic => p * p,
            Curve::Cubic => p * p * p,
            Curve::Quintic => p * p * p * p * p,
            Curve::Sine => 1.0 - (p * FRAC_PI_2).cos(),
            Curve::Circular => 1.0 - (1.0 - p * p).max(0.0).sqrt(),
            Curve::Exponential => {
                if p <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * (p - 1.0))
                }
            }
            Curve::Elastic => {
                if p <= 0.0 || p >= 1.0 {
                    return p.clamp(0.0, 1.0);
                }
                (13.0 * FRAC_PI_2 * p).sin() * 2f64.powf(10.0 * (p - 1.0))
            }
            Curve::Back => p * p * p - p * (p * PI).sin(),
            Curve::Bounce => 1.0 - bounce_out(1.0 - p),
        }
    }

    /// Decelerating form, the mirror of `ease_in`.
    fn ease_out(&self, p: f64) -> f64 {
        match self {
            Curve::Bounce => bounce_out(p),
            _ => 1.0 - self.ease_in(1.0 - p),
        }
    }

    fn ease_in_out(&self, p: f64) -> f64 {
        if p < 0.5 {
            0.5 * self.ease_in(2.0 * p)
        } else {
            0.5 * self.ease_out(2.0 * p - 1.0) + 0.5
        }
    }
}

fn bounce_out(p: f64) -> f64 {
    if p < 4.0 / 11.0 {
        (121.0 * p * p) / 16.0
    } else if p < 8.0 / 11.0 {
        (363.0 / 40.0 * p * p) - (99.0 / 10.0 * p) + 17.0 / 5.0
    } else if p < 9.0 / 10.0 {
        (4356.0 / 361.0 * p * p) - (35442.0 / 1805.0 * p) + 16061.0 / 1805.0
    } else {
        (54.0 / 5.0 * p * p) - (513.0 / 25.0 * p) + 268.0 / 25.0
    }
}

/// Easing applied to a transition into a keyframe.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    In(Curve),
    Out(Curve),
    InOut(Curve),
    /// CSS-style cubic-bezier timing with control points (x1, y1, x2, y2).
    CubicBezier([f64; 4]),
}

impl Easing {
    pub const EASE_IN: Easing = Easing::In(Curve::Cubic);
    pub const EASE_OUT: Easing = Easing::Out(Curve::Cubic);
    pub const EASE_IN_OUT: Easing = Easing::InOut(Curve::Cubic);

    /// Map linear progress to eased progress. Endpoints are exact.
    pub fn ease(&self, u: f64) -> f64 {
        if u <= 0.0 {
            return 0.0;
        }
        if u >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => u,
            Easing::In(c) => c.ease_in(u),
            Easing::Out(c) => c.ease_out(u),
            Easing::InOut(c) => c.ease_in_out(u),
            Easing::CubicBezier([x1, y1, x2, y2]) => bezier_ease(u, *x1, *y1, *x2, *y2),
        }
    }

    /// Preset name (`"linear"`, `"cubic"`, `"sine_in"`, ...). Bezier curves
    /// are rendered as `cubic_bezier(x1,y1,x2,y2)`.
    pub fn name(&self) -> String {
        match self {
            Easing::Linear => "linear".to_string(),
            Easing::InOut(c) => c.name().to_string(),
            Easing::In(c) => format!("{}_in", c.name()),
            Easing::Out(c) => format!("{}_out", c.name()),
            Easing::CubicBezier([x1, y1, x2, y2]) => {
                format!("cubic_bezier({x1},{y1},{x2},{y2})")
            }
        }
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p1: f64, p2: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

/// Invert the x bezier by bisection, then evaluate y.
fn bezier_ease(u: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x1 == y1 && x2 == y2 {
        return u;
    }
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = u;
    for _ in 0..48 {
        let x = cubic_bezier(x1, x2, mid);
        if (x - u).abs() < 1e-9 {
            break;
        }
        if x < u {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(y1, y2, mid)
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Easing {
    type Err = KeyreelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let unknown = || KeyreelError::UnknownEasing {
            name: s.to_string(),
        };
        match name.as_str() {
            "linear" => return Ok(Easing::Linear),
            "ease_in" => return Ok(Easing::EASE_IN),
            "ease_out" => return Ok(Easing::EASE_OUT),
            "ease_in_out" => return Ok(Easing::EASE_IN_OUT),
            _ => {}
        }
        if let Some(args) = name
            .strip_prefix("cubic_bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parsed: Vec<f64> = args
                .split(',')
                .map(|a| a.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| unknown())?;
            let ctrl: [f64; 4] = parsed.try_into().map_err(|_| unknown())?;
            return Ok(Easing::CubicBezier(ctrl));
        }
        if let Some(curve) = name.strip_suffix("_in").and_then(Curve::from_name) {
            return Ok(Easing::In(curve));
        }
        if let Some(curve) = name.strip_suffix("_out").and_then(Curve::from_name) {
            return Ok(Easing::Out(curve));
        }
        if let Some(curve) = name.strip_suffix("_in_out").and_then(Curve::from_name) {
            return Ok(Easing::InOut(curve));
        }
        Curve::from_name(&name).map(Easing::InOut).ok_or_else(unknown)
    }
}

// Serialized as the preset name, or `{ "bezier": [x1, y1, x2, y2] }`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EasingRepr {
    Named(String),
    Bezier { bezier: [f64; 4] },
}

impl Serialize for Easing {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            Easing::CubicBezier(ctrl) => EasingRepr::Bezier { bezier: *ctrl },
            other => EasingRepr::Named(other.name()),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match EasingRepr::deserialize(deserializer)? {
            EasingRepr::Named(name) => name.parse().map_err(serde::de::Error::custom),
            EasingRepr::Bezier { bezier } => Ok(Easing::CubicBezier(bezier)),
        }
    }
}
