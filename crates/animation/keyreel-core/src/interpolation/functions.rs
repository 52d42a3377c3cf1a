//! Leaf interpolation helpers:
//! - lerp / lerp_log (scalar and log-space scalar)
//! - slerp_quat (shortest-arc quaternion slerp, NLERP near parallel)
//! - slerp_euler (viewer camera angles, degrees)
//! - step (midpoint switch)

use nalgebra::{Quaternion, UnitQuaternion};

/// Below this angular separation slerp falls back to normalized lerp.
const SLERP_DOT_THRESHOLD: f64 = 0.9995;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Element-wise linear interpolation. Callers guarantee equal lengths.
#[inline]
pub fn lerp_slice(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| lerp(*x, *y, t)).collect()
}

/// Linear interpolation truncated toward zero, matching integer-valued
/// viewer attributes such as dims steps.
#[inline]
pub fn lerp_int(a: i64, b: i64, t: f64) -> i64 {
    lerp(a as f64, b as f64, t).trunc() as i64
}

/// Geometric interpolation: `exp(ln a + t (ln b - ln a))`.
/// Both endpoints must be strictly positive.
#[inline]
pub fn lerp_log(a: f64, b: f64, t: f64) -> f64 {
    let (la, lb) = (a.ln(), b.ln());
    lerp(la, lb, t).exp()
}

/// Step: start value strictly before the midpoint, end value from it on.
#[inline]
pub fn step<'a, T>(a: &'a T, b: &'a T, t: f64) -> &'a T {
    if t < 0.5 {
        a
    } else {
        b
    }
}

/// Spherical linear interpolation between unit quaternions along the shorter arc.
/// If the dot product is negative the second quaternion is negated first, so the
/// traversal never exceeds 180 degrees of rotation.
pub fn slerp_quat(
    a: &UnitQuaternion<f64>,
    b: &UnitQuaternion<f64>,
    t: f64,
) -> UnitQuaternion<f64> {
    let qa = a.coords;
    let mut qb = b.coords;
    let mut d = qa.dot(&qb);
    if d < 0.0 {
        qb = -qb;
        d = -d;
    }
    if d > SLERP_DOT_THRESHOLD {
        return UnitQuaternion::new_normalize(Quaternion::from(qa.lerp(&qb, t)));
    }
    let theta = d.min(1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    UnitQuaternion::new_normalize(Quaternion::from(qa * wa + qb * wb))
}

/// Camera angles (degrees) to a rotation.
///
/// The viewer stores angles as an intrinsic Z-Y'-X'' triple: `angles[0]` about
/// Z, then `angles[1]` about the new Y, then `angles[2]` about the new X.
pub fn euler_to_quat(angles: [f64; 3]) -> UnitQuaternion<f64> {
    let [z, y, x] = angles.map(f64::to_radians);
    // nalgebra builds Rz(yaw) * Ry(pitch) * Rx(roll).
    UnitQuaternion::from_euler_angles(x, y, z)
}

/// Inverse of [`euler_to_quat`], in degrees.
pub fn quat_to_euler(q: &UnitQuaternion<f64>) -> [f64; 3] {
    let (x, y, z) = q.euler_angles();
    [z.to_degrees(), y.to_degrees(), x.to_degrees()]
}

/// Slerp between two camera angle triples (degrees).
pub fn slerp_euler(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    let qa = euler_to_quat(a);
    let qb = euler_to_quat(b);
    quat_to_euler(&slerp_quat(&qa, &qb, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lerp_log_is_geometric() {
        assert_abs_diff_eq!(lerp_log(1.0, 4.0, 0.5), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lerp_log(1.0, 10.0, 0.25), 10f64.powf(0.25), epsilon = 1e-12);
    }

    #[test]
    fn lerp_int_truncates() {
        assert_eq!(lerp_int(0, 10, 0.55), 5);
        assert_eq!(lerp_int(10, 0, 0.55), 4);
        assert_eq!(lerp_int(3, 7, 1.0), 7);
    }

    #[test]
    fn step_switches_at_midpoint() {
        assert!(!*step(&false, &true, 0.49));
        assert!(*step(&false, &true, 0.5));
    }

    #[test]
    fn euler_round_trip() {
        for angles in [[0.0, 0.0, 0.0], [30.0, -20.0, 45.0], [-120.0, 10.0, 170.0]] {
            let back = quat_to_euler(&euler_to_quat(angles));
            for i in 0..3 {
                assert_abs_diff_eq!(back[i], angles[i], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn euler_convention_is_intrinsic_zyx() {
        // 90 degrees about Z maps the X axis onto Y.
        let q = euler_to_quat([90.0, 0.0, 0.0]);
        let v = q * nalgebra::Vector3::x();
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn slerp_takes_shorter_arc() {
        let a = euler_to_quat([0.0, 0.0, 0.0]);
        let b = euler_to_quat([190.0, 0.0, 0.0]);
        let mid = slerp_quat(&a, &b, 0.5);
        // The short way round is -170 degrees, so halfway is -85.
        assert_abs_diff_eq!(a.angle_to(&mid), 85f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(quat_to_euler(&mid)[0], -85.0, epsilon = 1e-9);
    }

    #[test]
    fn slerp_near_parallel_uses_nlerp() {
        let a = euler_to_quat([10.0, 0.0, 0.0]);
        let b = euler_to_quat([10.5, 0.0, 0.0]);
        let mid = slerp_quat(&a, &b, 0.5);
        assert_abs_diff_eq!(quat_to_euler(&mid)[0], 10.25, epsilon = 1e-4);
    }
}
