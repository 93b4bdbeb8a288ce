use glam::{Quat, Vec3};

/// Below this length a vector is treated as having no direction.
const DIRECTION_EPSILON: f32 = 1e-6;

/// Drop the vertical component.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Project `v` onto `onto`. Returns zero when `onto` has no length.
pub fn project_on(v: Vec3, onto: Vec3) -> Vec3 {
    let len_sq = onto.length_squared();
    if len_sq < DIRECTION_EPSILON * DIRECTION_EPSILON {
        return Vec3::ZERO;
    }
    onto * (v.dot(onto) / len_sq)
}

/// Spherical interpolation between two directions, with the magnitude
/// interpolated linearly.
///
/// If either input is degenerate the result is `from`, so a missing ground
/// normal never bends a jump.
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let from_len = from.length();
    let to_len = to.length();
    if from_len < DIRECTION_EPSILON || to_len < DIRECTION_EPSILON {
        return from;
    }
    let a = from / from_len;
    let b = to / to_len;
    let partial = Quat::IDENTITY.slerp(Quat::from_rotation_arc(a, b), t);
    (partial * a) * (from_len + (to_len - from_len) * t)
}
