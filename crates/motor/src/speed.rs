//! Speed shaping: elliptical direction-dependent speed caps and the slope
//! speed multiplier.

use glam::{Quat, Vec3};

use crate::config::MovementConfig;

/// Speed cap for a local-space direction.
///
/// Forward/backward and sideways limits are treated as the radii of an ellipse
/// in the horizontal plane, so oblique directions interpolate smoothly between
/// the caps. Only the direction matters: its length is normalized away.
pub fn max_speed_in_direction(config: &MovementConfig, direction: Vec3) -> f32 {
    if direction == Vec3::ZERO {
        return 0.0;
    }
    let longitudinal = if direction.z > 0.0 {
        config.max_forward_speed
    } else {
        config.max_backwards_speed
    };
    let z_multiplier = longitudinal / config.max_sideways_speed;
    let squashed = Vec3::new(direction.x, 0.0, direction.z / z_multiplier).normalize_or_zero();
    Vec3::new(squashed.x, 0.0, squashed.z * z_multiplier).length() * config.max_sideways_speed
}

/// Travel slope angle in degrees, from the direction of `velocity`.
pub fn movement_slope_angle(velocity: Vec3) -> f32 {
    velocity.normalize_or_zero().y.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Desired world-space horizontal velocity for a world-space input direction.
///
/// The input is measured in the character's local frame (given by
/// `rotation`) so forward/backward caps follow the way the character faces.
/// On the ground the cap is scaled by the slope speed curve, evaluated at the
/// angle the character is currently travelling along.
pub fn desired_horizontal_velocity(
    config: &MovementConfig,
    rotation: Quat,
    input_direction: Vec3,
    grounded: bool,
    velocity: Vec3,
) -> Vec3 {
    let local = rotation.inverse() * input_direction;
    let mut max_speed = max_speed_in_direction(config, local);
    if grounded {
        max_speed *= config
            .slope_speed_multiplier
            .evaluate(movement_slope_angle(velocity));
    }
    rotation * (local * max_speed)
}
