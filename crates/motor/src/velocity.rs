//! Velocity resolution: desired velocity from input, sliding and platform
//! inertia, then acceleration-limited blending toward it.

use glam::{Quat, Vec3};
use locomotor_common::{horizontal, project_on};

use crate::config::SlidingConfig;
use crate::motor::CharacterMotor;
use crate::speed::desired_horizontal_velocity;

/// Desired velocity on a too-steep surface: down the slope, with limited
/// player influence along and across the slide direction.
pub fn sliding_velocity(config: &SlidingConfig, ground_normal: Vec3, input: Vec3) -> Vec3 {
    let slide_dir = horizontal(ground_normal).normalize_or_zero();
    let along = project_on(input, slide_dir);
    let across = input - along;
    (slide_dir + along * config.speed_control + across * config.sideways_control)
        * config.sliding_speed
}

/// Re-aim a horizontal velocity so it follows the ground surface while
/// keeping its magnitude.
pub fn adjust_ground_velocity_to_normal(h_velocity: Vec3, ground_normal: Vec3) -> Vec3 {
    let sideways = Vec3::Y.cross(h_velocity);
    sideways.cross(ground_normal).normalize_or_zero() * h_velocity.length()
}

/// Clamp `change` to at most `max_change` in length.
pub fn limit_velocity_change(change: Vec3, max_change: f32) -> Vec3 {
    if change.length_squared() > max_change * max_change {
        change.normalize_or_zero() * max_change
    } else {
        change
    }
}

impl CharacterMotor {
    /// Velocity the character wants this tick, before acceleration limits.
    pub(crate) fn desired_velocity(&self, rotation: Quat) -> Vec3 {
        let runtime = &self.runtime;
        let config = &self.config;

        let mut desired = if runtime.grounded && self.too_steep() {
            sliding_velocity(&config.sliding, runtime.ground_normal, runtime.input_move_direction)
        } else {
            desired_horizontal_velocity(
                &config.movement,
                rotation,
                runtime.input_move_direction,
                runtime.grounded,
                self.movement.velocity,
            )
        };

        if config.moving_platform.enabled && config.transfer().carries_frame_velocity() {
            desired += self.movement.frame_velocity;
            desired.y = 0.0;
        }

        if runtime.grounded {
            desired = adjust_ground_velocity_to_normal(desired, runtime.ground_normal);
        }
        desired
    }

    /// Blend `velocity` toward the desired velocity.
    pub(crate) fn apply_input_velocity_change(&mut self, mut velocity: Vec3, rotation: Quat, dt: f32) -> Vec3 {
        if !self.runtime.can_control {
            self.runtime.input_move_direction = Vec3::ZERO;
        }

        let desired = self.desired_velocity(rotation);
        let grounded = self.runtime.grounded;
        if !grounded {
            // Vertical motion in the air belongs to gravity.
            velocity.y = 0.0;
        }

        let max_change = self.max_acceleration(grounded) * dt;
        let change = limit_velocity_change(desired - velocity, max_change);

        // Airborne without control keeps pure momentum; on the ground the
        // change still applies and acts as friction.
        if grounded || self.runtime.can_control {
            velocity += change;
        }

        if grounded {
            // The mover lifts the character uphill; never inject upward speed.
            velocity.y = velocity.y.min(0.0);
        }
        velocity
    }
}
