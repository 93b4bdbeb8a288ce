//! Gravity, terminal velocity, jump takeoff and variable jump height.

use glam::Vec3;
use locomotor_common::slerp_direction;

use crate::events::MotorEvent;
use crate::motor::CharacterMotor;

/// How long a jump press stays buffered before landing (s).
pub const JUMP_BUFFER_TIME: f64 = 0.2;

/// Takeoff speed needed to reach `height` against `gravity`.
pub fn jump_vertical_speed(height: f32, gravity: f32) -> f32 {
    (2.0 * height * gravity).sqrt()
}

impl CharacterMotor {
    /// Update jump-button bookkeeping from this tick's input.
    fn track_jump_button(&mut self) {
        let jumping = &mut self.jumping;
        if !self.runtime.input_jump || !self.runtime.can_control {
            jumping.holding_jump_button = false;
            jumping.clear_button();
        }
        if self.runtime.input_jump && !jumping.button_pressed() && self.runtime.can_control {
            jumping.last_button_down_time = self.time;
        }
    }

    /// Seconds after takeoff during which a held button cancels gravity.
    fn extra_height_window(&self) -> f64 {
        let base_speed = self.calculate_jump_vertical_speed(self.config.jumping.base_height);
        if base_speed <= 0.0 {
            return 0.0;
        }
        f64::from(self.config.jumping.extra_height / base_speed)
    }

    pub(crate) fn apply_gravity_and_jumping(&mut self, mut velocity: Vec3, dt: f32) -> Vec3 {
        self.track_jump_button();

        let gravity = self.config.movement.gravity;
        if self.runtime.grounded {
            // Only ever pull down; steps up are the mover's job.
            velocity.y = velocity.y.min(0.0) - gravity * dt;
        } else {
            velocity.y = self.movement.velocity.y - gravity * dt;

            if self.jumping.jumping
                && self.jumping.holding_jump_button
                && self.time < self.jumping.last_start_time + self.extra_height_window()
            {
                // Cancel the gravity just applied, pushing along the jump direction.
                velocity += self.jumping.jump_dir * gravity * dt;
            }

            velocity.y = velocity.y.max(-self.config.movement.max_fall_speed);
        }

        if self.runtime.grounded {
            let buffered = self.time - self.jumping.last_button_down_time < JUMP_BUFFER_TIME;
            if self.config.jumping.enabled && self.runtime.can_control && buffered {
                velocity = self.take_off(velocity);
            } else {
                self.jumping.holding_jump_button = false;
            }
        }
        velocity
    }

    fn take_off(&mut self, mut velocity: Vec3) -> Vec3 {
        self.runtime.grounded = false;
        self.jumping.jumping = true;
        self.jumping.last_start_time = self.time;
        self.jumping.clear_button();
        self.jumping.holding_jump_button = true;

        let perp = if self.too_steep() {
            self.config.jumping.steep_perp_amount
        } else {
            self.config.jumping.perp_amount
        };
        self.jumping.jump_dir = slerp_direction(Vec3::Y, self.runtime.ground_normal, perp);

        velocity.y = 0.0;
        velocity += self.jumping.jump_dir
            * self.calculate_jump_vertical_speed(self.config.jumping.base_height);

        if self.config.moving_platform.enabled && self.config.transfer().inherits_velocity() {
            self.movement.frame_velocity = self.platform.platform_velocity;
            velocity += self.platform.platform_velocity;
        }

        tracing::debug!(?velocity, jump_dir = ?self.jumping.jump_dir, "jump");
        self.push_event(MotorEvent::Jumped { velocity });
        velocity
    }
}
