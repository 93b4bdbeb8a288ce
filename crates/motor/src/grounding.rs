//! Ground classification from mover contacts, and grounded/airborne
//! transitions after each move.

use glam::Vec3;

use crate::events::MotorEvent;
use crate::host::{ContactEvent, TransformProvider};
use crate::motor::CharacterMotor;

/// Minimum ground normal y for the character to count as grounded.
pub const GROUNDED_NORMAL_Y: f32 = 0.01;

/// Contacts closer than this (squared distance) to the previous hit point
/// reuse the previous ground normal.
pub const HIT_POINT_EPSILON_SQ: f32 = 0.001;

/// Canonical grounded test on a ground normal.
pub fn is_grounded_normal(ground_normal: Vec3) -> bool {
    ground_normal.y > GROUNDED_NORMAL_Y
}

/// Whether a surface with `normal` is steeper than `slope_limit_degrees`.
pub fn is_too_steep(normal: Vec3, slope_limit_degrees: f32) -> bool {
    normal.y <= slope_limit_degrees.to_radians().cos()
}

impl CharacterMotor {
    /// Feed one contact from the mover into the ground estimate.
    pub(crate) fn classify_contact(&mut self, contact: &ContactEvent) {
        let current = self.runtime.ground_normal;
        if !(contact.normal.y > 0.0 && contact.normal.y > current.y && contact.move_direction.y < 0.0) {
            return;
        }

        let moved_on = (contact.point - self.movement.last_hit_point).length_squared() > HIT_POINT_EPSILON_SQ;
        self.runtime.ground_normal = if moved_on || self.runtime.last_ground_normal == Vec3::ZERO {
            contact.normal
        } else {
            self.runtime.last_ground_normal
        };

        self.platform.hit_platform = contact.body;
        self.movement.hit_point = contact.point;
        // Standing on something ends any carried platform inertia.
        self.movement.frame_velocity = Vec3::ZERO;
    }

    /// Evaluate landing and leaving after the move.
    pub(crate) fn apply_ground_transitions<H: TransformProvider + ?Sized>(&mut self, host: &mut H, push_down: f32) {
        let supported = is_grounded_normal(self.runtime.ground_normal);

        if self.runtime.grounded && !supported {
            self.runtime.grounded = false;

            if self.config.moving_platform.enabled && self.config.transfer().inherits_velocity() {
                self.movement.frame_velocity = self.platform.platform_velocity;
                self.movement.velocity += self.platform.platform_velocity;
            }
            self.cancel_pending_subtraction("left the ground");

            // The push-down only existed to keep contact; undo it for a smooth fall.
            host.translate(Vec3::Y * push_down);

            tracing::debug!(velocity = ?self.movement.velocity, "fell");
            self.push_event(MotorEvent::Fell);
        } else if !self.runtime.grounded && supported {
            self.runtime.grounded = true;
            self.jumping.jumping = false;
            self.begin_platform_velocity_subtraction();

            tracing::debug!(platform = ?self.platform.active_platform, "landed");
            self.push_event(MotorEvent::Landed {
                platform: self.platform.active_platform,
            });
        }
    }
}
