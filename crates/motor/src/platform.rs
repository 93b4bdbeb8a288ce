//! Moving platform tracking.
//!
//! The character's contact point is stored in the platform's local space.
//! Each tick the platform's new transform maps that point back to the world,
//! and the difference is the ride-along displacement. Platform velocity is
//! derived the same way from consecutive matrices.

use glam::{EulerRot, Vec3};
use locomotor_common::BodyId;

use crate::host::CharacterHost;
use crate::motor::CharacterMotor;
use crate::state::PendingSubtraction;

/// Ticks to wait after landing on a new platform before its velocity estimate
/// can be trusted.
pub const NEW_PLATFORM_SETTLE_TICKS: u8 = 2;

impl CharacterMotor {
    /// Whether the character is carried by its active platform this tick.
    pub(crate) fn move_with_platform(&self) -> bool {
        self.config.moving_platform.enabled
            && (self.runtime.grounded || self.config.transfer().locks_to_platform())
            && self.platform.active_platform.is_some()
    }

    /// Sample the active platform and derive its velocity at the tracked point.
    pub(crate) fn update_platform_velocity<H: CharacterHost + ?Sized>(&mut self, host: &H, dt: f32) {
        if !self.config.moving_platform.enabled {
            return;
        }
        let Some(active) = self.platform.active_platform else {
            self.platform.platform_velocity = Vec3::ZERO;
            return;
        };
        let Some(transform) = host.platform_transform(active) else {
            self.drop_platform(active);
            return;
        };

        let matrix = transform.matrix();
        if !self.platform.new_platform {
            let local = self.platform.active_local_point;
            self.platform.platform_velocity =
                (matrix.transform_point3(local) - self.platform.last_matrix.transform_point3(local)) / dt;
        }
        self.platform.last_matrix = matrix;
        self.platform.new_platform = false;
    }

    /// Count down a pending subtraction and apply it once it settles.
    pub(crate) fn advance_pending_subtraction(&mut self) {
        let Some(mut pending) = self.pending_subtraction else {
            return;
        };
        if !self.runtime.grounded {
            self.cancel_pending_subtraction("left the ground");
            return;
        }
        if self.platform.active_platform != Some(pending.platform) {
            self.cancel_pending_subtraction("changed platform");
            return;
        }

        pending.ticks_remaining = pending.ticks_remaining.saturating_sub(1);
        if pending.ticks_remaining > 0 {
            self.pending_subtraction = Some(pending);
            return;
        }

        self.pending_subtraction = None;
        self.movement.velocity -= self.platform.platform_velocity;
        tracing::debug!(
            platform_velocity = ?self.platform.platform_velocity,
            "subtracted settled platform velocity"
        );
    }

    /// On landing, remove the ground's own velocity from the character's,
    /// since riding the platform already supplies that motion.
    pub(crate) fn begin_platform_velocity_subtraction(&mut self) {
        if !self.config.moving_platform.enabled || !self.config.transfer().inherits_velocity() {
            return;
        }
        match self.platform.active_platform {
            Some(platform) if self.platform.new_platform => {
                self.pending_subtraction = Some(PendingSubtraction {
                    platform,
                    ticks_remaining: NEW_PLATFORM_SETTLE_TICKS,
                });
                tracing::debug!(?platform, "deferring platform velocity subtraction");
            }
            _ => {
                self.movement.velocity -= self.platform.platform_velocity;
            }
        }
    }

    pub(crate) fn cancel_pending_subtraction(&mut self, reason: &'static str) {
        if let Some(pending) = self.pending_subtraction.take() {
            tracing::debug!(platform = ?pending.platform, reason, "cancelled platform velocity subtraction");
        }
    }

    /// Stop tracking the platform unless the transfer mode keeps the
    /// character locked to it while airborne.
    pub(crate) fn release_platform_if_unlocked(&mut self) {
        if !self.config.transfer().locks_to_platform() {
            self.platform.active_platform = None;
        }
    }

    /// Forget a platform that no longer exists.
    pub(crate) fn drop_platform(&mut self, platform: BodyId) {
        tracing::warn!(?platform, "active platform vanished, dropping it");
        self.platform.active_platform = None;
        self.platform.platform_velocity = Vec3::ZERO;
        self.platform.new_platform = false;
        self.cancel_pending_subtraction("platform vanished");
    }

    /// Carry the character along with its platform before the main move.
    pub(crate) fn ride_platform<H: CharacterHost + ?Sized>(&mut self, host: &mut H) {
        let Some(active) = self.platform.active_platform else {
            return;
        };
        let Some(transform) = host.platform_transform(active) else {
            self.drop_platform(active);
            return;
        };

        let new_global_point = transform.transform_point(self.platform.active_local_point);
        let move_distance = new_global_point - self.platform.active_global_point;
        if move_distance != Vec3::ZERO {
            match host.move_by(move_distance) {
                Ok(outcome) => {
                    if !outcome.flags.is_empty() {
                        tracing::debug!(
                            flags = outcome.flags.0,
                            requested = ?move_distance,
                            realized = ?outcome.displacement,
                            "platform ride obstructed"
                        );
                    }
                    self.platform.ride_flags = outcome.flags;
                }
                Err(err) => tracing::warn!(%err, "platform ride move failed"),
            }
        }

        // Yaw only, so a tilting platform never tips the character's up axis.
        let new_global_rotation = transform.rotation * self.platform.active_local_rotation;
        let rotation_diff = new_global_rotation * self.platform.active_global_rotation.inverse();
        let (yaw, _, _) = rotation_diff.to_euler(EulerRot::YXZ);
        if yaw != 0.0 && yaw.is_finite() {
            host.rotate_yaw(yaw);
        }
    }

    /// Adopt the body touched this tick as the active platform.
    pub(crate) fn switch_platform<H: CharacterHost + ?Sized>(&mut self, host: &H) {
        if !self.config.moving_platform.enabled {
            return;
        }
        let Some(hit) = self.platform.hit_platform else {
            return;
        };
        if self.platform.active_platform == Some(hit) {
            return;
        }
        let Some(transform) = host.platform_transform(hit) else {
            return;
        };

        tracing::debug!(platform = ?hit, "switched platform");
        self.platform.active_platform = Some(hit);
        self.platform.last_matrix = transform.matrix();
        self.platform.new_platform = true;
        if let Some(pending) = self.pending_subtraction {
            if pending.platform != hit {
                self.cancel_pending_subtraction("changed platform");
            }
        }
    }

    /// Record the tracked point and rotation relative to the platform after the move.
    pub(crate) fn record_platform_anchor<H: CharacterHost + ?Sized>(&mut self, host: &H) {
        let Some(active) = self.platform.active_platform else {
            return;
        };
        let Some(transform) = host.platform_transform(active) else {
            self.drop_platform(active);
            return;
        };

        let global_point = host.position() + Vec3::Y * host.platform_anchor_offset();
        self.platform.active_global_point = global_point;
        self.platform.active_local_point = transform.inverse_transform_point(global_point);

        let global_rotation = host.rotation();
        self.platform.active_global_rotation = global_rotation;
        self.platform.active_local_rotation = transform.rotation.inverse() * global_rotation;
    }
}
