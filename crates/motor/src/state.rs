//! Mutable per-character state, owned and advanced by the motor.

use glam::{Affine3A, Quat, Vec3};
use locomotor_common::BodyId;

use crate::flags::CollisionFlags;

/// Sentinel for "jump button not pressed recently".
pub const NO_PRESS: f64 = -100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MovementState {
    /// Authoritative velocity after each tick.
    pub velocity: Vec3,
    /// Share of velocity attributed to platform inertia.
    pub frame_velocity: Vec3,
    /// Blocked sides from the last move.
    pub collision_flags: CollisionFlags,
    pub hit_point: Vec3,
    pub last_hit_point: Vec3,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            frame_velocity: Vec3::ZERO,
            collision_flags: CollisionFlags::NONE,
            hit_point: Vec3::ZERO,
            // Far away, so the first contact always counts as a new point.
            last_hit_point: Vec3::new(f32::INFINITY, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JumpingState {
    /// Set from takeoff until the next landing.
    pub jumping: bool,
    /// Gates the extra-height force.
    pub holding_jump_button: bool,
    /// Motor time of the last takeoff (s).
    pub last_start_time: f64,
    /// Motor time the jump button went down, or [`NO_PRESS`].
    pub last_button_down_time: f64,
    pub jump_dir: Vec3,
}

impl Default for JumpingState {
    fn default() -> Self {
        Self {
            jumping: false,
            holding_jump_button: false,
            last_start_time: 0.0,
            last_button_down_time: NO_PRESS,
            jump_dir: Vec3::Y,
        }
    }
}

impl JumpingState {
    pub fn button_pressed(&self) -> bool {
        self.last_button_down_time >= 0.0
    }

    pub fn clear_button(&mut self) {
        self.last_button_down_time = NO_PRESS;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovingPlatformState {
    /// Body touched from above during this tick's move.
    pub hit_platform: Option<BodyId>,
    /// Body currently tracked as the ground the character rides.
    pub active_platform: Option<BodyId>,
    pub active_local_point: Vec3,
    pub active_global_point: Vec3,
    pub active_local_rotation: Quat,
    pub active_global_rotation: Quat,
    /// Platform matrix sampled on the previous tick.
    pub last_matrix: Affine3A,
    pub platform_velocity: Vec3,
    /// True until the first matrix sample after a switch.
    pub new_platform: bool,
    /// Blocked sides from this tick's ride-along move.
    pub ride_flags: CollisionFlags,
}

impl Default for MovingPlatformState {
    fn default() -> Self {
        Self {
            hit_platform: None,
            active_platform: None,
            active_local_point: Vec3::ZERO,
            active_global_point: Vec3::ZERO,
            active_local_rotation: Quat::IDENTITY,
            active_global_rotation: Quat::IDENTITY,
            last_matrix: Affine3A::IDENTITY,
            platform_velocity: Vec3::ZERO,
            new_platform: false,
            ride_flags: CollisionFlags::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRuntimeState {
    pub can_control: bool,
    /// World-space move intent; zeroed while control is disabled.
    pub input_move_direction: Vec3,
    pub input_jump: bool,
    pub grounded: bool,
    /// Zero while airborne.
    pub ground_normal: Vec3,
    pub last_ground_normal: Vec3,
}

impl Default for CharacterRuntimeState {
    /// A freshly created character assumes it stands on something; the first
    /// move settles it.
    fn default() -> Self {
        Self {
            can_control: true,
            input_move_direction: Vec3::ZERO,
            input_jump: false,
            grounded: true,
            ground_normal: Vec3::ZERO,
            last_ground_normal: Vec3::ZERO,
        }
    }
}

/// Platform velocity subtraction waiting for a reliable velocity estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSubtraction {
    pub platform: BodyId,
    pub ticks_remaining: u8,
}
