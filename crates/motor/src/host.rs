//! Collaborators the motor consumes but does not implement.
//!
//! A host engine plugs in by implementing [`Mover`] (swept, collision-aware
//! displacement) and [`TransformProvider`] (character pose and platform
//! transforms). Anything implementing both is a [`CharacterHost`].

use glam::{Quat, Vec3};
use locomotor_common::{BodyId, Transform};
use serde::{Deserialize, Serialize};

use crate::flags::CollisionFlags;

/// One surface touched during a move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    /// Surface normal at the contact.
    pub normal: Vec3,
    /// World-space contact point.
    pub point: Vec3,
    /// Direction the character was moving when it made contact.
    pub move_direction: Vec3,
    /// Body the surface belongs to, if it has a transform the motor can track.
    pub body: Option<BodyId>,
}

/// Result of a single swept move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveOutcome {
    /// Displacement actually applied.
    pub displacement: Vec3,
    pub flags: CollisionFlags,
    pub contacts: Vec<ContactEvent>,
}

impl MoveOutcome {
    /// Outcome of a move that hit nothing.
    pub fn free(displacement: Vec3) -> Self {
        Self {
            displacement,
            ..Self::default()
        }
    }
}

/// Errors a mover may report. The motor treats every one of them as
/// "nothing moved this tick".
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("displacement {0:?} is not finite")]
    NonFinite(Vec3),
    #[error("mover failure: {0}")]
    Host(String),
}

/// Swept movement of the character's collision volume.
pub trait Mover {
    /// Move by `displacement`, stopping at obstacles.
    fn move_by(&mut self, displacement: Vec3) -> Result<MoveOutcome, MoveError>;

    /// Height of steps the mover climbs on its own (m).
    fn step_offset(&self) -> f32;

    /// Steepest walkable slope (degrees).
    fn slope_limit(&self) -> f32;
}

/// Character pose and platform transforms.
pub trait TransformProvider {
    fn position(&self) -> Vec3;

    fn rotation(&self) -> Quat;

    /// Teleport the character by `delta` without collision.
    fn translate(&mut self, delta: Vec3);

    /// Rotate the character about the world up axis.
    fn rotate_yaw(&mut self, radians: f32);

    /// Height above [`TransformProvider::position`] of the point tracked on a
    /// platform. For a capsule this is the centre of the lower hemisphere.
    fn platform_anchor_offset(&self) -> f32 {
        0.0
    }

    /// Current transform of `body`, or `None` if it no longer exists.
    fn platform_transform(&self, body: BodyId) -> Option<Transform>;
}

/// Everything the motor needs from the host for one tick.
pub trait CharacterHost: Mover + TransformProvider {}

impl<T: Mover + TransformProvider> CharacterHost for T {}

/// Input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorInput {
    /// Desired world-space move direction. Length scales speed.
    pub move_direction: Vec3,
    pub jump: bool,
}

/// Supplies one [`MotorInput`] per tick (player device, AI, replay script).
pub trait InputSource {
    fn next_input(&mut self) -> MotorInput;
}
