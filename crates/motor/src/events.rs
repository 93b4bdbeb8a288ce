use glam::Vec3;
use locomotor_common::BodyId;
use serde::{Deserialize, Serialize};

/// Notifications produced by the motor, queued until the consumer drains them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotorEvent {
    /// A jump started with the given takeoff velocity.
    Jumped { velocity: Vec3 },
    /// The character touched down, possibly on a trackable body.
    Landed { platform: Option<BodyId> },
    /// The character walked off an edge or lost its footing.
    Fell,
    /// Velocity was overridden from outside via `set_velocity`.
    ExternalVelocity { velocity: Vec3 },
    /// Upward motion was blocked.
    HitCeiling,
}
