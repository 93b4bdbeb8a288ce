//! Character locomotion motor.
//!
//! A per-tick integrator that turns move/jump intent and collision feedback
//! into velocity and displacement for a kinematic character.
//!
//! # Architecture
//!
//! Each [`CharacterMotor::tick`] runs, in order:
//!
//! - **Platform tracking**: sample the active platform and derive its velocity
//! - **Velocity resolution**: desired velocity from input, sliding and platform inertia
//! - **Gravity and jumping**: gravity, terminal velocity, takeoff, held-jump force
//! - **Move**: ride the platform, then request the displacement from the [`Mover`]
//! - **Grounding**: classify contacts, recompute velocity from the realized move,
//!   land or fall
//!
//! Collision detection, character transforms and input devices belong to the
//! host and reach the motor through the traits in [`host`].
//!
//! # Invariants
//! - `grounded` matches `ground_normal.y > 0.01` after every tick.
//! - Airborne vertical velocity never drops below `-max_fall_speed`.
//! - An active platform is only kept while grounded, or while airborne in
//!   [`MovementTransfer::PermaLocked`] mode.

pub mod config;
pub mod curve;
pub mod events;
pub mod flags;
pub mod host;
pub mod state;

mod grounding;
mod jump;
mod motor;
mod platform;
mod speed;
mod velocity;

#[cfg(test)]
mod test_host;

pub use config::{
    ConfigError, JumpingConfig, MotorConfig, MovementConfig, MovementTransfer, MovingPlatformConfig,
    SlidingConfig,
};
pub use curve::{Keyframe, SpeedCurve};
pub use events::MotorEvent;
pub use flags::CollisionFlags;
pub use grounding::{is_grounded_normal, is_too_steep};
pub use host::{
    CharacterHost, ContactEvent, InputSource, MotorInput, MoveError, MoveOutcome, Mover,
    TransformProvider,
};
pub use jump::jump_vertical_speed;
pub use motor::CharacterMotor;
pub use speed::{desired_horizontal_velocity, max_speed_in_direction};
pub use velocity::adjust_ground_velocity_to_normal;
