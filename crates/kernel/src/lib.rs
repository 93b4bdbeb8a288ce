//! Sandbox host for the locomotion motor.
//!
//! A [`World`] holds kinematic bodies (planes and slabs that stand still,
//! slide, spin or oscillate), mirrored as rapier colliders, and one capsule
//! character moved by rapier's kinematic character controller. It implements the
//! motor's `Mover` and `TransformProvider` traits, so a `CharacterMotor` can
//! tick against it directly. [`Scenario`] loads a world, motor tuning and an
//! input timeline from YAML; [`Simulation`] runs it.
//!
//! # Invariants
//! - Body ids are allocated from a counter: the same scenario always builds
//!   the same world.
//! - Bodies only move in [`World::step`], which also re-poses their colliders;
//!   the character only moves through the mover and transform traits.

mod collision;
mod mover;
pub mod scenario;
pub mod world;

pub use scenario::{
    BodySpec, CharacterSpec, InputKey, InputScript, Launch, Sample, Scenario, ScenarioError, Simulation,
};
pub use world::{Body, BodyMotion, Capsule, Character, Shape, World, WorldError, WorldEvent};
