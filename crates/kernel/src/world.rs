use std::collections::BTreeMap;
use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use locomotor_common::{BodyId, Transform};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collision::CollisionScene;

/// Errors from world mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("unknown body: {0:?}")]
    UnknownBody(BodyId),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("invalid character capsule: {0}")]
    InvalidCharacter(String),
}

/// Collision shape of a body, in the body's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Infinite plane through the origin with local normal +Y.
    Plane,
    /// Oriented box.
    Slab { half_extents: Vec3 },
}

impl Shape {
    fn validate(&self) -> Result<(), WorldError> {
        match self {
            Shape::Plane => Ok(()),
            Shape::Slab { half_extents } => {
                if half_extents.is_finite() && half_extents.min_element() > 0.0 {
                    Ok(())
                } else {
                    Err(WorldError::InvalidShape(format!(
                        "slab half extents must be positive, got {half_extents:?}"
                    )))
                }
            }
        }
    }
}

/// Kinematic motion applied to a body every [`World::step`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyMotion {
    #[default]
    Static,
    /// Constant translation (m/s).
    Linear { velocity: Vec3 },
    /// Constant yaw rate about the body's position (rad/s).
    Spin { rate: f32 },
    /// Back and forth along `axis` around the spawn position.
    Oscillate { axis: Vec3, amplitude: f32, period: f32 },
}

/// A collidable body: ground, wall, platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
    pub motion: BodyMotion,
    /// Position the body was spawned at; oscillation is relative to it.
    origin: Vec3,
}

impl Body {
    pub fn new(name: impl Into<String>, shape: Shape, transform: Transform) -> Self {
        Self {
            name: name.into(),
            shape,
            transform,
            motion: BodyMotion::Static,
            origin: transform.position,
        }
    }

    pub fn with_motion(mut self, motion: BodyMotion) -> Self {
        self.motion = motion;
        self
    }

    /// Move to the pose for world time `time`, `dt` after the previous step.
    fn advance(&mut self, time: f64, dt: f32) {
        match self.motion {
            BodyMotion::Static => {}
            BodyMotion::Linear { velocity } => {
                self.transform.position += velocity * dt;
            }
            BodyMotion::Spin { rate } => {
                self.transform.rotation = Quat::from_rotation_y(rate * dt) * self.transform.rotation;
            }
            BodyMotion::Oscillate {
                axis,
                amplitude,
                period,
            } => {
                if period > 0.0 {
                    let phase = (time / f64::from(period)).fract() as f32 * TAU;
                    self.transform.position =
                        self.origin + axis.normalize_or_zero() * amplitude * phase.sin();
                }
            }
        }
    }
}

/// The character's collision volume: an upright capsule centred on its position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capsule {
    pub radius: f32,
    /// Total height including both hemispheres.
    pub height: f32,
    /// Step height reported to the motor (m).
    pub step_offset: f32,
    /// Steepest walkable slope (degrees).
    pub slope_limit: f32,
}

impl Default for Capsule {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 2.0,
            step_offset: 0.3,
            slope_limit: 45.0,
        }
    }
}

impl Capsule {
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(WorldError::InvalidCharacter(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.height.is_finite() && self.height >= 2.0 * self.radius) {
            return Err(WorldError::InvalidCharacter(format!(
                "height {} is shorter than the capsule diameter",
                self.height
            )));
        }
        if !(0.0..90.0).contains(&self.slope_limit) || self.step_offset < 0.0 {
            return Err(WorldError::InvalidCharacter(format!(
                "slope limit {} or step offset {} out of range",
                self.slope_limit, self.step_offset
            )));
        }
        Ok(())
    }

    /// Distance from the capsule centre to either hemisphere centre.
    pub fn half_segment(&self) -> f32 {
        self.height * 0.5 - self.radius
    }
}

/// The simulated character: pose plus collision volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Character {
    pub position: Vec3,
    pub rotation: Quat,
    pub capsule: Capsule,
}

/// An event record produced by every mutation to the world.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Spawned { id: BodyId, name: String },
    Despawned { id: BodyId, name: String },
    /// Bodies advanced one tick.
    Stepped { tick: u64, time: f64 },
}

/// Default time step handed to the character controller before the first step.
const DEFAULT_STEP_DT: f32 = 1.0 / 60.0;

/// Sandbox world hosting one character among kinematic bodies.
///
/// Body ids come from a counter so identical scenarios produce identical
/// worlds. Every body is mirrored as a collider in the collision scene.
#[derive(Debug)]
pub struct World {
    bodies: BTreeMap<BodyId, Body>,
    pub(crate) character: Character,
    pub(crate) scene: CollisionScene,
    /// Length of the last step, passed to the character controller.
    pub(crate) step_dt: f32,
    tick: u64,
    time: f64,
    next_body: u128,
    /// Append-only event log of all mutations.
    event_log: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            bodies: BTreeMap::new(),
            character: Character {
                position: Vec3::new(0.0, 1.0, 0.0),
                rotation: Quat::IDENTITY,
                capsule: Capsule::default(),
            },
            scene: CollisionScene::new(),
            step_dt: DEFAULT_STEP_DT,
            tick: 0,
            time: 0.0,
            next_body: 1,
            event_log: Vec::new(),
        }
    }
}

impl World {
    /// Empty world with the default capsule standing at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(position: Vec3, capsule: Capsule) -> Result<Self, WorldError> {
        capsule.validate()?;
        let mut world = Self::default();
        world.character.position = position;
        world.character.capsule = capsule;
        Ok(world)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> &BTreeMap<BodyId, Body> {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Look up a body by its scenario name.
    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies
            .iter()
            .find(|(_, body)| body.name == name)
            .map(|(id, _)| *id)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Add a body. Returns its id.
    pub fn spawn(&mut self, body: Body) -> Result<BodyId, WorldError> {
        body.shape.validate()?;
        let id = BodyId(Uuid::from_u128(self.next_body));
        self.next_body += 1;
        tracing::debug!(?id, name = %body.name, "spawned body");
        self.event_log.push(WorldEvent::Spawned {
            id,
            name: body.name.clone(),
        });
        self.scene.insert(id, &body.shape, &body.transform);
        self.bodies.insert(id, body);
        Ok(id)
    }

    /// Remove a body. A character standing on it simply loses its platform.
    pub fn despawn(&mut self, id: BodyId) -> Result<Body, WorldError> {
        let body = self.bodies.remove(&id).ok_or(WorldError::UnknownBody(id))?;
        self.scene.remove(id);
        tracing::debug!(?id, name = %body.name, "despawned body");
        self.event_log.push(WorldEvent::Despawned {
            id,
            name: body.name.clone(),
        });
        Ok(body)
    }

    pub fn set_motion(&mut self, id: BodyId, motion: BodyMotion) -> Result<(), WorldError> {
        let body = self.bodies.get_mut(&id).ok_or(WorldError::UnknownBody(id))?;
        body.motion = motion;
        Ok(())
    }

    /// Teleport the character.
    pub fn place_character(&mut self, position: Vec3) {
        self.character.position = position;
    }

    /// Advance every kinematic body by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.tick += 1;
        self.time += f64::from(dt);
        if dt > 0.0 {
            self.step_dt = dt;
        }
        for (id, body) in &mut self.bodies {
            body.advance(self.time, dt);
            self.scene.set_pose(*id, &body.shape, &body.transform);
        }
        self.scene.refresh();
        self.event_log.push(WorldEvent::Stepped {
            tick: self.tick,
            time: self.time,
        });
    }

    /// Deterministic hash of bodies and character pose, for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mix_vec = |h: &mut u64, v: Vec3| {
            for c in v.to_array() {
                mix(h, &c.to_le_bytes());
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for (id, body) in &self.bodies {
            mix(&mut h, id.0.as_bytes());
            mix_vec(&mut h, body.transform.position);
            for c in body.transform.rotation.to_array() {
                mix(&mut h, &c.to_le_bytes());
            }
        }
        mix_vec(&mut h, self.character.position);
        for c in self.character.rotation.to_array() {
            mix(&mut h, &c.to_le_bytes());
        }
        h
    }
}
