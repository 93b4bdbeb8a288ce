//! Minimal host for motor tests: one infinite ground plane (optionally a
//! moving platform) and an optional ceiling.

use glam::{Quat, Vec3};
use locomotor_common::{BodyId, Transform};

use crate::flags::CollisionFlags;
use crate::host::{ContactEvent, MoveError, MoveOutcome, Mover, TransformProvider};

pub const CHARACTER_HEIGHT: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct TestHost {
    pub position: Vec3,
    pub rotation: Quat,
    /// Plane through `ground.position` with normal `ground.rotation * Y`.
    pub ground: Option<Transform>,
    pub ground_body: Option<BodyId>,
    /// Velocity applied to the ground transform by [`TestHost::advance`].
    pub ground_velocity: Vec3,
    /// Yaw rate applied to the ground transform by [`TestHost::advance`] (rad/s).
    pub ground_spin: f32,
    pub ceiling: Option<f32>,
    pub step_offset: f32,
    pub slope_limit: f32,
    pub fail_moves: bool,
    pub move_count: usize,
}

impl TestHost {
    /// Flat static ground at y = 0, character standing on it.
    pub fn flat() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            ground: Some(Transform::default()),
            ground_body: None,
            ground_velocity: Vec3::ZERO,
            ground_spin: 0.0,
            ceiling: None,
            step_offset: 0.3,
            slope_limit: 45.0,
            fail_moves: false,
            move_count: 0,
        }
    }

    /// Nothing to stand on.
    pub fn void(position: Vec3) -> Self {
        Self {
            position,
            ground: None,
            ..Self::flat()
        }
    }

    /// Flat ground that is a trackable body moving at `velocity`.
    pub fn platform(velocity: Vec3) -> Self {
        Self {
            ground_body: Some(BodyId::new()),
            ground_velocity: velocity,
            ..Self::flat()
        }
    }

    /// Ground plane tilted about the z axis by `degrees`, descending toward +x.
    pub fn slope(degrees: f32) -> Self {
        Self {
            ground: Some(Transform {
                rotation: Quat::from_rotation_z(-degrees.to_radians()),
                ..Transform::default()
            }),
            ..Self::flat()
        }
    }

    /// Move the ground by its velocity. Call once per tick before the motor.
    pub fn advance(&mut self, dt: f32) {
        if let Some(ground) = self.ground.as_mut() {
            ground.position += self.ground_velocity * dt;
            ground.rotation = Quat::from_rotation_y(self.ground_spin * dt) * ground.rotation;
        }
    }
}

impl Mover for TestHost {
    fn move_by(&mut self, displacement: Vec3) -> Result<MoveOutcome, MoveError> {
        self.move_count += 1;
        if self.fail_moves {
            return Err(MoveError::Host("scripted failure".into()));
        }
        if !displacement.is_finite() {
            return Err(MoveError::NonFinite(displacement));
        }

        let start = self.position;
        let mut target = start + displacement;
        let mut outcome = MoveOutcome::default();
        let move_direction = displacement.normalize_or_zero();

        if let Some(ground) = self.ground {
            let normal = ground.rotation * Vec3::Y;
            let depth = (target - ground.position).dot(normal);
            if depth < 0.0 {
                // Walkable ground lifts the character straight up; steeper
                // ground pushes it out along the normal.
                if normal.y > self.slope_limit.to_radians().cos() {
                    target.y -= depth / normal.y;
                } else {
                    target -= normal * depth;
                }
                outcome.flags |= CollisionFlags::BELOW;
                outcome.contacts.push(ContactEvent {
                    normal,
                    point: target,
                    move_direction,
                    body: self.ground_body,
                });
            }
        }

        if let Some(ceiling) = self.ceiling {
            if target.y + CHARACTER_HEIGHT > ceiling {
                target.y = ceiling - CHARACTER_HEIGHT;
                outcome.flags |= CollisionFlags::ABOVE;
                outcome.contacts.push(ContactEvent {
                    normal: -Vec3::Y,
                    point: target + Vec3::Y * CHARACTER_HEIGHT,
                    move_direction,
                    body: None,
                });
            }
        }

        self.position = target;
        outcome.displacement = target - start;
        Ok(outcome)
    }

    fn step_offset(&self) -> f32 {
        self.step_offset
    }

    fn slope_limit(&self) -> f32 {
        self.slope_limit
    }
}

impl TransformProvider for TestHost {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    fn rotate_yaw(&mut self, radians: f32) {
        self.rotation = Quat::from_rotation_y(radians) * self.rotation;
    }

    fn platform_anchor_offset(&self) -> f32 {
        0.5
    }

    fn platform_transform(&self, body: BodyId) -> Option<Transform> {
        if self.ground_body == Some(body) {
            self.ground
        } else {
            None
        }
    }
}
