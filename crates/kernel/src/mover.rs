//! Character movement through rapier's kinematic character controller.
//!
//! The controller slides the capsule along whatever it hits, refuses to climb
//! or slide on slopes against the capsule's slope limit, and keeps a small
//! skin between the capsule and every surface. Contacts are then read back at
//! the final pose for each collider the controller touched.

use glam::{Quat, Vec3};
use locomotor_common::{BodyId, Transform};
use locomotor_motor::{CollisionFlags, ContactEvent, MoveError, MoveOutcome, Mover, TransformProvider};
use rapier3d::control::{CharacterLength, KinematicCharacterController};
use rapier3d::prelude::{ColliderHandle, QueryFilter, SharedShape};

use crate::collision::{from_vector, to_isometry, to_vector};
use crate::world::World;

/// Gap the controller keeps between the capsule and any surface.
const SKIN: f32 = 0.01;
/// Contacts are read back within this distance of the final pose.
const CONTACT_PREDICTION: f32 = SKIN * 4.0;
const FLAG_MARGIN: f32 = 1e-3;

/// Which part of the capsule a contact point touches. Points level with a
/// hemisphere centre count as sides.
fn contact_flag(point: Vec3, position: Vec3, half_segment: f32) -> CollisionFlags {
    if point.y < position.y - half_segment - FLAG_MARGIN {
        CollisionFlags::BELOW
    } else if point.y > position.y + half_segment + FLAG_MARGIN {
        CollisionFlags::ABOVE
    } else {
        CollisionFlags::SIDES
    }
}

impl World {
    fn controller(&self) -> KinematicCharacterController {
        let slope = self.character.capsule.slope_limit.to_radians();
        KinematicCharacterController {
            offset: CharacterLength::Absolute(SKIN),
            autostep: None,
            snap_to_ground: None,
            max_slope_climb_angle: slope,
            min_slope_slide_angle: slope,
            ..Default::default()
        }
    }

    fn move_capsule(&mut self, displacement: Vec3) -> MoveOutcome {
        let capsule = self.character.capsule;
        let half_segment = capsule.half_segment();
        let shape = SharedShape::capsule_y(half_segment, capsule.radius);
        let start = self.character.position;

        let mut touched: Vec<ColliderHandle> = Vec::new();
        let movement = self.controller().move_shape(
            self.step_dt,
            &self.scene.bodies,
            &self.scene.colliders,
            &self.scene.queries,
            &*shape,
            &to_isometry(start, Quat::IDENTITY),
            to_vector(displacement),
            QueryFilter::default(),
            |collision| {
                if !touched.contains(&collision.handle) {
                    touched.push(collision.handle);
                }
            },
        );

        let position = start + from_vector(&movement.translation);
        self.character.position = position;

        let move_direction = displacement.normalize_or_zero();
        let pose = to_isometry(position, Quat::IDENTITY);
        let mut outcome = MoveOutcome::free(position - start);
        for handle in touched {
            let Some(touch) = self.scene.touch(handle, &pose, &*shape, CONTACT_PREDICTION) else {
                continue;
            };
            outcome.flags |= contact_flag(touch.point, position, half_segment);
            outcome.contacts.push(ContactEvent {
                normal: touch.normal,
                point: touch.point,
                move_direction,
                body: Some(touch.body),
            });
        }
        tracing::trace!(?displacement, realized = ?outcome.displacement, contacts = outcome.contacts.len(), "moved");
        outcome
    }
}

impl Mover for World {
    fn move_by(&mut self, displacement: Vec3) -> Result<MoveOutcome, MoveError> {
        if !displacement.is_finite() {
            return Err(MoveError::NonFinite(displacement));
        }
        if displacement == Vec3::ZERO {
            return Ok(MoveOutcome::free(Vec3::ZERO));
        }
        Ok(self.move_capsule(displacement))
    }

    fn step_offset(&self) -> f32 {
        self.character.capsule.step_offset
    }

    fn slope_limit(&self) -> f32 {
        self.character.capsule.slope_limit
    }
}

impl TransformProvider for World {
    fn position(&self) -> Vec3 {
        self.character.position
    }

    fn rotation(&self) -> Quat {
        self.character.rotation
    }

    fn translate(&mut self, delta: Vec3) {
        self.character.position += delta;
    }

    fn rotate_yaw(&mut self, radians: f32) {
        self.character.rotation = Quat::from_rotation_y(radians) * self.character.rotation;
    }

    /// Centre of the lower hemisphere.
    fn platform_anchor_offset(&self) -> f32 {
        -self.character.capsule.half_segment()
    }

    fn platform_transform(&self, body: BodyId) -> Option<Transform> {
        self.body(body).map(|b| b.transform)
    }
}
