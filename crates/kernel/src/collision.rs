//! Rapier mirror of the world's bodies.
//!
//! Every body is a parentless collider posed directly from its transform, so
//! the character controller sees platforms where the world put them this tick
//! and never inherits their velocity on its own.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use glam::{Quat, Vec3};
use locomotor_common::{BodyId, Transform};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::parry::query;
use rapier3d::parry::shape::Shape as ParryShape;
use rapier3d::prelude::{ColliderBuilder, ColliderHandle, ColliderSet, IslandManager, QueryPipeline, RigidBodySet, SharedShape};

use crate::world::Shape;

/// Half extent of the slab standing in for a ground plane.
const PLANE_HALF_EXTENT: f32 = 1000.0;
const PLANE_HALF_THICKNESS: f32 = 1.0;

pub(crate) fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z)),
    )
}

fn shared_shape(shape: &Shape) -> SharedShape {
    match *shape {
        Shape::Plane => SharedShape::cuboid(PLANE_HALF_EXTENT, PLANE_HALF_THICKNESS, PLANE_HALF_EXTENT),
        Shape::Slab { half_extents } => SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
    }
}

/// Collider pose for a body. A plane's slab hangs below its surface.
fn collider_pose(shape: &Shape, transform: &Transform) -> Isometry3<f32> {
    let centre = match shape {
        Shape::Plane => transform.position - transform.rotation * Vec3::Y * PLANE_HALF_THICKNESS,
        Shape::Slab { .. } => transform.position,
    };
    to_isometry(centre, transform.rotation)
}

/// A surface the character is touching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Touch {
    pub body: BodyId,
    /// Points out of the body, toward the character.
    pub normal: Vec3,
    /// On the body's surface.
    pub point: Vec3,
}

pub(crate) struct CollisionScene {
    /// Stays empty; rapier's queries still ask for it.
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    pub(crate) queries: QueryPipeline,
    islands: IslandManager,
    handles: BTreeMap<BodyId, ColliderHandle>,
    owners: HashMap<ColliderHandle, BodyId>,
}

impl CollisionScene {
    pub(crate) fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            queries: QueryPipeline::new(),
            islands: IslandManager::new(),
            handles: BTreeMap::new(),
            owners: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: BodyId, shape: &Shape, transform: &Transform) {
        let collider = ColliderBuilder::new(shared_shape(shape))
            .position(collider_pose(shape, transform))
            .build();
        let handle = self.colliders.insert(collider);
        self.handles.insert(id, handle);
        self.owners.insert(handle, id);
        self.refresh();
    }

    pub(crate) fn remove(&mut self, id: BodyId) {
        let Some(handle) = self.handles.remove(&id) else {
            return;
        };
        self.owners.remove(&handle);
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, false);
        self.refresh();
    }

    /// Move a body's collider. Call [`CollisionScene::refresh`] once all poses are set.
    pub(crate) fn set_pose(&mut self, id: BodyId, shape: &Shape, transform: &Transform) {
        if let Some(collider) = self.handles.get(&id).and_then(|h| self.colliders.get_mut(*h)) {
            collider.set_position(collider_pose(shape, transform));
        }
    }

    /// Rebuild the query acceleration structure from the current poses.
    pub(crate) fn refresh(&mut self) {
        self.queries.update(&self.colliders);
    }

    /// Closest contact between `shape` at `pose` and the collider `handle`,
    /// if they are within `prediction` of each other.
    pub(crate) fn touch(
        &self,
        handle: ColliderHandle,
        pose: &Isometry3<f32>,
        shape: &dyn ParryShape,
        prediction: f32,
    ) -> Option<Touch> {
        let body = *self.owners.get(&handle)?;
        let collider = self.colliders.get(handle)?;
        let contact = query::contact(collider.position(), collider.shape(), pose, shape, prediction)
            .ok()
            .flatten()?;
        Some(Touch {
            body,
            normal: from_vector(&contact.normal1),
            point: from_vector(&contact.point1.coords),
        })
    }
}

impl fmt::Debug for CollisionScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionScene")
            .field("colliders", &self.colliders.len())
            .finish_non_exhaustive()
    }
}
