//! Collider records owned by the collision world.

use std::collections::HashSet;

use super::bounds::Bounds;
use super::contact::Collision;
use super::error::{CollisionError, Result};
use super::source::EntitySource;

slotmap::new_key_type! {
    /// Generation-checked collider handle. Stale handles never alias a newer collider.
    pub struct ColliderId;
}

/// A convex collider bound to an entity's meshes.
#[derive(Debug, Clone)]
pub struct Collider {
    entity: hecs::Entity,
    /// Object-space bounds, recomputed only on request.
    bounds: Bounds,
    /// World-space bounds as of the last tick.
    world_bounds: Option<Bounds>,
    pub(crate) broad_candidates: HashSet<ColliderId>,
    pub(crate) narrow_candidates: HashSet<ColliderId>,
    pub(crate) collisions: Vec<Collision>,
}

impl Collider {
    pub(crate) fn new(entity: hecs::Entity, bounds: Bounds) -> Self {
        Self {
            entity,
            bounds,
            world_bounds: None,
            broad_candidates: HashSet::new(),
            narrow_candidates: HashSet::new(),
            collisions: Vec::new(),
        }
    }

    /// Entity whose meshes and transform this collider uses.
    pub fn entity(&self) -> hecs::Entity {
        self.entity
    }

    /// Object-space bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// World-space bounds computed during the last tick, if the entity resolved.
    pub fn last_world_bounds(&self) -> Option<Bounds> {
        self.world_bounds
    }

    /// Colliders whose bounds overlapped this one on the last tick.
    pub fn broad_candidates(&self) -> &HashSet<ColliderId> {
        &self.broad_candidates
    }

    /// Colliders GJK confirmed as overlapping on the last tick.
    pub fn narrow_candidates(&self) -> &HashSet<ColliderId> {
        &self.narrow_candidates
    }

    /// Contacts where this collider is `object1`.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub(crate) fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub(crate) fn set_world_bounds(&mut self, bounds: Option<Bounds>) {
        self.world_bounds = bounds;
    }

    /// Drop all per-tick results.
    pub(crate) fn clear_tick_state(&mut self) {
        self.world_bounds = None;
        self.broad_candidates.clear();
        self.narrow_candidates.clear();
        self.collisions.clear();
    }
}

/// Union of the object-space bounds of every mesh instance on `entity`.
pub fn entity_bounds<S: EntitySource>(source: &S, entity: hecs::Entity) -> Result<Bounds> {
    source
        .with_meshes(entity, |meshes| {
            meshes
                .map(|mesh| mesh.bounds())
                .reduce(|acc, b| acc.merge(&b))
        })
        .flatten()
        .ok_or(CollisionError::MissingMesh(entity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::mesh::{CollisionMesh, MeshInstances};
    use crate::ecs::components::transform::GlobalTransform;
    use glam::Vec3;

    #[test]
    fn test_entity_bounds_union() {
        let mut world = hecs::World::new();
        let offset = CollisionMesh::new(
            vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 0.25)],
            Vec::new(),
        );
        let entity = world.spawn((
            GlobalTransform::default(),
            MeshInstances(vec![CollisionMesh::cube(1.0).into(), offset.into()]),
        ));

        let bounds = entity_bounds(&world, entity).unwrap();
        assert_eq!(bounds.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 0.5));
    }

    #[test]
    fn test_entity_bounds_missing_mesh() {
        let mut world = hecs::World::new();
        let entity = world.spawn((GlobalTransform::default(),));
        assert_eq!(
            entity_bounds(&world, entity),
            Err(CollisionError::MissingMesh(entity))
        );
    }

    #[test]
    fn test_clear_tick_state() {
        let mut world = hecs::World::new();
        let entity = world.spawn(());
        let mut collider = Collider::new(entity, Bounds::default());
        collider.set_world_bounds(Some(Bounds::default()));
        collider.broad_candidates.insert(ColliderId::default());
        collider.clear_tick_state();
        assert!(collider.last_world_bounds().is_none());
        assert!(collider.broad_candidates().is_empty());
        assert_eq!(collider.bounds(), Bounds::default());
    }
}
