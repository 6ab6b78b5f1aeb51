//! Access to the entity data the collision engine reads but does not own.

use glam::Mat4;

use crate::ecs::components::mesh::{CollisionMesh, MeshInstances};
use crate::ecs::components::transform::GlobalTransform;

/// World transforms and meshes of collider-owning entities.
///
/// Implemented for `hecs::World` using [`GlobalTransform`] and
/// [`MeshInstances`]. Any other entity store can implement it.
pub trait EntitySource {
    /// Whether `entity` is still alive.
    fn contains(&self, entity: hecs::Entity) -> bool;

    /// World model matrix of `entity`.
    fn model_matrix(&self, entity: hecs::Entity) -> Option<Mat4>;

    /// Inverse world model matrix of `entity`.
    fn inverse_model_matrix(&self, entity: hecs::Entity) -> Option<Mat4> {
        self.model_matrix(entity).map(|m| m.inverse())
    }

    /// Visit the mesh instances bound to `entity`. Returns `None` when the
    /// entity has none.
    fn with_meshes<R>(
        &self,
        entity: hecs::Entity,
        f: impl FnOnce(&mut dyn Iterator<Item = &CollisionMesh>) -> R,
    ) -> Option<R>;
}

impl EntitySource for hecs::World {
    fn contains(&self, entity: hecs::Entity) -> bool {
        hecs::World::contains(self, entity)
    }

    fn model_matrix(&self, entity: hecs::Entity) -> Option<Mat4> {
        self.get::<&GlobalTransform>(entity).ok().map(|t| t.0)
    }

    fn with_meshes<R>(
        &self,
        entity: hecs::Entity,
        f: impl FnOnce(&mut dyn Iterator<Item = &CollisionMesh>) -> R,
    ) -> Option<R> {
        let meshes = self.get::<&MeshInstances>(entity).ok()?;
        if meshes.0.is_empty() {
            return None;
        }
        let mut iter = meshes.0.iter().map(|mesh| mesh.as_ref());
        Some(f(&mut iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::transform::Transform;
    use glam::Vec3;

    #[test]
    fn test_hecs_source_reads_components() {
        let mut world = hecs::World::new();
        let translation = Vec3::new(1.0, 2.0, 3.0);
        let entity = world.spawn((
            GlobalTransform::from_translation(translation),
            MeshInstances::single(CollisionMesh::cube(1.0)),
        ));

        assert!(EntitySource::contains(&world, entity));
        assert_eq!(
            world.model_matrix(entity),
            Some(Mat4::from_translation(translation))
        );
        let inverse = world.inverse_model_matrix(entity).unwrap();
        assert!((inverse.transform_point3(translation)).length() < 1e-6);

        let vertex_count = world.with_meshes(entity, |meshes| {
            meshes.map(|m| m.positions().len()).sum::<usize>()
        });
        assert_eq!(vertex_count, Some(8));
    }

    #[test]
    fn test_hecs_source_missing_components() {
        let mut world = hecs::World::new();
        let bare = world.spawn((Transform::identity(),));
        let empty = world.spawn((GlobalTransform::default(), MeshInstances::default()));

        assert!(world.model_matrix(bare).is_none());
        assert!(world.with_meshes(bare, |_| ()).is_none());
        assert!(world.with_meshes(empty, |_| ()).is_none());

        world.despawn(bare).unwrap();
        assert!(!EntitySource::contains(&world, bare));
    }
}
