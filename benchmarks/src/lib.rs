//! Shared scene setup for the collision benchmarks.

use glam::{Mat4, Quat, Vec3};
use rein_collision::{
    CollisionConfig, CollisionMesh, CollisionWorld, GlobalTransform, MeshInstances,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::sync::Arc;

/// `n` unit cubes scattered in a cube of side `extent`, randomly rotated.
///
/// Smaller extents give denser scenes with more narrowphase work. The
/// generator is seeded, so every run sees the same scene.
pub fn setup_cube_scene(n: usize, extent: f32) -> (hecs::World, CollisionWorld) {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mesh = Arc::new(CollisionMesh::cube(1.0));
    let mut world = hecs::World::new();
    let mut collisions = CollisionWorld::new(CollisionConfig::default());

    for _ in 0..n {
        let position = Vec3::new(
            rng.random_range(0.0..=extent),
            rng.random_range(0.0..=extent),
            rng.random_range(0.0..=extent),
        );
        let rotation = Quat::from_euler(
            glam::EulerRot::XYZ,
            rng.random_range(0.0..TAU),
            rng.random_range(0.0..TAU),
            rng.random_range(0.0..TAU),
        );
        let entity = world.spawn((
            GlobalTransform(Mat4::from_rotation_translation(rotation, position)),
            MeshInstances(vec![mesh.clone()]),
        ));
        if let Err(err) = collisions.add_collider(entity, &world) {
            panic!("benchmark scene setup failed: {err}");
        }
    }

    (world, collisions)
}

/// Scene density where roughly one in four cubes touches a neighbor.
pub fn sparse_extent(n: usize) -> f32 {
    (n as f32 * 8.0).cbrt() * 2.0
}

/// Scene density where most cubes overlap several neighbors.
pub fn dense_extent(n: usize) -> f32 {
    (n as f32).cbrt() * 1.2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placements(world: &hecs::World) -> Vec<Mat4> {
        let mut query = world.query::<&GlobalTransform>();
        query.iter().map(|(_, transform)| transform.0).collect()
    }

    #[test]
    fn test_scene_is_reproducible() {
        let extent = sparse_extent(32);
        let (first, collisions) = setup_cube_scene(32, extent);
        let (second, _) = setup_cube_scene(32, extent);

        assert_eq!(collisions.len(), 32);
        assert_eq!(placements(&first), placements(&second));
        for transform in placements(&first) {
            let position = transform.w_axis.truncate();
            assert!(position.cmpge(Vec3::ZERO).all() && position.cmple(Vec3::splat(extent)).all());
        }
    }
}
