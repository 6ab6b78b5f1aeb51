//! Collision mesh components.

use std::sync::Arc;

use glam::Vec3;

use crate::physics::bounds::Bounds;

/// Object-space triangle mesh consumed by the collision engine.
///
/// Colliders treat the vertex set as a convex hull; the triangles are only
/// used for ray casting.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Bounds,
}

impl CollisionMesh {
    /// Create a mesh, computing its object-space bounds from the positions.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Bounds::from_points(positions.iter().copied()).unwrap_or_default();
        Self::with_bounds(positions, indices, bounds)
    }

    /// Create a mesh with bounds precomputed by the asset loader.
    pub fn with_bounds(positions: Vec<Vec3>, indices: Vec<u32>, bounds: Bounds) -> Self {
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// Axis-aligned box centered at the origin.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        // Two counter-clockwise triangles per face, outward winding
        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6, 4, 6, 7, // +Z
            1, 0, 3, 1, 3, 2, // -Z
            5, 1, 2, 5, 2, 6, // +X
            0, 4, 7, 0, 7, 3, // -X
            7, 6, 2, 7, 2, 3, // +Y
            0, 1, 5, 0, 5, 4, // -Y
        ];
        Self::new(positions, indices)
    }

    /// Cube with edge length `size`, centered at the origin.
    pub fn cube(size: f32) -> Self {
        Self::cuboid(Vec3::splat(size * 0.5))
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Precomputed object-space bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Iterate triangles as vertex triples. Out-of-range indices and a
    /// trailing partial triangle are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

/// Mesh instances attached to an entity. Meshes may be shared between entities.
#[derive(Debug, Clone, Default)]
pub struct MeshInstances(pub Vec<Arc<CollisionMesh>>);

impl MeshInstances {
    pub fn single(mesh: CollisionMesh) -> Self {
        Self(vec![Arc::new(mesh)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_bounds() {
        let mesh = CollisionMesh::cuboid(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.bounds().min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds().max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.positions().len(), 8);
        assert_eq!(mesh.triangles().count(), 12);
    }

    #[test]
    fn test_cuboid_indices() {
        let mesh = CollisionMesh::cube(1.0);
        assert_eq!(mesh.indices().len(), 36);
        assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.positions().len()));
    }

    #[test]
    fn test_cuboid_winding_is_outward() {
        let mesh = CollisionMesh::cube(2.0);
        for [a, b, c] in mesh.triangles() {
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_triangles_skip_bad_indices() {
        let mesh = CollisionMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2, 0, 1, 9, 0]);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn test_empty_mesh_has_default_bounds() {
        let mesh = CollisionMesh::new(Vec::new(), Vec::new());
        assert_eq!(mesh.bounds(), Bounds::default());
    }
}
