//! Support mapping over transformed vertex sets.

use glam::{Mat3, Mat4, Vec3};

use super::error::{CollisionError, Result};
use super::source::EntitySource;

/// A vertex of the Minkowski difference `A - B` together with the world-space
/// vertices of A and B that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportPoint {
    /// `s1 - s2`.
    pub point: Vec3,
    /// Vertex on hull A.
    pub s1: Vec3,
    /// Vertex on hull B.
    pub s2: Vec3,
}

impl SupportPoint {
    pub fn new(s1: Vec3, s2: Vec3) -> Self {
        Self {
            point: s1 - s2,
            s1,
            s2,
        }
    }

    /// The same pair of vertices seen as a point of `B - A`.
    pub fn mirrored(&self) -> Self {
        Self {
            point: -self.point,
            s1: self.s2,
            s2: self.s1,
        }
    }
}

/// Convex hull of an entity's mesh vertices, placed in the world by a model matrix.
#[derive(Debug, Clone)]
pub struct Hull {
    model: Mat4,
    /// Transpose of the model's linear part: maps world directions to the
    /// object-space directions with the same support vertex.
    direction_to_local: Mat3,
    vertices: Vec<Vec3>,
}

impl Hull {
    /// Create a hull from object-space vertices. Returns `None` for an empty set.
    pub fn new(model: Mat4, vertices: Vec<Vec3>) -> Option<Self> {
        if vertices.is_empty() {
            return None;
        }
        Some(Self {
            model,
            direction_to_local: Mat3::from_mat4(model).transpose(),
            vertices,
        })
    }

    /// Gather every vertex of every mesh bound to `entity`.
    pub fn from_entity<S: EntitySource>(source: &S, entity: hecs::Entity) -> Result<Self> {
        let model = source
            .model_matrix(entity)
            .ok_or(CollisionError::MissingTransform(entity))?;
        let vertices = source
            .with_meshes(entity, |meshes| {
                meshes
                    .flat_map(|mesh| mesh.positions().iter().copied())
                    .collect::<Vec<_>>()
            })
            .ok_or(CollisionError::MissingMesh(entity))?;
        Self::new(model, vertices).ok_or(CollisionError::EmptyHull(entity))
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// World-space vertex furthest along `direction`.
    ///
    /// Ties keep the first vertex in mesh order.
    pub fn furthest_point(&self, direction: Vec3) -> Vec3 {
        let local_dir = self.direction_to_local * direction;

        let mut best = self.vertices[0];
        let mut best_dot = best.dot(local_dir);
        for v in &self.vertices[1..] {
            let d = v.dot(local_dir);
            if d > best_dot {
                best_dot = d;
                best = *v;
            }
        }

        self.model.transform_point3(best)
    }
}

/// Minkowski difference support function.
#[inline]
pub fn support(hull_a: &Hull, hull_b: &Hull, direction: Vec3) -> SupportPoint {
    let a = hull_a.furthest_point(direction);
    let b = hull_b.furthest_point(-direction);
    SupportPoint::new(a, b)
}
