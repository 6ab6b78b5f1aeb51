//! Ray casting against collider meshes.

use glam::{Mat3, Mat4, Vec3};

use crate::ecs::components::mesh::CollisionMesh;

use super::collider::ColliderId;

/// Determinant threshold below which a ray is treated as parallel to a triangle.
const PARALLEL_EPSILON: f32 = 1e-7;

/// A ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Direction. [`Ray::new`] normalizes it; a ray built field by field
    /// may carry any length.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Express this ray in the space described by `matrix`.
    ///
    /// The direction is transformed but not renormalized, so a parameter `t`
    /// names the same point in both spaces.
    pub(crate) fn transformed(&self, matrix: Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

/// Nearest ray hit against a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Hit point in world space.
    pub position: Vec3,
    /// Unit surface normal in world space, facing the ray origin.
    pub normal: Vec3,
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    pub collider: ColliderId,
    pub entity: hecs::Entity,
}

/// Möller–Trumbore ray/triangle test. Returns the ray parameter of the hit.
///
/// Triangles are two-sided.
pub fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - v0;
    let u = inv_det * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    (t >= 0.0).then_some(t)
}

/// Object-space hit against one mesh: ray parameter and unnormalized triangle normal.
pub(crate) fn intersect_mesh(local_ray: &Ray, mesh: &CollisionMesh) -> Option<(f32, Vec3)> {
    let mut best: Option<(f32, Vec3)> = None;

    for [v0, v1, v2] in mesh.triangles() {
        if let Some(t) = intersect_triangle(local_ray, v0, v1, v2) {
            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, (v1 - v0).cross(v2 - v0)));
            }
        }
    }

    best
}

/// Bring an object-space normal to world space and turn it to face the ray.
pub(crate) fn world_normal(inverse_model: Mat4, local_normal: Vec3, ray_direction: Vec3) -> Vec3 {
    let normal_matrix = Mat3::from_mat4(inverse_model).transpose();
    let n = (normal_matrix * local_normal).normalize_or_zero();
    if n.dot(ray_direction) > 0.0 {
        -n
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_hit() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 5.0), -Vec3::Z);
        let t = intersect_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_back_face_hit() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, -5.0), Vec3::Z);
        assert!(intersect_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).is_some());
    }

    #[test]
    fn test_triangle_miss_outside() {
        let ray = Ray::new(Vec3::new(1.0, 1.0, 5.0), -Vec3::Z);
        assert!(intersect_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_triangle_parallel() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X);
        assert!(intersect_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_triangle_behind_origin() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::Z);
        assert!(intersect_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_transformed_ray_keeps_parameter() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        let scale = Mat4::from_scale(Vec3::splat(0.5));
        let local = ray.transformed(scale);
        assert!((local.point_at(4.0) - scale.transform_point3(ray.point_at(4.0))).length() < 1e-5);
    }

    #[test]
    fn test_world_normal_faces_ray() {
        let n = world_normal(Mat4::IDENTITY, Vec3::Z * 3.0, Vec3::Z);
        assert!((n + Vec3::Z).length() < 1e-6);
    }
}
