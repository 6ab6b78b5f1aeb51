//! Axis-aligned bounding boxes used by the broad phase and ray pre-filter.

use glam::{Mat4, Vec3};

use super::raycast::Ray;

/// Direction components smaller than this are replaced by it in the slab test.
const SLAB_EPSILON: f32 = 1e-8;

/// Axis-aligned bounding box.
///
/// `min <= max` holds on every axis for boxes built through [`Bounds::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Create a box spanning two corners given in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box enclosing a set of points. Returns `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Get the center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get all 8 corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Smallest box enclosing both boxes.
    pub fn merge(&self, other: &Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Closed-interval overlap test on all three axes. Touching boxes overlap.
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Check whether `point` lies inside the box, with `epsilon` slack on every side.
    pub fn point_inside(&self, point: Vec3, epsilon: f32) -> bool {
        point.x >= self.min.x - epsilon
            && point.x <= self.max.x + epsilon
            && point.y >= self.min.y - epsilon
            && point.y <= self.max.y + epsilon
            && point.z >= self.min.z - epsilon
            && point.z <= self.max.z + epsilon
    }

    /// Bound this box after transformation by an affine `model` matrix.
    ///
    /// Each basis column contributes its smaller and larger product with the
    /// box extent on that axis, so the result encloses every rotated/scaled
    /// corner without transforming the corners themselves.
    pub fn transformed(&self, model: Mat4) -> Bounds {
        let translation = model.w_axis.truncate();
        let columns = [
            model.x_axis.truncate(),
            model.y_axis.truncate(),
            model.z_axis.truncate(),
        ];

        let mut min = translation;
        let mut max = translation;
        for (axis, column) in columns.into_iter().enumerate() {
            let a = column * self.min[axis];
            let b = column * self.max[axis];
            min += a.min(b);
            max += a.max(b);
        }

        Bounds { min, max }
    }

    /// Slab test. Returns the entry point of `ray` into the box.
    ///
    /// A ray starting inside the box does not report a hit.
    pub fn ray_intersect(&self, ray: &Ray) -> Option<Vec3> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for axis in 0..3 {
            let mut dir = ray.direction[axis];
            if dir.abs() < SLAB_EPSILON {
                dir = SLAB_EPSILON.copysign(dir);
            }
            let t1 = (self.min[axis] - ray.origin[axis]) / dir;
            let t2 = (self.max[axis] - ray.origin[axis]) / dir;
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmin > 0.0 && tmax >= tmin {
            Some(ray.origin + ray.direction * tmin)
        } else {
            None
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}
