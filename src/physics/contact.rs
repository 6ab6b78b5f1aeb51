//! Contact data produced by the narrow phase.

use glam::Vec3;

use super::collider::ColliderId;
use super::support::SupportPoint;

/// Cross products shorter than this mark a face as zero-area.
const FACE_EPSILON: f32 = 1e-10;

/// Triangle of the EPA polytope.
///
/// `normal` is unit length and follows the winding `a -> b -> c`, or is zero
/// for a zero-area triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportFace {
    pub a: SupportPoint,
    pub b: SupportPoint,
    pub c: SupportPoint,
    pub normal: Vec3,
}

impl SupportFace {
    pub fn new(a: SupportPoint, b: SupportPoint, c: SupportPoint) -> Self {
        let cross = (b.point - a.point).cross(c.point - a.point);
        let len = cross.length();
        let normal = if len < FACE_EPSILON || !len.is_finite() {
            Vec3::ZERO
        } else {
            cross / len
        };
        Self { a, b, c, normal }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::ZERO
    }

    /// Distance from the origin to the face's plane.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.normal.dot(self.a.point).abs()
    }

    /// Whether `point` lies strictly in front of the face.
    #[inline]
    pub fn sees(&self, point: Vec3) -> bool {
        self.normal.dot(point - self.a.point) > 0.0
    }

    pub fn edges(&self) -> [SupportEdge; 3] {
        [
            SupportEdge::new(self.a, self.b),
            SupportEdge::new(self.b, self.c),
            SupportEdge::new(self.c, self.a),
        ]
    }

    /// Barycentric weights `(u, v, w)` of `p` projected onto the face plane,
    /// relative to `a`, `b`, `c`. `None` for a zero-area face.
    pub fn barycentric(&self, p: Vec3) -> Option<Vec3> {
        if self.is_degenerate() {
            return None;
        }
        let v0 = self.b.point - self.a.point;
        let v1 = self.c.point - self.a.point;
        let v2 = p - self.a.point;

        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < FACE_EPSILON * FACE_EPSILON {
            return None;
        }
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Some(Vec3::new(1.0 - v - w, v, w))
    }

    /// Barycentric weights of the origin's projection onto the face.
    pub fn origin_barycentric(&self) -> Option<Vec3> {
        self.barycentric(self.normal * self.normal.dot(self.a.point))
    }
}

/// Directed polytope edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportEdge {
    pub a: SupportPoint,
    pub b: SupportPoint,
}

impl SupportEdge {
    pub fn new(a: SupportPoint, b: SupportPoint) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn is_reverse_of(&self, other: &SupportEdge) -> bool {
        self.a == other.b && self.b == other.a
    }
}

/// Penetration between two colliders, as seen from `object1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub object1: ColliderId,
    pub object2: ColliderId,
    /// Unit contact normal pointing from `object1` toward `object2`.
    pub normal: Vec3,
    /// Penetration depth along `normal`.
    pub depth: f32,
    /// Witness point on `object1`, world space.
    pub point1: Vec3,
    /// Witness point on `object2`, world space.
    pub point2: Vec3,
    /// Polytope face the result was read from.
    pub face: SupportFace,
}

impl Collision {
    /// Translation that moves `object1` out of `object2`.
    pub fn separation(&self) -> Vec3 {
        -self.normal * self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(p: Vec3) -> SupportPoint {
        SupportPoint::new(p, Vec3::ZERO)
    }

    #[test]
    fn test_face_normal_is_unit() {
        let face = SupportFace::new(
            sp(Vec3::new(0.0, 0.0, 2.0)),
            sp(Vec3::new(4.0, 0.0, 2.0)),
            sp(Vec3::new(0.0, 4.0, 2.0)),
        );
        assert!((face.normal - Vec3::Z).length() < 1e-6);
        assert!((face.distance() - 2.0).abs() < 1e-6);
        assert!(face.sees(Vec3::new(0.0, 0.0, 3.0)));
        assert!(!face.sees(Vec3::ZERO));
    }

    #[test]
    fn test_degenerate_face() {
        let face = SupportFace::new(sp(Vec3::ZERO), sp(Vec3::X), sp(Vec3::X * 2.0));
        assert!(face.is_degenerate());
        assert!(face.origin_barycentric().is_none());
    }

    #[test]
    fn test_sliver_face_has_normal_but_no_weights() {
        let face = SupportFace::new(
            sp(Vec3::new(0.0, 0.0, 1.0)),
            sp(Vec3::new(1.0, 0.0, 1.0)),
            sp(Vec3::new(1.0, 1e-5, 1.0)),
        );
        assert!(!face.is_degenerate());
        assert!((face.normal - Vec3::Z).length() < 1e-6);
        assert!(face.origin_barycentric().is_none());
    }

    #[test]
    fn test_origin_barycentric_sums_to_one() {
        let face = SupportFace::new(
            sp(Vec3::new(-1.0, -1.0, 1.0)),
            sp(Vec3::new(2.0, -1.0, 1.0)),
            sp(Vec3::new(-1.0, 2.0, 1.0)),
        );
        let w = face.origin_barycentric().unwrap();
        assert!((w.x + w.y + w.z - 1.0).abs() < 1e-5);
        assert!((w - Vec3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_edges_cancel_across_shared_side() {
        let (p, q, r, s) = (
            sp(Vec3::ZERO),
            sp(Vec3::X),
            sp(Vec3::Y),
            sp(Vec3::new(1.0, 1.0, 0.0)),
        );
        let first = SupportFace::new(p, q, r);
        let second = SupportFace::new(q, s, r);
        let shared = first.edges()[1];
        assert!(second.edges()[2].is_reverse_of(&shared));
        assert!(!first.edges()[0].is_reverse_of(&shared));
    }

    #[test]
    fn test_separation_opposes_normal() {
        let face = SupportFace::new(sp(Vec3::ZERO), sp(Vec3::X), sp(Vec3::Y));
        let c = Collision {
            object1: ColliderId::default(),
            object2: ColliderId::default(),
            normal: Vec3::X,
            depth: 0.25,
            point1: Vec3::ZERO,
            point2: Vec3::ZERO,
            face,
        };
        assert_eq!(c.separation(), Vec3::new(-0.25, 0.0, 0.0));
    }
}
