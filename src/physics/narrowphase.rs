//! Narrowphase intersection test: GJK over the Minkowski difference of two hulls.

use glam::Vec3;
use tracing::trace;

use super::error::{CollisionError, Result};
use super::support::{support, Hull, SupportPoint};
use super::CollisionConfig;

/// A simplex used by the GJK algorithm (up to 4 vertices in 3D).
///
/// Points are stored oldest first; the most recently added point is last.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplex {
    points: Vec<SupportPoint>,
}

impl Simplex {
    pub(crate) fn new() -> Self {
        Self {
            points: Vec::with_capacity(4),
        }
    }

    fn push(&mut self, point: SupportPoint) {
        debug_assert!(self.points.len() < 4, "simplex overflow");
        self.points.push(point);
    }

    fn set(&mut self, points: &[SupportPoint]) {
        self.points.clear();
        self.points.extend_from_slice(points);
    }

    /// Number of points (1 to 4).
    pub fn dim(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[SupportPoint] {
        &self.points
    }

    /// The same simplex expressed in the Minkowski difference `B - A`.
    pub fn mirrored(&self) -> Simplex {
        Simplex {
            points: self.points.iter().map(SupportPoint::mirrored).collect(),
        }
    }
}

/// Triple cross product: (a x b) x c
#[inline]
fn triple_cross_product(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    a.cross(b).cross(c)
}

/// Direction perpendicular to `edge` toward the origin, as seen from `from`.
///
/// Falls back to an arbitrary perpendicular when the origin lies on the edge.
#[inline]
fn edge_normal_toward_origin(edge: Vec3, to_origin: Vec3) -> Vec3 {
    let direction = triple_cross_product(edge, to_origin, edge);
    if direction.length_squared() > f32::EPSILON * edge.length_squared() {
        direction
    } else {
        edge.normalize().any_orthonormal_vector()
    }
}

/// GJK intersection test.
///
/// Returns the enclosing tetrahedron if the hulls intersect, `None` if a
/// separating axis was found or the iteration cap was reached, and
/// [`CollisionError::DegenerateDirection`] if the search direction collapsed.
pub fn gjk_intersection(
    hull_a: &Hull,
    hull_b: &Hull,
    config: &CollisionConfig,
) -> Result<Option<Simplex>> {
    let mut first = support(hull_a, hull_b, Vec3::X);
    if first.point.dot(Vec3::X).abs() > config.axis_alignment_threshold * first.point.length() {
        first = support(hull_a, hull_b, Vec3::Y);
    }

    let mut simplex = Simplex::new();
    simplex.push(first);
    let mut direction = -first.point;

    for _ in 0..config.gjk_max_iterations {
        if direction.length_squared() < config.direction_epsilon {
            return Err(CollisionError::DegenerateDirection);
        }

        let new_point = support(hull_a, hull_b, direction);
        if new_point.point.dot(direction) < 0.0 {
            return Ok(None);
        }
        simplex.push(new_point);

        if do_simplex(&mut simplex, &mut direction) {
            return Ok(Some(simplex));
        }
    }

    trace!(
        iterations = config.gjk_max_iterations,
        "GJK iteration cap reached, treating pair as separated"
    );
    Ok(None)
}

/// Convenience wrapper: `true` only when GJK confirms an intersection.
pub fn intersects(hull_a: &Hull, hull_b: &Hull, config: &CollisionConfig) -> bool {
    matches!(gjk_intersection(hull_a, hull_b, config), Ok(Some(_)))
}

/// Process the simplex and update the search direction.
/// Returns true if the origin is contained in the simplex.
fn do_simplex(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    match simplex.dim() {
        2 => do_simplex_line(simplex, direction),
        3 => do_simplex_triangle(simplex, direction),
        4 => do_simplex_tetrahedron(simplex, direction),
        _ => false,
    }
}

fn do_simplex_line(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let a = simplex.points[1]; // Most recently added
    let b = simplex.points[0];
    let ab = b.point - a.point;
    let ao = -a.point;

    if ab.dot(ao) > 0.0 {
        *direction = edge_normal_toward_origin(ab, ao);
    } else {
        simplex.set(&[a]);
        *direction = ao;
    }
    false
}

fn do_simplex_triangle(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let a = simplex.points[2]; // Most recently added
    let b = simplex.points[1];
    let c = simplex.points[0];
    let ab = b.point - a.point;
    let ac = c.point - a.point;
    let ao = -a.point;
    let abc = ab.cross(ac);

    if abc.cross(ac).dot(ao) > 0.0 {
        if ac.dot(ao) > 0.0 {
            simplex.set(&[c, a]);
            *direction = edge_normal_toward_origin(ac, ao);
        } else {
            simplex.set(&[b, a]);
            return do_simplex_line(simplex, direction);
        }
    } else if ab.cross(abc).dot(ao) > 0.0 {
        simplex.set(&[b, a]);
        return do_simplex_line(simplex, direction);
    } else if abc.dot(ao) > 0.0 {
        // Winding already matches the search direction
        *direction = abc;
    } else {
        simplex.set(&[b, c, a]);
        *direction = -abc;
    }
    false
}

fn do_simplex_tetrahedron(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let a = simplex.points[3]; // Most recently added
    let b = simplex.points[2];
    let c = simplex.points[1];
    let d = simplex.points[0];
    let ab = b.point - a.point;
    let ac = c.point - a.point;
    let ad = d.point - a.point;
    let ao = -a.point;

    // Outward normals of the three faces touching the new point
    let abc = ab.cross(ac);
    let acd = ac.cross(ad);
    let adb = ad.cross(ab);

    if abc.dot(ao) > 0.0 {
        simplex.set(&[c, b, a]);
        return do_simplex_triangle(simplex, direction);
    }
    if acd.dot(ao) > 0.0 {
        simplex.set(&[d, c, a]);
        return do_simplex_triangle(simplex, direction);
    }
    if adb.dot(ao) > 0.0 {
        simplex.set(&[b, d, a]);
        return do_simplex_triangle(simplex, direction);
    }

    // Origin is inside the tetrahedron
    true
}
