//! EPA (Expanding Polytope Algorithm): penetration depth, contact normal and
//! witness points for a pair GJK reported as intersecting.

use glam::Vec3;
use tracing::trace;

use super::collider::ColliderId;
use super::contact::{Collision, SupportEdge, SupportFace};
use super::error::{CollisionError, Result};
use super::narrowphase::Simplex;
use super::support::{support, Hull, SupportPoint};
use super::CollisionConfig;

/// Faces closer than this to the minimum distance count as coplanar ties.
const COPLANAR_EPSILON: f32 = 1e-5;

/// Facets of the initial tetrahedron with the index of the vertex opposite each.
const TETRAHEDRON_FACES: [([usize; 3], usize); 4] = [
    ([0, 1, 2], 3),
    ([0, 3, 1], 2),
    ([0, 2, 3], 1),
    ([1, 3, 2], 0),
];

/// Expand the GJK tetrahedron until the closest face lies on the Minkowski
/// difference boundary.
///
/// The returned normal points from `object1` (hull A) toward `object2`
/// (hull B). Failing to converge within `config.epa_max_iterations` is
/// reported as [`CollisionError::EpaDidNotConverge`].
pub fn epa_penetration(
    simplex: &Simplex,
    hull_a: &Hull,
    hull_b: &Hull,
    object1: ColliderId,
    object2: ColliderId,
    config: &CollisionConfig,
) -> Result<Collision> {
    if simplex.dim() != 4 {
        return Err(CollisionError::DegeneratePolytope);
    }
    let mut faces = initial_faces(simplex.points());

    for iteration in 0..config.epa_max_iterations {
        let (index, min_dist) = closest_face(&faces).ok_or(CollisionError::DegeneratePolytope)?;
        let face = faces[index];

        let new_point = support(hull_a, hull_b, face.normal);
        let new_dist = new_point.point.dot(face.normal);

        if new_dist - min_dist < config.epa_tolerance {
            let Some(weights) = converged_weights(&mut faces, index) else {
                continue;
            };
            trace!(iteration, depth = min_dist, "EPA converged");
            return Ok(Collision {
                object1,
                object2,
                normal: face.normal,
                depth: min_dist,
                point1: interpolate(weights, face.a.s1, face.b.s1, face.c.s1),
                point2: interpolate(weights, face.a.s2, face.b.s2, face.c.s2),
                face,
            });
        }

        expand(&mut faces, new_point);
    }

    Err(CollisionError::EpaDidNotConverge(config.epa_max_iterations))
}

/// Barycentric weights of the origin on a converged face. A sliver face
/// without usable weights is removed from the polytope instead.
fn converged_weights(faces: &mut Vec<SupportFace>, index: usize) -> Option<Vec3> {
    let weights = faces[index].origin_barycentric();
    if weights.is_none() {
        faces.swap_remove(index);
    }
    weights
}

/// Build the four facets, each wound so its normal points away from the opposite vertex.
fn initial_faces(points: &[SupportPoint]) -> Vec<SupportFace> {
    let mut faces = Vec::with_capacity(32);
    for ([i, j, k], opposite) in TETRAHEDRON_FACES {
        let face = SupportFace::new(points[i], points[j], points[k]);
        if face.sees(points[opposite].point) {
            faces.push(SupportFace::new(points[i], points[k], points[j]));
        } else {
            faces.push(face);
        }
    }
    faces
}

/// Index and distance of the non-degenerate face closest to the origin.
///
/// Among coplanar ties the face containing the origin's projection wins.
fn closest_face(faces: &[SupportFace]) -> Option<(usize, f32)> {
    let min_dist = faces
        .iter()
        .filter(|face| !face.is_degenerate())
        .map(SupportFace::distance)
        .min_by(f32::total_cmp)?;

    faces
        .iter()
        .enumerate()
        .filter(|(_, face)| !face.is_degenerate() && face.distance() - min_dist <= COPLANAR_EPSILON)
        .map(|(i, face)| {
            let containment = face
                .origin_barycentric()
                .map_or(f32::NEG_INFINITY, Vec3::min_element);
            (i, face.distance(), containment)
        })
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(i, dist, _)| (i, dist))
}

/// Remove every face visible from `new_point` and stitch the resulting hole
/// to it.
fn expand(faces: &mut Vec<SupportFace>, new_point: SupportPoint) {
    let mut edges: Vec<SupportEdge> = Vec::new();
    faces.retain(|face| {
        if face.sees(new_point.point) {
            for edge in face.edges() {
                add_edge(&mut edges, edge);
            }
            false
        } else {
            true
        }
    });

    for edge in edges {
        faces.push(SupportFace::new(edge.a, edge.b, new_point));
    }
}

/// Add an edge to the silhouette, cancelling it against its reverse if
/// that is already present (an edge shared by two removed faces).
fn add_edge(edges: &mut Vec<SupportEdge>, edge: SupportEdge) {
    if let Some(pos) = edges.iter().position(|e| e.is_reverse_of(&edge)) {
        edges.swap_remove(pos);
    } else {
        edges.push(edge);
    }
}

#[inline]
fn interpolate(weights: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    a * weights.x + b * weights.y + c * weights.z
}
