//! Line-list geometry for visualizing bounds and contacts.
//!
//! The vertices are plain `#[repr(C)]` data and can be uploaded to a GPU
//! vertex buffer as-is with [`bytemuck::cast_slice`].

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::bounds::Bounds;
use super::contact::Collision;

/// Vertex with position and color, drawn as a line list.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DebugVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl DebugVertex {
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    fn at(position: Vec3, color: [f32; 4]) -> Self {
        Self::new(position.to_array(), color)
    }
}

/// 12 edges of the box indexed into [`Bounds::corners`].
const BOX_EDGES: [(usize, usize); 12] = [
    // Bottom face
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    // Top face
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    // Vertical edges
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Wireframe box: 24 vertices, two per edge.
pub fn bounds_lines(bounds: &Bounds, color: [f32; 4]) -> Vec<DebugVertex> {
    let corners = bounds.corners();
    let mut vertices = Vec::with_capacity(BOX_EDGES.len() * 2);
    for (i, j) in BOX_EDGES {
        vertices.push(DebugVertex::at(corners[i], color));
        vertices.push(DebugVertex::at(corners[j], color));
    }
    vertices
}

/// Contact visualization in Minkowski-difference space and world space.
///
/// Emits the outline of the EPA face the result came from, a segment along
/// the normal of length `depth` starting at the origin's projection, and a
/// segment joining the two witness points.
pub fn collision_lines(collision: &Collision, color: [f32; 4]) -> Vec<DebugVertex> {
    let face = &collision.face;
    let (a, b, c) = (face.a.point, face.b.point, face.c.point);
    let mut vertices = Vec::with_capacity(10);

    for (from, to) in [(a, b), (b, c), (c, a)] {
        vertices.push(DebugVertex::at(from, color));
        vertices.push(DebugVertex::at(to, color));
    }

    let projected = collision.normal * collision.depth;
    vertices.push(DebugVertex::at(Vec3::ZERO, color));
    vertices.push(DebugVertex::at(projected, color));

    vertices.push(DebugVertex::at(collision.point1, color));
    vertices.push(DebugVertex::at(collision.point2, color));

    vertices
}
