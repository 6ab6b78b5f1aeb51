//! Collision engine errors.

use thiserror::Error;

use super::collider::ColliderId;

/// Errors reported by the collision engine.
///
/// Geometry failures (`DegenerateDirection`, `EpaDidNotConverge`,
/// `DegeneratePolytope`) are local to one pair on one tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    #[error("collider {0:?} is not registered")]
    UnknownCollider(ColliderId),

    #[error("entity {0:?} has no world transform")]
    MissingTransform(hecs::Entity),

    #[error("entity {0:?} has no mesh instances")]
    MissingMesh(hecs::Entity),

    #[error("entity {0:?} has meshes but no vertices")]
    EmptyHull(hecs::Entity),

    #[error("GJK search direction collapsed to zero")]
    DegenerateDirection,

    #[error("EPA did not converge after {0} iterations")]
    EpaDidNotConverge(u32),

    #[error("EPA polytope has no usable faces")]
    DegeneratePolytope,
}

pub type Result<T> = std::result::Result<T, CollisionError>;
