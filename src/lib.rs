//! Rein Collision
//!
//! Collision detection for convex polyhedral colliders attached to hecs entities.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - Components the engine reads (`GlobalTransform`, `MeshInstances`)
//! 2. **physics** - Bounds, sweep-and-prune, GJK, EPA, raycasting and the
//!    per-tick [`CollisionWorld`]

pub mod ecs;
pub mod physics;

pub use ecs::prelude::*;

pub use physics::bounds::Bounds;
pub use physics::collider::{Collider, ColliderId};
pub use physics::contact::Collision;
pub use physics::debug::{bounds_lines, collision_lines, DebugVertex};
pub use physics::error::{CollisionError, Result};
pub use physics::raycast::{Ray, RayHit};
pub use physics::source::EntitySource;
pub use physics::{CollisionConfig, CollisionWorld};

// Re-export glam for convenience
pub use glam;
