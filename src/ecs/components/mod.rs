//! ECS components read by the collision engine (transforms, meshes).

pub mod mesh;
pub mod transform;

pub use mesh::*;
pub use transform::*;
