pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod debug;
pub mod ffi;

/// Re-export common types for easier usage
pub use crate::core::{PhysicsWorld, SimulationConfig, BodyHandle, RayCastFlags, RayCastResult};
pub use crate::bodies::{RigidBody, RigidBodyType, Material, AnisotropicFrictionMode};
pub use crate::shapes::{Shape, SharedShape, ShapeType, Axis};
pub use crate::collision::CollisionFilterGroups;
pub use crate::debug::{DebugDraw, DebugDrawModes};
pub use crate::math::{Vector3, Transform, Quaternion};

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Invalid handle: {0}")]
        InvalidHandle(String),

        #[error("Unsupported shape: {0}")]
        UnsupportedShape(String),

        #[error("Simulation stability error: {0}")]
        SimulationError(String),
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
