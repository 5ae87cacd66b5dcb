pub mod world;
pub mod config;
pub mod storage;
pub mod raycast;
mod simulation;

pub use self::world::PhysicsWorld;
pub use self::config::SimulationConfig;
pub use self::storage::BodyStorage;
pub use self::raycast::{RayCastResult, RayCastFlags};

/// A handle to a body in a physics world.
///
/// Handles are only valid for the world that issued them and only until the
/// body is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    pub(crate) world_id: u32,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl BodyHandle {
    /// Id of the world that owns the body
    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    /// Arena slot; reused after the body is destroyed
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
