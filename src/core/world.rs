use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::bodies::RigidBody;
use crate::collision::{
    BroadPhase, BruteForceBroadPhase, CollisionPair, ContactManifold, ContactSolver,
    SequentialImpulseSolver,
};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::debug::DebugDraw;
use crate::error::PhysicsError;
use crate::math::{Transform, Vector3};
use crate::shapes::SharedShape;
use crate::Result;

/// Source of process-unique world ids; 0 is never handed out
static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

/// The main physics world class that manages all physics objects and simulation
pub struct PhysicsWorld {
    id: u32,

    /// All rigid bodies in the world, in creation order
    pub(crate) bodies: BodyStorage<RigidBody>,

    gravity: Vector3,

    /// Time not yet consumed by fixed sub-steps
    pub(crate) local_time: f32,

    /// Persistent contacts, one manifold per overlapping pair
    pub(crate) manifolds: BTreeMap<CollisionPair, ContactManifold>,

    pub(crate) broad_phase: Box<dyn BroadPhase>,
    pub(crate) solver: Box<dyn ContactSolver>,

    pub(crate) debug_drawer: Option<Box<dyn DebugDraw>>,

    /// Configuration for the simulation
    pub(crate) config: SimulationConfig,

    /// Diagnostics raised during the current step
    pub(crate) warnings: Vec<String>,
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new physics world with the given configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        let id = NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("creating physics world {}", id);

        Self {
            id,
            bodies: BodyStorage::new(id),
            gravity: Vector3::zero(),
            local_time: 0.0,
            manifolds: BTreeMap::new(),
            broad_phase: Box::new(BruteForceBroadPhase::new()),
            solver: Box::new(SequentialImpulseSolver::new()),
            debug_drawer: None,
            config,
            warnings: Vec::new(),
        }
    }

    /// Process-unique id, carried by every handle this world issues
    pub fn get_id(&self) -> u32 {
        self.id
    }

    /// Sets the gravity acceleration applied to every dynamic body
    pub fn set_gravity(&mut self, gravity: Vector3) -> Result<()> {
        if !gravity.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "gravity must be finite, got {}",
                gravity
            )));
        }

        self.gravity = gravity;
        for (_, body) in self.bodies.iter_mut() {
            body.set_gravity(gravity);
        }
        Ok(())
    }

    pub fn get_gravity(&self) -> Vector3 {
        self.gravity
    }

    /// Leftover time carried to the next fixed-step call
    pub fn get_local_time(&self) -> f32 {
        self.local_time
    }

    /// Returns a reference to the simulation configuration
    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns a mutable reference to the simulation configuration
    pub fn get_config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Creates a body and returns its handle.
    ///
    /// A mass of zero creates a static body. The transform must be finite.
    pub fn create_body(&mut self, mass: f32, transform: Transform, shape: SharedShape) -> Result<BodyHandle> {
        let mut body = RigidBody::new(mass, transform, shape)?;
        body.set_gravity(self.gravity);

        let handle = self.bodies.add(body);
        log::trace!("world {}: created body {:?} with mass {}", self.id, handle, mass);
        Ok(handle)
    }

    /// Removes a body and every contact that references it.
    ///
    /// The handle, and any copy of it, is invalid afterwards.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        self.bodies.get_body(handle)?;
        self.manifolds.retain(|pair, _| !pair.contains(handle));

        self.bodies.remove(handle).ok_or_else(|| {
            PhysicsError::InvalidHandle(format!("{:?} refers to a destroyed body", handle))
        })
    }

    /// Gets a reference to a rigid body by its handle
    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get_body(handle)
    }

    /// Gets a mutable reference to a rigid body by its handle
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.get_body_mut(handle)
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// Live body handles in creation order
    pub fn body_handles(&self) -> &[BodyHandle] {
        self.bodies.handles()
    }

    /// Iterates live bodies in creation order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> + '_ {
        self.bodies.iter()
    }

    /// Returns the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Active contact manifolds, ordered by body pair
    pub fn get_contact_manifolds(&self) -> impl Iterator<Item = &ContactManifold> + '_ {
        self.manifolds.values()
    }

    /// Installs or removes the debug drawer
    pub fn set_debug_drawer(&mut self, drawer: Option<Box<dyn DebugDraw>>) {
        self.debug_drawer = drawer;
    }

    pub fn has_debug_drawer(&self) -> bool {
        self.debug_drawer.is_some()
    }

    /// Removes every body and contact. Gravity and configuration are kept.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.manifolds.clear();
        self.local_time = 0.0;
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PhysicsWorld {
    fn drop(&mut self) {
        log::debug!(
            "destroying physics world {} with {} bodies",
            self.id,
            self.bodies.len()
        );
    }
}
