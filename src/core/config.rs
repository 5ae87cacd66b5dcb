#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the physics simulation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Fixed sub-step length used by [`PhysicsWorld::step`](crate::PhysicsWorld::step)
    pub fixed_time_step: f32,

    /// Sub-step cap used by [`PhysicsWorld::step`](crate::PhysicsWorld::step)
    pub max_sub_steps: u32,

    /// Number of sequential impulse iterations per sub-step
    pub solver_iterations: u32,

    /// Error reduction parameter for penetrations resolved through the velocity
    pub erp: f32,

    /// Whether deep penetrations are resolved through the push/turn channels
    pub split_impulse: bool,

    /// Error reduction parameter for split impulses
    pub split_impulse_erp: f32,

    /// Penetrations deeper than this (negative) distance use split impulses
    pub split_impulse_penetration_threshold: f32,

    /// Approach speeds below this are treated as resting (no bounce)
    pub restitution_velocity_threshold: f32,

    /// Contact points older than this many sub-steps no longer bounce
    pub resting_contact_restitution_threshold: u32,

    /// Contacts farther apart than this are dropped from manifolds
    pub contact_breaking_threshold: f32,

    /// Fraction of last sub-step's impulses used to warm start the solver
    pub warm_starting_factor: f32,

    /// Margin added around every body's bounds in the broadphase
    pub aabb_margin: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: 1.0 / 60.0,
            max_sub_steps: 1,
            solver_iterations: 10,
            erp: 0.2,
            split_impulse: true,
            split_impulse_erp: 0.8,
            split_impulse_penetration_threshold: -0.04,
            restitution_velocity_threshold: 0.2,
            resting_contact_restitution_threshold: 2,
            contact_breaking_threshold: 0.02,
            warm_starting_factor: 0.85,
            aabb_margin: 0.04,
        }
    }
}
