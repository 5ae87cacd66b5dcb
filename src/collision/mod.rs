mod collision_pair;
mod broad_phase;
mod narrow_phase;
mod contact_solver;
mod gjk;
mod epa;
mod collision_filter;
mod contact_manifold;

pub use self::collision_pair::CollisionPair;
pub use self::broad_phase::{BroadPhase, BruteForceBroadPhase};
pub use self::narrow_phase::{NarrowPhase, ContactPoint};
pub use self::contact_solver::{ContactSolver, SequentialImpulseSolver};
pub use self::gjk::{GJK, GjkResult, ConvexProxy};
pub use self::epa::{EPA, Penetration};
pub use self::collision_filter::{CollisionFilterGroups, should_collide, groups_accept};
pub use self::contact_manifold::{ContactManifold, ManifoldPoint, MAX_CONTACT_POINTS};
