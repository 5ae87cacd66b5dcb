use crate::core::BodyHandle;
use crate::bodies::RigidBody;
use crate::math::Aabb;
use crate::collision::collision_filter::should_collide;
use crate::collision::collision_pair::CollisionPair;

/// Trait for broad-phase collision detection algorithms
pub trait BroadPhase {
    /// Updates the broad-phase with the current body states, in creation order
    fn update(&mut self, bodies: &[(BodyHandle, &RigidBody)], margin: f32);

    /// Pairs whose bounds overlap and whose filters accept each other
    fn get_collision_pairs(&self) -> Vec<CollisionPair>;
}

/// Simple brute-force broad-phase algorithm
#[derive(Debug, Default)]
pub struct BruteForceBroadPhase {
    pairs: Vec<CollisionPair>,
}

impl BruteForceBroadPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn update(&mut self, bodies: &[(BodyHandle, &RigidBody)], margin: f32) {
        self.pairs.clear();

        let bounds: Vec<Aabb> = bodies
            .iter()
            .map(|(_, body)| body.get_aabb().expand(margin))
            .collect();

        for i in 0..bodies.len() {
            let (handle_a, body_a) = bodies[i];
            for j in (i + 1)..bodies.len() {
                let (handle_b, body_b) = bodies[j];
                if !should_collide(body_a, body_b) {
                    continue;
                }
                if bounds[i].intersects(&bounds[j]) {
                    self.pairs.push(CollisionPair::new(handle_a, handle_b));
                }
            }
        }
    }

    fn get_collision_pairs(&self) -> Vec<CollisionPair> {
        self.pairs.clone()
    }
}
