use crate::core::BodyHandle;

/// A pair of bodies that could potentially collide.
///
/// The handles are stored in a canonical order so a pair maps to one key
/// regardless of the order it was discovered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
}

impl CollisionPair {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        if body_a <= body_b {
            Self { body_a, body_b }
        } else {
            Self { body_a: body_b, body_b: body_a }
        }
    }

    /// Checks if this collision pair contains the specified body
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// Returns the other body in the pair
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }
}
