use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A ray segment. With `from_segment` the parameter `t` in `[0, 1]` is the
/// hit fraction between the two end points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Ray {
    pub origin: Vector3,

    /// Direction of the ray (not necessarily normalized)
    pub direction: Vector3,
}

impl Ray {
    #[inline]
    pub fn new(origin: Vector3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Ray from `from` towards `to`, with `to` reached at `t = 1`
    #[inline]
    pub fn from_segment(from: Vector3, to: Vector3) -> Self {
        Self::new(from, to - from)
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vector3 {
        self.origin + self.direction * t
    }
}
