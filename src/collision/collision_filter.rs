use bitflags::bitflags;
use crate::bodies::RigidBody;

bitflags! {
    /// Collision group bits. A pair is tested only when each body's group
    /// intersects the other body's mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionFilterGroups: i32 {
        const DEFAULT = 1;
        const STATIC = 2;
        const KINEMATIC = 4;
        const DEBRIS = 8;
        const SENSOR_TRIGGER = 16;
        const CHARACTER = 32;
        const ALL = -1;
    }
}

impl Default for CollisionFilterGroups {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CollisionFilterGroups {
    /// Group and mask assigned to a new body
    pub fn defaults_for(is_static: bool) -> (Self, Self) {
        if is_static {
            (Self::STATIC, Self::ALL ^ Self::STATIC)
        } else {
            (Self::DEFAULT, Self::ALL)
        }
    }
}

/// Whether a group/mask pair accepts another group/mask pair
#[inline]
pub fn groups_accept(
    group_a: CollisionFilterGroups,
    mask_a: CollisionFilterGroups,
    group_b: CollisionFilterGroups,
    mask_b: CollisionFilterGroups,
) -> bool {
    group_a.intersects(mask_b) && group_b.intersects(mask_a)
}

/// Decides whether the broadphase should hand a pair to the narrowphase
pub fn should_collide(body_a: &RigidBody, body_b: &RigidBody) -> bool {
    if body_a.is_static() && body_b.is_static() {
        return false;
    }

    groups_accept(
        body_a.get_collision_group(),
        body_a.get_collision_mask(),
        body_b.get_collision_group(),
        body_b.get_collision_mask(),
    )
}
