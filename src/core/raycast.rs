use bitflags::bitflags;

use crate::collision::{groups_accept, CollisionFilterGroups};
use crate::core::{BodyHandle, PhysicsWorld};
use crate::math::{Ray, Vector3, EPSILON};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

bitflags! {
    /// Options for world ray queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct RayCastFlags: u32 {
        /// Ignore hits on the back side of one-sided surfaces
        const SKIP_BACKFACES = 1;
        /// Report back-face normals as stored instead of facing the ray
        const KEEP_UNFLIPPED_NORMALS = 2;
    }
}

/// The closest hit of a world ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastResult {
    pub hit_normal_world: Vector3,
    pub hit_point_world: Vector3,

    /// Position of the hit along `from → to`, in `[0, 1]`
    pub hit_fraction: f32,

    pub body: BodyHandle,
}

impl PhysicsWorld {
    /// Casts the segment `from → to` against every body accepted by the
    /// `group`/`mask` filter and returns the closest hit.
    ///
    /// Bodies are tested in creation order; on equal fractions the earlier
    /// body wins.
    pub fn ray_test_closest(
        &self,
        from: Vector3,
        to: Vector3,
        group: CollisionFilterGroups,
        mask: CollisionFilterGroups,
        flags: RayCastFlags,
    ) -> Option<RayCastResult> {
        if !from.is_finite() || !to.is_finite() {
            log::warn!("ray test ignored: non-finite end points {} -> {}", from, to);
            return None;
        }
        if (to - from).length_squared() < EPSILON * EPSILON {
            return None;
        }

        let world_ray = Ray::from_segment(from, to);
        let mut closest: Option<RayCastResult> = None;

        for (handle, body) in self.bodies.iter() {
            if !groups_accept(group, mask, body.get_collision_group(), body.get_collision_mask()) {
                continue;
            }

            let max_fraction = closest.map_or(1.0, |hit| hit.hit_fraction);
            if body
                .get_aabb()
                .intersects_ray(&world_ray, 0.0, max_fraction)
                .is_none()
            {
                continue;
            }

            let transform = body.get_world_transform();
            let local_ray = Ray::from_segment(
                transform.inverse_transform_point(from),
                transform.inverse_transform_point(to),
            );

            let hit = match body.get_shape().get_geometry().ray_cast(&local_ray) {
                Some(hit) => hit,
                None => continue,
            };
            if hit.fraction >= max_fraction {
                continue;
            }
            if !hit.front_face && flags.contains(RayCastFlags::SKIP_BACKFACES) {
                continue;
            }

            let mut normal = transform.transform_direction(hit.normal);
            if !hit.front_face && !flags.contains(RayCastFlags::KEEP_UNFLIPPED_NORMALS) {
                normal = -normal;
            }

            closest = Some(RayCastResult {
                hit_normal_world: normal,
                hit_point_world: world_ray.point_at(hit.fraction),
                hit_fraction: hit.fraction,
                body: handle,
            });
        }

        log::trace!("ray test {} -> {}: {:?}", from, to, closest.map(|hit| hit.body));
        closest
    }
}
