//! Debug visualisation of a world through a user supplied line renderer.

mod wireframe;

use bitflags::bitflags;

use crate::core::PhysicsWorld;
use crate::math::{Aabb, Vector3};

pub use self::wireframe::draw_shape;

/// Wireframe colour of dynamic bodies
pub const COLOR_DYNAMIC: Vector3 = Vector3::new(1.0, 1.0, 1.0);
/// Wireframe colour of static bodies
pub const COLOR_STATIC: Vector3 = Vector3::new(0.0, 1.0, 0.0);
pub const COLOR_AABB: Vector3 = Vector3::new(1.0, 0.0, 0.0);
pub const COLOR_CONTACT_POINT: Vector3 = Vector3::new(1.0, 1.0, 0.0);

/// Segments per circle in [`PhysicsWorld::debug_draw_sphere`]
pub const SPHERE_SEGMENTS: usize = 24;

bitflags! {
    /// What [`PhysicsWorld::debug_draw`] emits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugDrawModes: u32 {
        const WIREFRAME = 1;
        const AABB = 2;
        const CONTACT_POINTS = 8;
    }
}

impl Default for DebugDrawModes {
    fn default() -> Self {
        Self::WIREFRAME | Self::CONTACT_POINTS
    }
}

/// Receiver of debug primitives.
///
/// The world owns the drawer and detaches it while a draw pass runs, so an
/// implementation cannot reach back into the world it is drawing.
pub trait DebugDraw {
    fn draw_line(&mut self, from: Vector3, to: Vector3, color: Vector3);

    /// Draws a contact on B with its normal, separation and age in sub-steps
    fn draw_contact_point(&mut self, point: Vector3, normal: Vector3, distance: f32, life_time: i32, color: Vector3) {
        let _ = (distance, life_time);
        self.draw_line(point, point + normal * 0.1, color);
    }

    /// Receives solver diagnostics; ignored by default
    fn report_error_warning(&mut self, warning: &str) {
        let _ = warning;
    }

    fn debug_mode(&self) -> DebugDrawModes {
        DebugDrawModes::default()
    }
}

/// Emits the twelve edges of a box
pub(crate) fn draw_aabb(drawer: &mut dyn DebugDraw, aabb: &Aabb, color: Vector3) {
    let (lo, hi) = (aabb.min, aabb.max);
    let corner = |i: usize| {
        Vector3::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        )
    };
    for i in 0..8 {
        for bit in [1, 2, 4] {
            if i & bit == 0 {
                drawer.draw_line(corner(i), corner(i | bit), color);
            }
        }
    }
}

impl PhysicsWorld {
    /// Draws every body's shape (and bounds, if enabled) in creation order,
    /// then every contact point. Does nothing without a drawer.
    pub fn debug_draw(&mut self) {
        let Some(mut drawer) = self.debug_drawer.take() else {
            return;
        };
        let modes = drawer.debug_mode();

        for (_, body) in self.bodies.iter() {
            let geometry = body.get_shape().get_geometry();
            if modes.contains(DebugDrawModes::WIREFRAME) {
                let color = if body.is_static() { COLOR_STATIC } else { COLOR_DYNAMIC };
                draw_shape(drawer.as_mut(), geometry, &body.get_world_transform(), color);
            }
            if modes.contains(DebugDrawModes::AABB) && geometry.is_convex() {
                draw_aabb(drawer.as_mut(), &body.get_aabb(), COLOR_AABB);
            }
        }

        if modes.contains(DebugDrawModes::CONTACT_POINTS) {
            for manifold in self.manifolds.values() {
                for point in manifold.get_points() {
                    drawer.draw_contact_point(
                        point.position_world_on_b,
                        point.normal_world_on_b,
                        point.distance,
                        point.lifetime.min(i32::MAX as u32) as i32,
                        COLOR_CONTACT_POINT,
                    );
                }
            }
        }

        self.debug_drawer = Some(drawer);
    }

    /// Routes a single line to the drawer
    pub fn debug_draw_line(&mut self, from: Vector3, to: Vector3, color: Vector3) {
        if let Some(drawer) = self.debug_drawer.as_mut() {
            drawer.draw_line(from, to, color);
        }
    }

    /// Draws a sphere as three orthogonal great circles
    pub fn debug_draw_sphere(&mut self, center: Vector3, radius: f32, color: Vector3) {
        if let Some(drawer) = self.debug_drawer.as_mut() {
            wireframe::draw_sphere(drawer.as_mut(), center, radius, color);
        }
    }
}
