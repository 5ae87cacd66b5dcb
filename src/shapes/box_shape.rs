use crate::math::{Vector3, Aabb, Ray};
use crate::shapes::ShapeRayHit;

/// Half thickness given to 2D boxes along their local Z axis
pub const BOX_2D_HALF_THICKNESS: f32 = 0.04;

/// A box (cuboid) collision shape centred on its local origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    half_extents: Vector3,
}

impl BoxShape {
    pub(crate) fn new(half_extents: Vector3) -> Self {
        Self { half_extents }
    }

    pub fn get_half_extents(&self) -> Vector3 {
        self.half_extents
    }

    /// The 8 corners in local space
    pub fn vertices(&self) -> [Vector3; 8] {
        let Vector3 { x, y, z } = self.half_extents;
        [
            Vector3::new(-x, -y, -z),
            Vector3::new(x, -y, -z),
            Vector3::new(x, y, -z),
            Vector3::new(-x, y, -z),
            Vector3::new(-x, -y, z),
            Vector3::new(x, -y, z),
            Vector3::new(x, y, z),
            Vector3::new(-x, y, z),
        ]
    }

    pub fn local_aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(Vector3::zero(), self.half_extents)
    }

    pub fn support(&self, direction: Vector3) -> Vector3 {
        let h = self.half_extents;
        Vector3::new(
            if direction.x >= 0.0 { h.x } else { -h.x },
            if direction.y >= 0.0 { h.y } else { -h.y },
            if direction.z >= 0.0 { h.z } else { -h.z },
        )
    }

    /// Principal moments of a solid cuboid: `m/12 * (ly² + lz², lx² + lz², lx² + ly²)`
    pub fn local_inertia(&self, mass: f32) -> Vector3 {
        let l = self.half_extents * 2.0;
        let (x2, y2, z2) = (l.x * l.x, l.y * l.y, l.z * l.z);
        Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 12.0)
    }

    pub fn volume(&self) -> f32 {
        let l = self.half_extents * 2.0;
        l.x * l.y * l.z
    }

    /// Slab test in local space; reports the face through which the ray enters
    pub fn ray_cast(&self, ray: &Ray) -> Option<ShapeRayHit> {
        let aabb = self.local_aabb();
        if aabb.contains_point(ray.origin) {
            // starting inside a solid
            return None;
        }
        let (t_enter, _) = aabb.intersects_ray(ray, 0.0, 1.0)?;

        let point = ray.point_at(t_enter);
        let h = self.half_extents;
        let relative = Vector3::new(
            point.x / h.x.max(crate::math::EPSILON),
            point.y / h.y.max(crate::math::EPSILON),
            point.z / h.z.max(crate::math::EPSILON),
        );
        let axis = relative.max_abs_axis();
        let normal = Vector3::zero().with(axis, relative[axis].signum());

        Some(ShapeRayHit::front(t_enter, normal))
    }
}

/// A flat rectangle in the local XY plane, given a thin Z extent so that it
/// behaves as a proper solid in the narrowphase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box2dShape {
    half_x: f32,
    half_y: f32,
}

impl Box2dShape {
    pub(crate) fn new(half_x: f32, half_y: f32) -> Self {
        Self { half_x, half_y }
    }

    pub fn get_half_x(&self) -> f32 {
        self.half_x
    }

    pub fn get_half_y(&self) -> f32 {
        self.half_y
    }

    /// The solid box this rectangle collides as
    pub fn as_box(&self) -> BoxShape {
        BoxShape::new(Vector3::new(self.half_x, self.half_y, BOX_2D_HALF_THICKNESS))
    }
}
