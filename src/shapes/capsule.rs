use crate::math::{Vector3, Aabb, Ray};
use crate::shapes::{Axis, ShapeRayHit};
use crate::shapes::sphere::ray_sphere;
use crate::shapes::shape::solve_quadratic;

/// A capsule (a cylinder with hemisphere caps) aligned with one principal axis.
///
/// The narrowphase treats it as a segment between the two hemisphere centres
/// with a margin equal to the radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    axis: Axis,
    radius: f32,
    /// Half the distance between the hemisphere centres
    half_height: f32,
}

impl Capsule {
    pub(crate) fn new(axis: Axis, radius: f32, half_height: f32) -> Self {
        Self { axis, radius, half_height }
    }

    pub fn get_axis(&self) -> Axis {
        self.axis
    }

    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    pub fn get_half_height(&self) -> f32 {
        self.half_height
    }

    /// Hemisphere centres in local space, top first
    pub fn segment(&self) -> (Vector3, Vector3) {
        let offset = self.axis.unit() * self.half_height;
        (offset, -offset)
    }

    pub(crate) fn core_support(&self, direction: Vector3) -> Vector3 {
        let along = direction[self.axis.index()];
        let (top, bottom) = self.segment();
        if along >= 0.0 { top } else { bottom }
    }

    fn half_extents(&self) -> Vector3 {
        let canonical = Vector3::new(self.radius, self.radius + self.half_height, self.radius);
        self.axis.canonical(canonical)
    }

    pub fn local_aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(Vector3::zero(), self.half_extents())
    }

    /// Approximated by the inertia of the bounding box
    pub fn local_inertia(&self, mass: f32) -> Vector3 {
        let l = self.half_extents() * 2.0;
        let (x2, y2, z2) = (l.x * l.x, l.y * l.y, l.z * l.z);
        Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 12.0)
    }

    pub fn ray_cast(&self, ray: &Ray) -> Option<ShapeRayHit> {
        let o = self.axis.canonical(ray.origin);
        let d = self.axis.canonical(ray.direction);
        let (r, h) = (self.radius, self.half_height);

        let closest_on_core = Vector3::new(0.0, o.y.clamp(-h, h), 0.0);
        if (o - closest_on_core).length_squared() <= r * r {
            return None;
        }

        let mut best: Option<(f32, Vector3)> = None;
        let mut consider = |t: f32, normal: Vector3| {
            if (0.0..=1.0).contains(&t) && best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, normal));
            }
        };

        // side wall
        let a = d.x * d.x + d.z * d.z;
        let b = o.x * d.x + o.z * d.z;
        let c = o.x * o.x + o.z * o.z - r * r;
        if let Some((t, _)) = solve_quadratic(a, b, c) {
            let y = o.y + d.y * t;
            if y.abs() <= h {
                let p = o + d * t;
                consider(t, Vector3::new(p.x, 0.0, p.z).normalize());
            }
        }

        // caps
        let canonical_ray = Ray::new(o, d);
        for centre in [Vector3::new(0.0, h, 0.0), Vector3::new(0.0, -h, 0.0)] {
            if let Some(t) = ray_sphere(&canonical_ray, centre, r) {
                let p = canonical_ray.point_at(t);
                if (p.y - centre.y) * centre.y.signum() >= 0.0 || h == 0.0 {
                    consider(t, (p - centre).normalize());
                }
            }
        }

        best.map(|(t, normal)| ShapeRayHit::front(t, self.axis.canonical(normal)))
    }
}
