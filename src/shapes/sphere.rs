use crate::math::{Vector3, Aabb, Ray};
use crate::shapes::ShapeRayHit;

/// A sphere centred on its local origin.
///
/// For the narrowphase the sphere is a single point whose margin is the radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    pub(crate) fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    pub fn local_aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(Vector3::zero(), Vector3::splat(self.radius))
    }

    /// Principal moments of a solid sphere: `2/5 m r²`
    pub fn local_inertia(&self, mass: f32) -> Vector3 {
        Vector3::splat(0.4 * mass * self.radius * self.radius)
    }

    pub fn volume(&self) -> f32 {
        4.0 / 3.0 * std::f32::consts::PI * self.radius.powi(3)
    }

    pub fn ray_cast(&self, ray: &Ray) -> Option<ShapeRayHit> {
        ray_sphere(ray, Vector3::zero(), self.radius)
            .map(|t| ShapeRayHit::front(t, ray.point_at(t).normalize()))
    }
}

/// Entry parameter of a ray against a sphere, `None` when missed or starting inside
pub(crate) fn ray_sphere(ray: &Ray, center: Vector3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }

    let a = ray.direction.length_squared();
    if a < crate::math::EPSILON {
        return None;
    }
    let b = oc.dot(&ray.direction);
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / a;
    (0.0..=1.0).contains(&t).then_some(t)
}
