use crate::math::{Vector3, Ray};
use crate::shapes::shape::LARGE_EXTENT;
use crate::shapes::ShapeRayHit;

/// An infinite static plane: the points `p` with `normal · p = distance`.
///
/// The solid half-space lies behind the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3,
    distance: f32,
}

impl Plane {
    /// `normal` must already be unit length
    pub(crate) fn new(normal: Vector3, distance: f32) -> Self {
        Self { normal, distance }
    }

    pub fn get_normal(&self) -> Vector3 {
        self.normal
    }

    pub fn get_distance(&self) -> f32 {
        self.distance
    }

    /// Signed distance of a local-space point above the plane
    pub fn signed_distance(&self, point: Vector3) -> f32 {
        self.normal.dot(&point) - self.distance
    }

    /// Only meaningful for directions pointing into the half-space
    pub(crate) fn support(&self, direction: Vector3) -> Vector3 {
        let (u, v) = self.normal.plane_space();
        let origin = self.normal * self.distance;
        let along_u = if direction.dot(&u) >= 0.0 { LARGE_EXTENT } else { -LARGE_EXTENT };
        let along_v = if direction.dot(&v) >= 0.0 { LARGE_EXTENT } else { -LARGE_EXTENT };
        origin + u * along_u + v * along_v
    }

    /// Two-sided ray test. Hits from behind are reported with `front_face`
    /// unset and the normal left as stored.
    pub fn ray_cast(&self, ray: &Ray) -> Option<ShapeRayHit> {
        let start = self.signed_distance(ray.origin);
        let end = self.signed_distance(ray.origin + ray.direction);
        if start * end >= 0.0 {
            return None;
        }

        let fraction = start / (start - end);
        Some(ShapeRayHit {
            fraction,
            normal: self.normal,
            front_face: start > 0.0,
        })
    }
}
