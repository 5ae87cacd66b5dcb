use crate::math::{Vector3, Aabb, Ray};
use crate::shapes::{Axis, ShapeRayHit};
use crate::shapes::shape::solve_quadratic;

/// A solid cylinder aligned with one principal axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    axis: Axis,
    radius: f32,
    half_height: f32,
}

impl Cylinder {
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

    /// Furthest point along `direction`: on the rim of the cap facing it
    pub fn support(&self, direction: Vector3) -> Vector3 {
        let d = self.axis.canonical(direction);
        let radial = (d.x * d.x + d.z * d.z).sqrt();
        let y = if d.y >= 0.0 { self.half_height } else { -self.half_height };
        let local = if radial > crate::math::EPSILON {
            let s = self.radius / radial;
            Vector3::new(d.x * s, y, d.z * s)
        } else {
            Vector3::new(self.radius, y, 0.0)
        };
        self.axis.canonical(local)
    }

    /// Points on both cap rims, used when resting the cylinder on a plane
    pub(crate) fn rim_points(&self, samples: usize) -> Vec<Vector3> {
        let mut points = Vec::with_capacity(samples * 2);
        for i in 0..samples {
            let angle = i as f32 / samples as f32 * std::f32::consts::TAU;
            let (s, c) = angle.sin_cos();
            for y in [self.half_height, -self.half_height] {
                points.push(self.axis.canonical(Vector3::new(c * self.radius, y, s * self.radius)));
            }
        }
        points
    }

    pub fn local_aabb(&self) -> Aabb {
        let he = self.axis.canonical(Vector3::new(self.radius, self.half_height, self.radius));
        Aabb::from_center_half_extents(Vector3::zero(), he)
    }

    /// Solid cylinder: `½ m r²` about the axis, `m (r²/4 + h²/3)` across it
    /// where `h` is the half height
    pub fn local_inertia(&self, mass: f32) -> Vector3 {
        let r2 = self.radius * self.radius;
        let h2 = self.half_height * self.half_height;
        let across = mass * (r2 * 0.25 + h2 / 3.0);
        let about = 0.5 * mass * r2;
        self.axis.canonical(Vector3::new(across, about, across))
    }

    pub fn ray_cast(&self, ray: &Ray) -> Option<ShapeRayHit> {
        let o = self.axis.canonical(ray.origin);
        let d = self.axis.canonical(ray.direction);
        let (r, h) = (self.radius, self.half_height);

        if o.x * o.x + o.z * o.z <= r * r && o.y.abs() <= h {
            return None;
        }

        let mut best: Option<(f32, Vector3)> = None;
        let mut consider = |t: f32, normal: Vector3| {
            if (0.0..=1.0).contains(&t) && best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, normal));
            }
        };

        let a = d.x * d.x + d.z * d.z;
        let b = o.x * d.x + o.z * d.z;
        let c = o.x * o.x + o.z * o.z - r * r;
        if let Some((t, _)) = solve_quadratic(a, b, c) {
            let p = o + d * t;
            if p.y.abs() <= h {
                consider(t, Vector3::new(p.x, 0.0, p.z).normalize());
            }
        }

        if d.y.abs() > crate::math::EPSILON {
            for cap in [h, -h] {
                let t = (cap - o.y) / d.y;
                let p = o + d * t;
                if p.x * p.x + p.z * p.z <= r * r {
                    consider(t, Vector3::new(0.0, cap.signum(), 0.0));
                }
            }
        }

        best.map(|(t, normal)| ShapeRayHit::front(t, self.axis.canonical(normal)))
    }
}
