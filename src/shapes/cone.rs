use crate::math::{Vector3, Aabb, Ray};
use crate::shapes::{Axis, ShapeRayHit};
use crate::shapes::shape::solve_quadratic;

/// A solid cone aligned with one principal axis.
///
/// The apex sits at `+height/2` along the axis and the base disc at `-height/2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    axis: Axis,
    radius: f32,
    height: f32,
}

impl Cone {
    pub(crate) fn new(axis: Axis, radius: f32, height: f32) -> Self {
        Self { axis, radius, height }
    }

    pub fn get_axis(&self) -> Axis {
        self.axis
    }

    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    pub fn get_height(&self) -> f32 {
        self.height
    }

    pub fn apex(&self) -> Vector3 {
        self.axis.unit() * (self.height * 0.5)
    }

    pub fn support(&self, direction: Vector3) -> Vector3 {
        let d = self.axis.canonical(direction);
        let half = self.height * 0.5;
        let slant = (self.radius * self.radius + self.height * self.height).sqrt();
        let sin_angle = if slant > 0.0 { self.radius / slant } else { 0.0 };

        let length = d.length();
        let local = if d.y > length * sin_angle {
            Vector3::new(0.0, half, 0.0)
        } else {
            let radial = (d.x * d.x + d.z * d.z).sqrt();
            if radial > crate::math::EPSILON {
                let s = self.radius / radial;
                Vector3::new(d.x * s, -half, d.z * s)
            } else {
                Vector3::new(0.0, -half, 0.0)
            }
        };
        self.axis.canonical(local)
    }

    /// Points on the base rim plus the apex
    pub(crate) fn rim_points(&self, samples: usize) -> Vec<Vector3> {
        let half = self.height * 0.5;
        let mut points = Vec::with_capacity(samples + 1);
        points.push(self.apex());
        for i in 0..samples {
            let angle = i as f32 / samples as f32 * std::f32::consts::TAU;
            let (s, c) = angle.sin_cos();
            points.push(self.axis.canonical(Vector3::new(c * self.radius, -half, s * self.radius)));
        }
        points
    }

    pub fn local_aabb(&self) -> Aabb {
        let he = self.axis.canonical(Vector3::new(self.radius, self.height * 0.5, self.radius));
        Aabb::from_center_half_extents(Vector3::zero(), he)
    }

    /// Approximated by the inertia of the bounding box
    pub fn local_inertia(&self, mass: f32) -> Vector3 {
        let l = self.axis.canonical(Vector3::new(self.radius, self.height * 0.5, self.radius)) * 2.0;
        let (x2, y2, z2) = (l.x * l.x, l.y * l.y, l.z * l.z);
        Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 12.0)
    }

    pub fn ray_cast(&self, ray: &Ray) -> Option<ShapeRayHit> {
        if self.height <= 0.0 {
            return None;
        }

        let o = self.axis.canonical(ray.origin);
        let d = self.axis.canonical(ray.direction);
        let half = self.height * 0.5;
        let k = self.radius / self.height;
        let k2 = k * k;

        // distance below the apex, along the axis
        let q0 = half - o.y;
        if (0.0..=self.height).contains(&q0) && o.x * o.x + o.z * o.z <= k2 * q0 * q0 {
            return None;
        }

        let mut best: Option<(f32, Vector3)> = None;
        let mut consider = |t: f32, normal: Vector3| {
            if (0.0..=1.0).contains(&t) && best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, normal));
            }
        };

        let a = d.x * d.x + d.z * d.z - k2 * d.y * d.y;
        let b = o.x * d.x + o.z * d.z + k2 * q0 * d.y;
        let c = o.x * o.x + o.z * o.z - k2 * q0 * q0;
        if let Some((t0, t1)) = solve_quadratic(a, b, c) {
            for t in [t0, t1] {
                let p = o + d * t;
                let q = half - p.y;
                if (0.0..=self.height).contains(&q) {
                    if let Some(normal) = Vector3::new(p.x, k2 * q, p.z).try_normalize() {
                        consider(t, normal);
                    }
                }
            }
        }

        if d.y.abs() > crate::math::EPSILON {
            let t = (-half - o.y) / d.y;
            let p = o + d * t;
            if p.x * p.x + p.z * p.z <= self.radius * self.radius {
                consider(t, Vector3::new(0.0, -1.0, 0.0));
            }
        }

        best.map(|(t, normal)| ShapeRayHit::front(t, self.axis.canonical(normal)))
    }
}
