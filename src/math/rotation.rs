use nalgebra as na;
use crate::math::{Vector3, Matrix3};
use std::fmt;
use std::ops::{Mul, MulAssign};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Unit quaternion describing an orientation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Quaternion {
    /// Real component
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Largest rotation angle integrated in a single step, in radians
const MAX_ANGULAR_STEP: f32 = std::f32::consts::FRAC_PI_4;

impl Quaternion {
    #[inline]
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Creates a quaternion rotating `angle` radians about `axis`
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Exponential map of a rotation vector (axis scaled by angle).
    ///
    /// Small angles use a Taylor expansion of `sin(θ/2)/θ` so that the
    /// result stays well defined as the angle approaches zero.
    pub fn from_scaled_axis(v: Vector3) -> Self {
        let angle = v.length();
        let half = angle * 0.5;
        let factor = if angle < 0.001 {
            0.5 - angle * angle * (1.0 / 48.0)
        } else {
            half.sin() / angle
        };
        Self::new(half.cos(), v.x * factor, v.y * factor, v.z * factor)
    }

    /// Creates the closest rotation to an arbitrary 3x3 matrix.
    ///
    /// The matrix is orthonormalized by nalgebra, so slightly skewed bases
    /// coming from callers still produce a valid orientation.
    pub fn from_rotation_matrix(m: &Matrix3) -> Self {
        let unit = na::UnitQuaternion::from_matrix(&m.to_nalgebra());
        Self::from_nalgebra(unit.quaternion())
    }

    pub fn to_rotation_matrix(&self) -> Matrix3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Matrix3::new([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
        ])
    }

    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns the normalized quaternion, falling back to identity when degenerate
    pub fn normalize(&self) -> Self {
        let length = self.length();
        if length > crate::math::EPSILON && length.is_finite() {
            let inv = 1.0 / length;
            Self::new(self.w * inv, self.x * inv, self.y * inv, self.z * inv)
        } else {
            Self::identity()
        }
    }

    /// Rotates a vector by this quaternion
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let q = Vector3::new(self.x, self.y, self.z);
        let t = q.cross(&v) * 2.0;
        v + t * self.w + q.cross(&t)
    }

    /// Advances the orientation by angular velocity `omega` over `dt`.
    ///
    /// The rotation per step is clamped so that very fast spins cannot
    /// wrap around within a single step.
    pub fn integrate(&self, omega: Vector3, dt: f32) -> Self {
        let mut omega = omega;
        let speed = omega.length();
        if speed * dt > MAX_ANGULAR_STEP {
            omega *= MAX_ANGULAR_STEP / (speed * dt);
        }
        (Self::from_scaled_axis(omega * dt) * *self).normalize()
    }

    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_nalgebra(&self) -> na::Quaternion<f32> {
        na::Quaternion::new(self.w, self.x, self.y, self.z)
    }

    pub fn from_nalgebra(q: &na::Quaternion<f32>) -> Self {
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.w, self.x, self.y, self.z)
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

impl MulAssign for Quaternion {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}
