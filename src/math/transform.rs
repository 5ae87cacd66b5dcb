use crate::math::{Vector3, Quaternion, Matrix3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A rigid transformation: rotation followed by translation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Translation (origin of the local frame in world space)
    pub position: Vector3,

    /// Orientation of the local frame
    pub rotation: Quaternion,
}

impl Transform {
    #[inline]
    pub fn new(position: Vector3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Vector3::zero(), Quaternion::identity())
    }

    #[inline]
    pub fn from_position(position: Vector3) -> Self {
        Self::new(position, Quaternion::identity())
    }

    /// Builds a transform from four basis vectors: the local X, Y and Z axes
    /// expressed in world space followed by the translation.
    ///
    /// The 3x3 part is orthonormalized, so a slightly non-orthogonal basis
    /// is snapped to the nearest rotation.
    pub fn from_basis(basis: &[Vector3; 4]) -> Self {
        let m = Matrix3::from_columns(basis[0], basis[1], basis[2]);
        Self::new(basis[3], Quaternion::from_rotation_matrix(&m))
    }

    /// Returns the transform as four basis vectors (local X, Y, Z axes, then translation)
    pub fn to_basis(&self) -> [Vector3; 4] {
        let m = self.rotation.to_rotation_matrix();
        [m.column(0), m.column(1), m.column(2), self.position]
    }

    /// Returns the rotation part as a matrix
    #[inline]
    pub fn basis(&self) -> Matrix3 {
        self.rotation.to_rotation_matrix()
    }

    /// Maps a point from local space to world space
    #[inline]
    pub fn transform_point(&self, point: Vector3) -> Vector3 {
        self.rotation.rotate_vector(point) + self.position
    }

    /// Maps a direction from local space to world space (no translation)
    #[inline]
    pub fn transform_direction(&self, direction: Vector3) -> Vector3 {
        self.rotation.rotate_vector(direction)
    }

    /// Maps a world-space point into local space
    #[inline]
    pub fn inverse_transform_point(&self, point: Vector3) -> Vector3 {
        self.rotation.conjugate().rotate_vector(point - self.position)
    }

    /// Maps a world-space direction into local space
    #[inline]
    pub fn inverse_transform_direction(&self, direction: Vector3) -> Vector3 {
        self.rotation.conjugate().rotate_vector(direction)
    }

    /// Predicts the transform after moving with the given velocities for `dt` seconds
    pub fn integrate(&self, linear_velocity: Vector3, angular_velocity: Vector3, dt: f32) -> Self {
        Self::new(
            self.position + linear_velocity * dt,
            self.rotation.integrate(angular_velocity, dt),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
