use nalgebra as na;
use crate::math::Vector3;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A row-major 3x3 matrix, used for rotations and inertia tensors
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Matrix3 {
    pub data: [[f32; 3]; 3],
}

impl Matrix3 {
    #[inline]
    pub fn new(data: [[f32; 3]; 3]) -> Self {
        Self { data }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::from_diagonal(Vector3::splat(1.0))
    }

    #[inline]
    pub fn zero() -> Self {
        Self { data: [[0.0; 3]; 3] }
    }

    /// Creates a diagonal matrix, e.g. a principal-axes inertia tensor
    #[inline]
    pub fn from_diagonal(diagonal: Vector3) -> Self {
        Self {
            data: [
                [diagonal.x, 0.0, 0.0],
                [0.0, diagonal.y, 0.0],
                [0.0, 0.0, diagonal.z],
            ],
        }
    }

    /// Creates a matrix whose columns are the given vectors
    #[inline]
    pub fn from_columns(c0: Vector3, c1: Vector3, c2: Vector3) -> Self {
        Self {
            data: [
                [c0.x, c1.x, c2.x],
                [c0.y, c1.y, c2.y],
                [c0.z, c1.z, c2.z],
            ],
        }
    }

    /// Returns column `index` as a vector
    #[inline]
    pub fn column(&self, index: usize) -> Vector3 {
        Vector3::new(self.data[0][index], self.data[1][index], self.data[2][index])
    }

    #[inline]
    pub fn diagonal(&self) -> Vector3 {
        Vector3::new(self.data[0][0], self.data[1][1], self.data[2][2])
    }

    pub fn transpose(&self) -> Self {
        let d = &self.data;
        Self {
            data: [
                [d[0][0], d[1][0], d[2][0]],
                [d[0][1], d[1][1], d[2][1]],
                [d[0][2], d[1][2], d[2][2]],
            ],
        }
    }

    /// Computes `self * v`
    #[inline]
    pub fn multiply_vector(&self, v: Vector3) -> Vector3 {
        let d = &self.data;
        Vector3::new(
            d[0][0] * v.x + d[0][1] * v.y + d[0][2] * v.z,
            d[1][0] * v.x + d[1][1] * v.y + d[1][2] * v.z,
            d[2][0] * v.x + d[2][1] * v.y + d[2][2] * v.z,
        )
    }

    /// Computes `self * other`
    pub fn multiply_matrix(&self, other: &Self) -> Self {
        let mut result = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                result.data[i][j] = (0..3).map(|k| self.data[i][k] * other.data[k][j]).sum();
            }
        }
        result
    }

    /// Computes `self * diag(scale) * self^T`, the world-space form of a local diagonal tensor
    pub fn scaled_congruence(&self, scale: Vector3) -> Self {
        let scaled = Self::from_columns(
            self.column(0) * scale.x,
            self.column(1) * scale.y,
            self.column(2) * scale.z,
        );
        scaled.multiply_matrix(&self.transpose())
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().flatten().all(|v| v.is_finite())
    }

    pub fn to_nalgebra(&self) -> na::Matrix3<f32> {
        let d = &self.data;
        na::Matrix3::new(
            d[0][0], d[0][1], d[0][2],
            d[1][0], d[1][1], d[1][2],
            d[2][0], d[2][1], d[2][2],
        )
    }

    pub fn from_nalgebra(m: &na::Matrix3<f32>) -> Self {
        Self {
            data: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ],
        }
    }
}

impl fmt::Display for Matrix3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in &self.data {
            writeln!(f, "[{}, {}, {}]", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}
