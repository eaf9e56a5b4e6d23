//! Transformation node
//!
//! Composes a local matrix into the active transform scope of its subtree.
//! Calls to [`Transformation::scale`], [`Transformation::translate`] and
//! [`Transformation::rotate`] accumulate in call order; mixing non-uniform
//! scale with rotation this way drifts, there is no decomposition back into
//! separate scale and rotation parts.

use crate::foundation::math::{multiply_matrices, quaternion_to_rotation_matrix, Mat4, Quat};
use super::{Node, State};

/// Scene node owning a local 4x4 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    matrix: Mat4,
}

impl Transformation {
    /// Node with an identity local matrix
    pub fn identity() -> Self {
        Self { matrix: Mat4::identity() }
    }

    /// Node starting from `matrix`, or identity when none is given
    pub fn new(matrix: Option<Mat4>) -> Self {
        Self { matrix: matrix.unwrap_or_else(Mat4::identity) }
    }

    /// Local matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Replace the local matrix; `None` resets it to identity
    pub fn set_matrix(&mut self, matrix: Option<&Mat4>) -> &mut Self {
        self.matrix = matrix.copied().unwrap_or_else(Mat4::identity);
        self
    }

    /// Compose `matrix` into the local matrix, `matrix` applying first
    pub fn multiply(&mut self, matrix: &Mat4) -> &mut Self {
        self.matrix = multiply_matrices(&self.matrix, matrix);
        self
    }

    /// Compose a scale along each axis
    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.multiply(&Self::scale_matrix(x, y, z))
    }

    /// Compose a translation
    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.multiply(&Self::translation_matrix(x, y, z))
    }

    /// Compose a rotation of `radians` about the unit axis `(x, y, z)`
    pub fn rotate(&mut self, x: f32, y: f32, z: f32, radians: f32) -> &mut Self {
        self.multiply(&Self::rotation_matrix(x, y, z, radians))
    }

    /// Diagonal scale matrix
    pub fn scale_matrix(x: f32, y: f32, z: f32) -> Mat4 {
        let mut m = Mat4::identity();
        m[0] = x;
        m[5] = y;
        m[10] = z;
        m
    }

    /// Identity with the translation column set
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Mat4 {
        let mut m = Mat4::identity();
        m[12] = x;
        m[13] = y;
        m[14] = z;
        m
    }

    /// Rotation about the axis `(x, y, z)`, built through the quaternion
    /// `(cos(r/2), axis * sin(r/2))`. The axis is not normalized.
    pub fn rotation_matrix(x: f32, y: f32, z: f32, radians: f32) -> Mat4 {
        let half = radians / 2.0;
        let s = half.sin();
        let q = Quat::new(half.cos(), x * s, y * s, z * s);
        quaternion_to_rotation_matrix(&q)
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Node for Transformation {
    fn prepare(&mut self, state: &mut State) {
        state.push_matrix();
    }

    fn execute(&mut self, state: &mut State) {
        state.multiply_matrix(&self.matrix);
    }

    fn cleanup(&mut self, state: &mut State) {
        state.pop_matrix();
    }
}
