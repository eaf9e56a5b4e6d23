//! Math utilities and types
//!
//! Fixed-size value types for 3D graphics and the routines the scene graph
//! composes transforms with.
//!
//! ## Conventions
//!
//! - Matrices are 4x4, column-major, with the translation in the last column
//!   (linear indices 12, 13 and 14). All routines below index the `nalgebra`
//!   storage linearly, so `m[i]` is the i-th float of the column-major layout.
//! - Quaternions are read scalar-first: `(w, i, j, k)`.
//!
//! None of these functions guard against degenerate input. A zero-length
//! vector handed to [`normalize`] yields NaN components and that is passed
//! straight back to the caller.

pub use nalgebra::{Matrix4, Quaternion, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (homogeneous points, planes)
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type, column-major
pub type Mat4 = Matrix4<f32>;

/// Quaternion type, scalar-first `(w, i, j, k)`
pub type Quat = Quaternion<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Convert degrees to radians
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * constants::DEG_TO_RAD
}

/// Euclidean norm of a 3-vector
pub fn magnitude(v: &Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Normalize a 4-component vector in place.
///
/// The magnitude comes from the first three components only, but all four
/// components are divided by it. For a plane `(nx, ny, nz, d)` this scales
/// `d` along with the normal.
pub fn normalize(v: &mut Vec4) {
    let m = magnitude(&v.xyz());
    v[0] /= m;
    v[1] /= m;
    v[2] /= m;
    v[3] /= m;
}

/// 3-component dot product
pub fn dot(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Euclidean distance between two points
pub fn distance_point_to_point(a: &Vec3, b: &Vec3) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Euclidean distance from a point to the origin
pub fn distance_point_to_origin(point: &Vec3) -> f32 {
    (point[0] * point[0] + point[1] * point[1] + point[2] * point[2]).sqrt()
}

/// Signed distance from a plane `(nx, ny, nz, d)` to a point.
///
/// Only meaningful when the plane normal has unit length.
pub fn distance_plane_to_point(plane: &Vec4, point: &Vec3) -> f32 {
    plane[0] * point[0] + plane[1] * point[1] + plane[2] * point[2] + plane[3]
}

/// Compose two matrices: the columns of `b` are transformed by `a`.
///
/// In column-major terms this is `a * b`, so the resulting transform applies
/// `b` first and `a` second. The summation order is fixed; do not replace it
/// with `nalgebra`'s product, which may round differently.
pub fn multiply_matrices(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = Mat4::zeros();
    for i in (0..16).step_by(4) {
        for j in 0..4 {
            result[i + j] =
                b[i] * a[j] + b[i + 1] * a[j + 4] + b[i + 2] * a[j + 8] + b[i + 3] * a[j + 12];
        }
    }
    result
}

/// Hamilton product `a * b`, scalar-first
pub fn multiply_quaternions(a: &Quat, b: &Quat) -> Quat {
    let w = a.w * b.w - a.i * b.i - a.j * b.j - a.k * b.k;
    let x = a.w * b.i + a.i * b.w + a.j * b.k - a.k * b.j;
    let y = a.w * b.j - a.i * b.k + a.j * b.w + a.k * b.i;
    let z = a.w * b.k + a.i * b.j - a.j * b.i + a.k * b.w;
    Quat::new(w, x, y, z)
}

/// Rotate `v` by computing `q * v * conjugate(q)` on `v` embedded as a pure
/// quaternion, returning the vector part.
pub fn rotate_vector_by_quaternion(q: &Quat, v: &Vec3) -> Vec3 {
    let pure = Quat::new(0.0, v[0], v[1], v[2]);
    let conjugate = Quat::new(q.w, -q.i, -q.j, -q.k);

    let rotated = multiply_quaternions(&multiply_quaternions(q, &pure), &conjugate);
    Vec3::new(rotated.i, rotated.j, rotated.k)
}

/// Build a rotation matrix from a quaternion.
///
/// Each basis axis is rotated by `q`; column `c` of the result holds the
/// projections of the rotated axis `c` onto the unrotated x, y and z axes.
/// The translation column is zero and the homogeneous corner is one.
pub fn quaternion_to_rotation_matrix(q: &Quat) -> Mat4 {
    let x_axis = Vec3::new(1.0, 0.0, 0.0);
    let y_axis = Vec3::new(0.0, 1.0, 0.0);
    let z_axis = Vec3::new(0.0, 0.0, 1.0);

    let x_rotated = rotate_vector_by_quaternion(q, &x_axis);
    let y_rotated = rotate_vector_by_quaternion(q, &y_axis);
    let z_rotated = rotate_vector_by_quaternion(q, &z_axis);

    let mut matrix = Mat4::zeros();

    matrix[0] = dot(&x_axis, &x_rotated);
    matrix[1] = dot(&y_axis, &x_rotated);
    matrix[2] = dot(&z_axis, &x_rotated);

    matrix[4] = dot(&x_axis, &y_rotated);
    matrix[5] = dot(&y_axis, &y_rotated);
    matrix[6] = dot(&z_axis, &y_rotated);

    matrix[8] = dot(&x_axis, &z_rotated);
    matrix[9] = dot(&y_axis, &z_rotated);
    matrix[10] = dot(&z_axis, &z_rotated);

    matrix[15] = 1.0;
    matrix
}
