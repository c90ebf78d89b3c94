use glam::{Mat4, Vec3, Vec4};

use crate::CameraError;

/// A 4x4 matrix as stored on disk: four sequences of four floats, one per row.
pub type MatrixRows = [[f32; 4]; 4];

/// Build a matrix from its rows.
///
/// Each inner array is row `i` of the result, so `rows[i][j]` lands at row `i`, column `j`.
///
/// Example:
///
/// ```
/// use nerfdata_camera::transforms::rows_to_matrix;
///
/// let m = rows_to_matrix(&[
///     [1.0, 0.0, 0.0, 5.0],
///     [0.0, 1.0, 0.0, 6.0],
///     [0.0, 0.0, 1.0, 7.0],
///     [0.0, 0.0, 0.0, 1.0],
/// ]);
/// assert_eq!(m.w_axis.x, 5.0);
/// ```
pub fn rows_to_matrix(rows: &MatrixRows) -> Mat4 {
    // glam reads nested arrays as columns, so read then transpose
    Mat4::from_cols_array_2d(rows).transpose()
}

/// Split a matrix into its rows, the inverse of [`rows_to_matrix`].
pub fn matrix_to_rows(matrix: &Mat4) -> MatrixRows {
    // the columns of the transpose are the rows of the matrix
    matrix.transpose().to_cols_array_2d()
}

/// Compose two transforms as `lhs * rhs`.
///
/// The result applies `rhs` first and then `lhs`. Aligning a pose to a new world frame is
/// `compose(&global, &local_to_world)`.
#[inline]
pub fn compose(lhs: &Mat4, rhs: &Mat4) -> Mat4 {
    *lhs * *rhs
}

/// Invert a transform without checking the determinant.
///
/// A singular input produces non-finite entries. Use [`try_invert`] to get an error instead.
#[inline]
pub fn invert(matrix: &Mat4) -> Mat4 {
    matrix.inverse()
}

/// Invert a transform.
///
/// # Arguments
///
/// * `matrix` - The transform to invert.
///
/// # Returns
///
/// The inverse, or [`CameraError::SingularMatrix`] when the determinant vanishes.
pub fn try_invert(matrix: &Mat4) -> Result<Mat4, CameraError> {
    let det = matrix.determinant();
    if !det.is_finite() || det.abs() < f32::EPSILON {
        return Err(CameraError::SingularMatrix);
    }
    Ok(matrix.inverse())
}

/// Apply a transform to a point in homogeneous coordinates.
///
/// The point is lifted to `(x, y, z, 1)` and multiplied by `matrix`. The result is then
/// *scaled* by its homogeneous component, `xyz * w`, which is the convention the pose
/// matrices are authored in. This is not a perspective divide.
///
/// Example:
///
/// ```
/// use glam::{Mat4, Vec3};
/// use nerfdata_camera::transforms::apply_homogeneous;
///
/// let m = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
/// assert_eq!(apply_homogeneous(&m, Vec3::ZERO), Vec3::new(1.0, 0.0, 0.0));
/// ```
pub fn apply_homogeneous(matrix: &Mat4, point: Vec3) -> Vec3 {
    let xyzw: Vec4 = *matrix * point.extend(1.0);
    xyzw.truncate() * xyzw.w
}
