use faer::prelude::SpSolver;

use crate::rotation::rotation_matrix_to_quaternion;

/// Smallest determinant magnitude accepted when inverting a transform.
pub const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Error types for the pose module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PoseError {
    /// The transform cannot be inverted.
    #[error("transform is singular (determinant {0:e} below tolerance)")]
    SingularMatrix(f64),

    /// The transform contains NaN or infinite values.
    #[error("transform contains non-finite values")]
    NonFinite,
}

/// A world-to-camera rigid transform split into rotation and translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldToCamera {
    /// Rotation block of the transform in row-major order.
    pub rotation: [[f64; 3]; 3],
    /// Translation column of the transform.
    pub translation: [f64; 3],
}

impl WorldToCamera {
    /// The rotation expressed as a `[w, x, y, z]` quaternion.
    pub fn quaternion(&self) -> [f64; 4] {
        rotation_matrix_to_quaternion(&self.rotation)
    }
}

/// Invert a 4x4 homogeneous transform.
///
/// Solves against the identity with a partial pivoting LU, so any invertible matrix
/// is accepted, not only rigid transforms.
///
/// # Arguments
///
/// * `transform` - The 4x4 matrix in row-major order.
///
/// # Returns
///
/// The inverse matrix, or [`PoseError::SingularMatrix`] if the magnitude of the
/// determinant falls below [`SINGULAR_TOLERANCE`].
pub fn invert_transform(transform: &[[f64; 4]; 4]) -> Result<[[f64; 4]; 4], PoseError> {
    if transform.iter().flatten().any(|v| !v.is_finite()) {
        return Err(PoseError::NonFinite);
    }

    let mat = faer::Mat::<f64>::from_fn(4, 4, |i, j| transform[i][j]);

    let det = mat.determinant();
    if det.abs() < SINGULAR_TOLERANCE {
        return Err(PoseError::SingularMatrix(det.abs()));
    }

    let inv_mat = mat
        .partial_piv_lu()
        .solve(faer::Mat::<f64>::identity(4, 4));

    let mut inv = [[0.0; 4]; 4];
    for (i, row) in inv.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = inv_mat.read(i, j);
        }
    }

    if inv.iter().flatten().any(|v| !v.is_finite()) {
        return Err(PoseError::SingularMatrix(det.abs()));
    }

    Ok(inv)
}

/// Convert a camera-to-world pose into a world-to-camera rotation and translation.
///
/// # Arguments
///
/// * `camera_to_world` - The 4x4 camera-to-world transform in row-major order.
///
/// Example:
///
/// ```
/// use splatprep_3d::pose::camera_to_world_to_world_to_camera;
///
/// let c2w = [
///     [1.0, 0.0, 0.0, 1.0],
///     [0.0, 1.0, 0.0, 2.0],
///     [0.0, 0.0, 1.0, 3.0],
///     [0.0, 0.0, 0.0, 1.0],
/// ];
/// let w2c = camera_to_world_to_world_to_camera(&c2w).unwrap();
/// assert_eq!(w2c.translation, [-1.0, -2.0, -3.0]);
/// assert_eq!(w2c.quaternion(), [1.0, 0.0, 0.0, 0.0]);
/// ```
pub fn camera_to_world_to_world_to_camera(
    camera_to_world: &[[f64; 4]; 4],
) -> Result<WorldToCamera, PoseError> {
    let w2c = invert_transform(camera_to_world)?;

    let mut rotation = [[0.0; 3]; 3];
    let mut translation = [0.0; 3];
    for i in 0..3 {
        rotation[i].copy_from_slice(&w2c[i][..3]);
        translation[i] = w2c[i][3];
    }

    Ok(WorldToCamera {
        rotation,
        translation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::axis_angle_to_rotation_matrix;
    use approx::assert_relative_eq;

    fn rigid(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> [[f64; 4]; 4] {
        let mut m = [[0.0; 4]; 4];
        for i in 0..3 {
            m[i][..3].copy_from_slice(&rotation[i]);
            m[i][3] = translation[i];
        }
        m[3][3] = 1.0;
        m
    }

    #[test]
    fn test_invert_twice() -> Result<(), Box<dyn std::error::Error>> {
        let rotation = axis_angle_to_rotation_matrix(&[0.3, -1.0, 0.5], 2.1)?;
        let c2w = rigid(rotation, [0.5, -2.0, 3.25]);

        let back = invert_transform(&invert_transform(&c2w)?)?;
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(back[i][j], c2w[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_rigid_inverse_matches_closed_form() -> Result<(), Box<dyn std::error::Error>> {
        let rotation = axis_angle_to_rotation_matrix(&[1.0, 1.0, 0.0], 0.7)?;
        let t = [1.0, 2.0, -0.5];
        let w2c = camera_to_world_to_world_to_camera(&rigid(rotation, t))?;

        // R^T and -R^T t
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(w2c.rotation[i][j], rotation[j][i], epsilon = 1e-12);
            }
            let expected = -(0..3).map(|k| rotation[k][i] * t[k]).sum::<f64>();
            assert_relative_eq!(w2c.translation[i], expected, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_identity_rotation_negates_translation() -> Result<(), Box<dyn std::error::Error>> {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let w2c = camera_to_world_to_world_to_camera(&rigid(identity, [0.0, 1.0, 0.0]))?;
        assert_eq!(w2c.translation, [0.0, -1.0, 0.0]);
        assert_eq!(w2c.quaternion(), [1.0, 0.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_singular_transform() {
        let mut m = [[0.0; 4]; 4];
        m[0][0] = 1.0;
        m[1][1] = 1.0;
        m[3][3] = 1.0;
        assert!(matches!(
            invert_transform(&m),
            Err(PoseError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_nearly_singular_transform() {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate().take(3) {
            row[i] = 1e-5;
        }
        m[3][3] = 1.0;
        assert!(matches!(
            invert_transform(&m),
            Err(PoseError::SingularMatrix(det)) if det < SINGULAR_TOLERANCE
        ));
    }

    #[test]
    fn test_invert_scaled_transform() -> Result<(), PoseError> {
        let m = [
            [2.0, 0.0, 0.0, 1.0],
            [0.0, 4.0, 0.0, -2.0],
            [0.0, 0.0, 0.5, 3.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let inv = invert_transform(&m)?;
        let expected = [
            [0.5, 0.0, 0.0, -0.5],
            [0.0, 0.25, 0.0, 0.5],
            [0.0, 0.0, 2.0, -6.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(inv[i][j], expected[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_non_finite_transform() {
        let mut m = [[0.0; 4]; 4];
        m[0][0] = f64::NAN;
        assert_eq!(invert_transform(&m), Err(PoseError::NonFinite));
    }
}
