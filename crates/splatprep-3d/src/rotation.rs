/// Convert a rotation matrix to a unit quaternion.
///
/// The branch is selected on the trace of the matrix (Shepperd's method) so that the
/// square root is always taken of the largest quantity and no division by a value
/// close to zero happens.
///
/// # Arguments
///
/// * `rotation` - A 3x3 rotation matrix in row-major order.
///
/// # Returns
///
/// The quaternion in scalar-first order `[w, x, y, z]`.
///
/// PRECONDITION: `rotation` is orthonormal with determinant +1. The input is not
/// validated and anything else may produce NaN.
///
/// Example:
///
/// ```
/// use splatprep_3d::rotation::rotation_matrix_to_quaternion;
///
/// let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let q = rotation_matrix_to_quaternion(&rotation);
/// assert_eq!(q, [1.0, 0.0, 0.0, 0.0]);
/// ```
pub fn rotation_matrix_to_quaternion(rotation: &[[f64; 3]; 3]) -> [f64; 4] {
    let r = rotation;
    let mut q = [0.0; 4];

    let trace = r[0][0] + r[1][1] + r[2][2];

    if trace > 0.0 {
        let t = (trace + 1.0).sqrt();
        q[0] = 0.5 * t;
        let t = 0.5 / t;
        q[1] = (r[2][1] - r[1][2]) * t;
        q[2] = (r[0][2] - r[2][0]) * t;
        q[3] = (r[1][0] - r[0][1]) * t;
    } else {
        // pick the largest diagonal entry
        let mut i = 0;
        if r[1][1] > r[0][0] {
            i = 1;
        }
        if r[2][2] > r[i][i] {
            i = 2;
        }
        let j = (i + 1) % 3;
        let k = (j + 1) % 3;

        let t = (r[i][i] - r[j][j] - r[k][k] + 1.0).sqrt();
        q[i + 1] = 0.5 * t;
        let t = 0.5 / t;
        q[0] = (r[k][j] - r[j][k]) * t;
        q[j + 1] = (r[i][j] + r[j][i]) * t;
        q[k + 1] = (r[i][k] + r[k][i]) * t;
    }

    q
}

/// Convert a quaternion to a rotation matrix.
///
/// The quaternion is normalized before the conversion.
///
/// # Arguments
///
/// * `quaternion` - The quaternion in scalar-first order `[w, x, y, z]`.
///
/// # Returns
///
/// The 3x3 rotation matrix in row-major order.
pub fn quaternion_to_rotation_matrix(quaternion: &[f64; 4]) -> [[f64; 3]; 3] {
    let norm = quaternion.iter().map(|v| v * v).sum::<f64>().sqrt();
    let [w, x, y, z] = quaternion.map(|v| v / norm);

    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
        ],
        [
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
        ],
        [
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix.
///
/// Example:
///
/// ```
/// use splatprep_3d::rotation::axis_angle_to_rotation_matrix;
///
/// let axis = [0.0, 0.0, 2.0];
/// let rotation = axis_angle_to_rotation_matrix(&axis, 0.0).unwrap();
/// assert_eq!(rotation, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
/// ```
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], &'static str> {
    // normalize the vector
    let [x, y, z] = {
        let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
        match magnitude < 1e-10 {
            true => return Err("cannot compute rotation matrix from a zero vector"),
            false => axis.map(|v| v / magnitude),
        }
    };

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    Ok([
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s],
        [x * y * t + z * s, c + y * y * t, y * z * t - x * s],
        [x * z * t - y * s, y * z * t + x * s, c + z * z * t],
    ])
}
