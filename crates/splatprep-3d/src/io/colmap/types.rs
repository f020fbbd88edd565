use super::ColmapError;

/// Represents a camera model id of the sparse model files.
///
/// NOTE: the pinhole model is written with code 0, which is what the downstream
///       splatting trainers read back as a four parameter pinhole camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraModelId {
    /// Pinhole camera model: fx, fy, cx, cy
    CameraModelPinhole = 0,
}

impl CameraModelId {
    /// Numeric code stored in `cameras.bin`.
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Look up a camera model from its numeric code.
    pub fn from_code(code: i32) -> Result<Self, ColmapError> {
        match code {
            0 => Ok(CameraModelId::CameraModelPinhole),
            _ => Err(ColmapError::InvalidCameraModel(code)),
        }
    }

    /// Number of parameters stored for the model.
    pub fn num_params(&self) -> usize {
        match self {
            CameraModelId::CameraModelPinhole => 4,
        }
    }

    /// Model name as used in the text format.
    pub fn name(&self) -> &'static str {
        match self {
            CameraModelId::CameraModelPinhole => "PINHOLE",
        }
    }
}

/// Represents a camera in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapCamera {
    /// Camera id
    pub camera_id: u32,
    /// Camera model id
    pub model_id: CameraModelId,
    /// Image width
    pub width: usize,
    /// Image height
    pub height: usize,
    /// Camera parameters
    pub params: Vec<f64>,
}

/// Represents an image in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapImage {
    /// Image name
    pub name: String,
    /// Image id
    pub image_id: u32,
    /// Camera id
    pub camera_id: u32,
    /// World-to-camera rotation
    pub rotation: [f64; 4], // qw, qx, qy, qz
    /// World-to-camera translation
    pub translation: [f64; 3], // x, y, z
    /// Points2d
    pub points2d: Vec<(f64, f64, i64)>, // x, y, point3d_id
}

/// Represents a 3D point in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapPoint3d {
    /// Point3d id
    pub point3d_id: u64,
    /// x, y, z coordinates
    pub xyz: [f64; 3],
    /// rgb color
    pub rgb: [u8; 3],
    /// Error
    pub error: f64,
    /// Track
    pub track: Vec<(u32, u32)>, // image_id, point2d_idx
}
