mod binary;
mod builder;
mod types;

pub use binary::*;
pub use builder::*;
pub use types::*;

use crate::pose::PoseError;

/// Error types for the COLMAP module.
#[derive(Debug, thiserror::Error)]
pub enum ColmapError {
    /// Error reading or writing file
    #[error("error reading or writing file")]
    IoError(#[from] std::io::Error),

    /// Unknown camera model code
    #[error("Invalid camera model code {0}")]
    InvalidCameraModel(i32),

    /// Image name that cannot be encoded as a C string
    #[error("Invalid image name {0:?}")]
    InvalidImageName(String),

    /// Points and colors of different length
    #[error("Got {points} points but {colors} colors")]
    LengthMismatch {
        /// Number of points
        points: usize,
        /// Number of colors
        colors: usize,
    },

    /// Pose of an image could not be converted
    #[error("Invalid pose for image {image_id}")]
    Pose {
        /// Image id
        image_id: u32,
        /// Underlying pose error
        #[source]
        source: PoseError,
    },

    /// Parse error
    #[error("Parse error {0}")]
    ParseError(String),

    /// Records that break the sparse model invariants
    #[error("Invalid reconstruction: {0}")]
    InvalidReconstruction(String),
}
