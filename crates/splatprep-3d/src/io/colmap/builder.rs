use std::collections::HashSet;

use super::{CameraModelId, ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d};
use crate::pose::camera_to_world_to_world_to_camera;

/// Id of the single camera shared by all the images of a converted scene.
pub const DEFAULT_CAMERA_ID: u32 = 1;

/// The three record collections of a sparse model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    /// Cameras
    pub cameras: Vec<ColmapCamera>,
    /// Images
    pub images: Vec<ColmapImage>,
    /// 3D points
    pub points3d: Vec<ColmapPoint3d>,
}

impl Reconstruction {
    /// Sort every collection by id so that serialization is deterministic.
    pub fn sort_by_id(&mut self) {
        self.cameras.sort_by_key(|c| c.camera_id);
        self.images.sort_by_key(|i| i.image_id);
        self.points3d.sort_by_key(|p| p.point3d_id);
    }

    /// Check the invariants the binary files rely on.
    ///
    /// Image and point ids must be `1..=N` in collection order, camera ids must be
    /// unique and referenced cameras and images must exist.
    pub fn validate(&self) -> Result<(), ColmapError> {
        let mut camera_ids = HashSet::new();
        for camera in &self.cameras {
            if !camera_ids.insert(camera.camera_id) {
                return Err(ColmapError::InvalidReconstruction(format!(
                    "duplicated camera id {}",
                    camera.camera_id
                )));
            }
            if camera.params.len() != camera.model_id.num_params() {
                return Err(ColmapError::InvalidReconstruction(format!(
                    "camera {} has {} params, {} expects {}",
                    camera.camera_id,
                    camera.params.len(),
                    camera.model_id.name(),
                    camera.model_id.num_params()
                )));
            }
        }

        for (i, image) in self.images.iter().enumerate() {
            if image.image_id as usize != i + 1 {
                return Err(ColmapError::InvalidReconstruction(format!(
                    "image at position {} has id {}",
                    i, image.image_id
                )));
            }
            if !camera_ids.contains(&image.camera_id) {
                return Err(ColmapError::InvalidReconstruction(format!(
                    "image {} references missing camera {}",
                    image.image_id, image.camera_id
                )));
            }
            if image.name.contains('\0') {
                return Err(ColmapError::InvalidImageName(image.name.clone()));
            }
        }

        for (i, point) in self.points3d.iter().enumerate() {
            if point.point3d_id != i as u64 + 1 {
                return Err(ColmapError::InvalidReconstruction(format!(
                    "point at position {} has id {}",
                    i, point.point3d_id
                )));
            }
            if let Some((image_id, _)) = point
                .track
                .iter()
                .find(|(image_id, _)| *image_id == 0 || *image_id as usize > self.images.len())
            {
                return Err(ColmapError::InvalidReconstruction(format!(
                    "point {} observed by missing image {}",
                    point.point3d_id, image_id
                )));
            }
        }

        Ok(())
    }
}

/// File name of the image saved at the given sequential index.
pub fn image_file_name(index: usize) -> String {
    format!("{index}.png")
}

/// Rescale a color in `[0, 1]` to 8 bits.
///
/// NOTE: the value is truncated, not rounded. Out of range values saturate.
pub fn color_to_rgb8(color: &[f64; 3]) -> [u8; 3] {
    color.map(|c| (c * 255.0) as u8)
}

/// Build the 3D point records from parallel point and color arrays.
///
/// Points get the ids `1..=N` in input order, an empty track and a zero error.
///
/// # Arguments
///
/// * `points` - The 3D positions.
/// * `colors` - The colors in `[0, 1]`, one per point.
pub fn build_points3d(
    points: &[[f64; 3]],
    colors: &[[f64; 3]],
) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    if points.len() != colors.len() {
        return Err(ColmapError::LengthMismatch {
            points: points.len(),
            colors: colors.len(),
        });
    }

    Ok(points
        .iter()
        .zip(colors.iter())
        .enumerate()
        .map(|(i, (xyz, color))| ColmapPoint3d {
            point3d_id: i as u64 + 1,
            xyz: *xyz,
            rgb: color_to_rgb8(color),
            error: 0.0,
            track: Vec::new(),
        })
        .collect())
}

/// Build a pinhole camera from a 3x3 intrinsic matrix.
///
/// # Arguments
///
/// * `camera_id` - The id of the camera.
/// * `intrinsic` - The camera matrix `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
/// * `width` - The image width in pixels.
/// * `height` - The image height in pixels.
pub fn build_pinhole_camera(
    camera_id: u32,
    intrinsic: &[[f64; 3]; 3],
    width: usize,
    height: usize,
) -> ColmapCamera {
    let (fx, fy) = (intrinsic[0][0], intrinsic[1][1]);
    let (cx, cy) = (intrinsic[0][2], intrinsic[1][2]);
    ColmapCamera {
        camera_id,
        model_id: CameraModelId::CameraModelPinhole,
        width,
        height,
        params: vec![fx, fy, cx, cy],
    }
}

/// Build one image record per camera-to-world pose.
///
/// The image at position `i` gets the id `i + 1` and the name of the file saved at
/// index `i`, see [`image_file_name`].
///
/// # Arguments
///
/// * `camera_to_world` - The poses in image order.
/// * `camera_id` - The camera shared by all the images.
pub fn build_images(
    camera_to_world: &[[[f64; 4]; 4]],
    camera_id: u32,
) -> Result<Vec<ColmapImage>, ColmapError> {
    camera_to_world
        .iter()
        .enumerate()
        .map(|(i, c2w)| {
            let image_id = i as u32 + 1;
            let w2c = camera_to_world_to_world_to_camera(c2w)
                .map_err(|source| ColmapError::Pose { image_id, source })?;
            Ok(ColmapImage {
                name: image_file_name(i),
                image_id,
                camera_id,
                rotation: w2c.quaternion(),
                translation: w2c.translation,
                points2d: Vec::new(),
            })
        })
        .collect()
}

/// Build, sort and validate the full sparse model of a scene.
///
/// # Arguments
///
/// * `points` - The 3D positions.
/// * `colors` - The colors in `[0, 1]`, one per point.
/// * `intrinsic` - The pinhole camera matrix shared by all images.
/// * `width` - The image width in pixels.
/// * `height` - The image height in pixels.
/// * `camera_to_world` - The poses in image order.
pub fn build_reconstruction(
    points: &[[f64; 3]],
    colors: &[[f64; 3]],
    intrinsic: &[[f64; 3]; 3],
    width: usize,
    height: usize,
    camera_to_world: &[[[f64; 4]; 4]],
) -> Result<Reconstruction, ColmapError> {
    let mut reconstruction = Reconstruction {
        cameras: vec![build_pinhole_camera(
            DEFAULT_CAMERA_ID,
            intrinsic,
            width,
            height,
        )],
        images: build_images(camera_to_world, DEFAULT_CAMERA_ID)?,
        points3d: build_points3d(points, colors)?,
    };
    reconstruction.sort_by_id();
    reconstruction.validate()?;
    Ok(reconstruction)
}
