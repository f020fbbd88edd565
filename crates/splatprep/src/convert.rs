use std::path::{Path, PathBuf};

use splatprep_3d::{
    io::{
        colmap::{self, ColmapError},
        ply::{self, PlyError},
    },
    pointcloud::PointCloud,
};
use splatprep_io::{
    error::IoError,
    png::write_image_png_rgb8,
    scene::{read_scene_npz, SceneData},
};

/// Default name of the scene archive inside the scene directory.
pub const DEFAULT_CONTAINER_FILE: &str = "inference_results.npz";

/// Default name of the point cloud inside the scene directory.
pub const DEFAULT_POINTCLOUD_FILE: &str = "global_scene_ply.ply";

/// Directory of the saved images, relative to the output directory.
pub const IMAGES_DIR: &str = "input";

/// Directory of the sparse model, relative to the output directory.
pub const SPARSE_DIR: &str = "sparse/0";

/// Errors of the conversion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A required input file does not exist
    #[error("Missing input file {0}")]
    MissingInput(PathBuf),

    /// A required array is not in the scene archive
    #[error("Missing array {0:?} in the scene archive")]
    MissingKey(String),

    /// Scene arrays with inconsistent shapes
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Error creating directories
    #[error("Failed to create the output layout. {0}")]
    Io(#[from] std::io::Error),

    /// Error reading the scene or writing the images
    #[error(transparent)]
    Scene(IoError),

    /// Error reading the point cloud
    #[error(transparent)]
    Ply(#[from] PlyError),

    /// Error building or writing the sparse model
    #[error(transparent)]
    Colmap(#[from] ColmapError),
}

impl From<IoError> for ConvertError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::FileDoesNotExist(path) => ConvertError::MissingInput(path),
            IoError::MissingArray(key) => ConvertError::MissingKey(key),
            IoError::ShapeMismatch(msg) => ConvertError::ShapeMismatch(msg),
            err => ConvertError::Scene(err),
        }
    }
}

/// Locations of a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    /// Directory holding the scene archive and the point cloud.
    pub scene_dir: PathBuf,
    /// Destination directory, created if needed.
    pub output_dir: PathBuf,
    /// File name of the scene archive inside `scene_dir`.
    pub container_file: String,
    /// File name of the point cloud inside `scene_dir`.
    pub pointcloud_file: String,
}

impl ConvertConfig {
    /// Create a config with the default input file names.
    pub fn new(scene_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            scene_dir: scene_dir.into(),
            output_dir: output_dir.into(),
            container_file: DEFAULT_CONTAINER_FILE.to_string(),
            pointcloud_file: DEFAULT_POINTCLOUD_FILE.to_string(),
        }
    }

    /// Set the file name of the scene archive.
    pub fn with_container_file(mut self, container_file: impl Into<String>) -> Self {
        self.container_file = container_file.into();
        self
    }

    /// Set the file name of the point cloud.
    pub fn with_pointcloud_file(mut self, pointcloud_file: impl Into<String>) -> Self {
        self.pointcloud_file = pointcloud_file.into();
        self
    }

    /// Full path to the scene archive.
    pub fn container_path(&self) -> PathBuf {
        self.scene_dir.join(&self.container_file)
    }

    /// Full path to the point cloud.
    pub fn pointcloud_path(&self) -> PathBuf {
        self.scene_dir.join(&self.pointcloud_file)
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSummary {
    /// Number of images saved and registered.
    pub num_images: usize,
    /// Number of 3D points written.
    pub num_points: usize,
    /// Destination directory.
    pub output_dir: PathBuf,
}

/// Convert a generated scene into images and a sparse model.
///
/// Reads the scene archive and the point cloud from `config.scene_dir` and writes
/// `input/{i}.png` and `sparse/0/{cameras,images,points3D}.bin` into
/// `config.output_dir`, see [`export_scene`].
///
/// Running it twice with the same inputs produces identical outputs.
pub fn convert_scene(config: &ConvertConfig) -> Result<ConvertSummary, ConvertError> {
    let container_path = config.container_path();
    let pointcloud_path = config.pointcloud_path();

    for path in [&container_path, &pointcloud_path] {
        if !path.exists() {
            return Err(ConvertError::MissingInput(path.clone()));
        }
    }

    log::info!("reading scene from {}", container_path.display());
    let scene = read_scene_npz(&container_path)?;

    log::info!("reading point cloud from {}", pointcloud_path.display());
    let pointcloud = ply::read_ply(&pointcloud_path)?;

    export_scene(&scene, &pointcloud, &config.output_dir)
}

/// Write already loaded scene data as images and a sparse model.
///
/// Images are saved inputs first and then targets, as `input/{i}.png` with `i`
/// from 0. The image with file index `i` is registered with id `i + 1` and every
/// image shares a single pinhole camera built from the scene intrinsic.
///
/// # Arguments
///
/// * `scene` - The images, poses and intrinsic of the scene.
/// * `pointcloud` - The colored points of the scene.
/// * `output_dir` - The destination directory, created if needed.
pub fn export_scene(
    scene: &SceneData,
    pointcloud: &PointCloud,
    output_dir: impl AsRef<Path>,
) -> Result<ConvertSummary, ConvertError> {
    let output_dir = output_dir.as_ref();
    scene.validate()?;
    let Some((width, height)) = scene.image_size() else {
        return Err(ConvertError::ShapeMismatch("scene has no views".to_string()));
    };

    let images_dir = output_dir.join(IMAGES_DIR);
    let sparse_dir = output_dir.join(SPARSE_DIR);
    std::fs::create_dir_all(&images_dir)?;
    std::fs::create_dir_all(&sparse_dir)?;

    log::info!(
        "saving {} images of {}x{} to {}",
        scene.num_views(),
        width,
        height,
        images_dir.display()
    );
    for (i, image) in scene.images().enumerate() {
        let path = images_dir.join(colmap::image_file_name(i));
        write_image_png_rgb8(&path, image)?;
        log::debug!("wrote {}", path.display());
    }

    // a cloud without colors only passes with no points
    let colors = pointcloud.colors().unwrap_or(&[]);
    let reconstruction = colmap::build_reconstruction(
        pointcloud.points(),
        colors,
        &scene.intrinsic_matrix(),
        width,
        height,
        &scene.camera_to_world(),
    )?;

    log::info!(
        "writing {} cameras, {} images and {} points to {}",
        reconstruction.cameras.len(),
        reconstruction.images.len(),
        reconstruction.points3d.len(),
        sparse_dir.display()
    );
    colmap::write_cameras_bin(sparse_dir.join("cameras.bin"), &reconstruction.cameras)?;
    colmap::write_images_bin(sparse_dir.join("images.bin"), &reconstruction.images)?;
    colmap::write_points3d_bin(sparse_dir.join("points3D.bin"), &reconstruction.points3d)?;

    let summary = ConvertSummary {
        num_images: reconstruction.images.len(),
        num_points: reconstruction.points3d.len(),
        output_dir: output_dir.to_path_buf(),
    };
    log::info!("converted scene into {}: {:?}", output_dir.display(), summary);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConvertConfig::new("scene", "out");
        assert_eq!(config.container_path(), Path::new("scene/inference_results.npz"));
        assert_eq!(config.pointcloud_path(), Path::new("scene/global_scene_ply.ply"));

        let config = config
            .with_container_file("results.npz")
            .with_pointcloud_file("cloud.ply");
        assert_eq!(config.container_path(), Path::new("scene/results.npz"));
        assert_eq!(config.pointcloud_path(), Path::new("scene/cloud.ply"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_io_error_mapping() {
        let err = ConvertError::from(IoError::MissingArray("intrinsic".to_string()));
        assert!(matches!(err, ConvertError::MissingKey(ref key) if key == "intrinsic"));

        let err = ConvertError::from(IoError::FileDoesNotExist(PathBuf::from("a.npz")));
        assert!(matches!(err, ConvertError::MissingInput(_)));

        let err = ConvertError::from(IoError::ShapeMismatch("bad".to_string()));
        assert!(matches!(err, ConvertError::ShapeMismatch(_)));

        let err = ConvertError::from(IoError::PngEncodingError("bad".to_string()));
        assert!(matches!(err, ConvertError::Scene(_)));
    }

    #[test]
    fn test_convert_missing_inputs() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;
        let config = ConvertConfig::new(tmp_dir.path(), tmp_dir.path().join("out"));
        let res = convert_scene(&config);
        assert!(matches!(res, Err(ConvertError::MissingInput(ref p)) if p == &config.container_path()));
        assert!(!tmp_dir.path().join("out").exists());
        Ok(())
    }
}
