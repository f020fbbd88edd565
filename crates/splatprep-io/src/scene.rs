use std::{fs::File, io::BufReader, path::Path};

use ndarray::{Array, Array2, Array3, Array4, ArrayView3, Axis, Dimension, Ix2, Ix3, Ix4, OwnedRepr};
use ndarray_npy::{NpzReader, ReadableElement};

use crate::error::IoError;

/// Name of the input view images in the archive.
pub const INPUT_RGBS_KEY: &str = "input_rgbs";
/// Name of the target view images in the archive.
pub const TARGET_RGBS_KEY: &str = "target_rgbs";
/// Name of the input view camera-to-world poses in the archive.
pub const INPUT_POSES_KEY: &str = "input_poses";
/// Name of the target view camera-to-world poses in the archive.
pub const TARGET_POSES_KEY: &str = "target_poses";
/// Name of the 3x3 intrinsic matrix in the archive.
pub const INTRINSIC_KEY: &str = "intrinsic";

const SCENE_KEYS: [&str; 5] = [
    INPUT_RGBS_KEY,
    TARGET_RGBS_KEY,
    INPUT_POSES_KEY,
    TARGET_POSES_KEY,
    INTRINSIC_KEY,
];

/// The arrays of a generated scene.
///
/// Images are stored as `N x H x W x 3` and poses as `N x 4 x 4` camera-to-world
/// matrices, both in view order.
#[derive(Debug, Clone)]
pub struct SceneData {
    /// Input view images
    pub input_rgbs: Array4<u8>,
    /// Target view images
    pub target_rgbs: Array4<u8>,
    /// Input view camera-to-world poses
    pub input_poses: Array3<f64>,
    /// Target view camera-to-world poses
    pub target_poses: Array3<f64>,
    /// Pinhole intrinsic matrix
    pub intrinsic: Array2<f64>,
}

impl SceneData {
    /// Total number of views, inputs and targets.
    pub fn num_views(&self) -> usize {
        self.input_rgbs.len_of(Axis(0)) + self.target_rgbs.len_of(Axis(0))
    }

    /// Image size as `(width, height)`, taken from the first view.
    pub fn image_size(&self) -> Option<(usize, usize)> {
        self.images().next().map(|image| {
            let (height, width, _) = image.dim();
            (width, height)
        })
    }

    /// Iterate over the images, inputs first and then targets.
    pub fn images(&self) -> impl Iterator<Item = ArrayView3<'_, u8>> {
        self.input_rgbs
            .outer_iter()
            .chain(self.target_rgbs.outer_iter())
    }

    /// Check that the arrays describe a consistent set of views.
    ///
    /// Every image must be `H x W x 3` with the size of the first one, each image
    /// list must have one 4x4 pose per image, the intrinsic must be 3x3 and there
    /// must be at least one view.
    pub fn validate(&self) -> Result<(), IoError> {
        for (rgbs_key, rgbs, poses_key, poses) in [
            (INPUT_RGBS_KEY, &self.input_rgbs, INPUT_POSES_KEY, &self.input_poses),
            (TARGET_RGBS_KEY, &self.target_rgbs, TARGET_POSES_KEY, &self.target_poses),
        ] {
            let (num_rgbs, _, _, channels) = rgbs.dim();
            let (num_poses, rows, cols) = poses.dim();
            if num_rgbs != num_poses {
                return Err(IoError::ShapeMismatch(format!(
                    "{rgbs_key} has {num_rgbs} images but {poses_key} has {num_poses} poses"
                )));
            }
            if channels != 3 {
                return Err(IoError::ShapeMismatch(format!(
                    "{rgbs_key} images have {channels} channels, expected 3"
                )));
            }
            if (rows, cols) != (4, 4) {
                return Err(IoError::ShapeMismatch(format!(
                    "{poses_key} poses are {rows}x{cols}, expected 4x4"
                )));
            }
        }

        let Some((width, height)) = self.image_size() else {
            return Err(IoError::ShapeMismatch("scene has no views".to_string()));
        };
        for (i, image) in self.images().enumerate() {
            let (h, w, _) = image.dim();
            if (w, h) != (width, height) {
                return Err(IoError::ShapeMismatch(format!(
                    "image {i} is {w}x{h}, expected {width}x{height}"
                )));
            }
        }

        if self.intrinsic.dim() != (3, 3) {
            let (rows, cols) = self.intrinsic.dim();
            return Err(IoError::ShapeMismatch(format!(
                "{INTRINSIC_KEY} is {rows}x{cols}, expected 3x3"
            )));
        }

        Ok(())
    }

    /// The camera-to-world poses, inputs first and then targets.
    ///
    /// PRECONDITION: [`SceneData::validate`] succeeded.
    pub fn camera_to_world(&self) -> Vec<[[f64; 4]; 4]> {
        self.input_poses
            .outer_iter()
            .chain(self.target_poses.outer_iter())
            .map(|pose| {
                let mut m = [[0.0; 4]; 4];
                for ((i, j), v) in pose.indexed_iter() {
                    m[i][j] = *v;
                }
                m
            })
            .collect()
    }

    /// The intrinsic matrix as a fixed size array.
    ///
    /// PRECONDITION: [`SceneData::validate`] succeeded.
    pub fn intrinsic_matrix(&self) -> [[f64; 3]; 3] {
        let mut k = [[0.0; 3]; 3];
        for ((i, j), v) in self.intrinsic.indexed_iter() {
            k[i][j] = *v;
        }
        k
    }
}

// numpy stores `key` as `key.npy`, depending on the writer the suffix may or may not
// be reported by `names` or expected by `by_name`
fn find_array_name(npz: &mut NpzReader<BufReader<File>>, key: &str) -> Result<String, IoError> {
    let names = npz.names()?;
    if let Some(name) = names.iter().find(|name| name.trim_end_matches(".npy") == key) {
        return Ok(name.clone());
    }

    // `np.savez(path, data)` with a dict stores one object array named `arr_0`
    match names.as_slice() {
        [single] => {
            let single = single.trim_end_matches(".npy");
            if SCENE_KEYS.contains(&single) {
                Err(IoError::MissingArray(key.to_string()))
            } else {
                Err(IoError::PickledArchive(single.to_string()))
            }
        }
        _ => Err(IoError::MissingArray(key.to_string())),
    }
}

fn by_name<T, D>(
    npz: &mut NpzReader<BufReader<File>>,
    name: &str,
) -> Result<Array<T, D>, ndarray_npy::ReadNpzError>
where
    T: ReadableElement,
    D: Dimension,
{
    let stem = name.trim_end_matches(".npy");
    npz.by_name::<OwnedRepr<T>, D>(name).or_else(|err| {
        let alternative = if stem == name {
            format!("{name}.npy")
        } else {
            stem.to_string()
        };
        npz.by_name::<OwnedRepr<T>, D>(&alternative)
            .map_err(|_| err)
    })
}

fn read_u8_array<D: Dimension>(
    npz: &mut NpzReader<BufReader<File>>,
    key: &str,
) -> Result<Array<u8, D>, IoError> {
    let name = find_array_name(npz, key)?;
    by_name::<u8, D>(npz, &name).map_err(|source| IoError::ArrayReadError {
        key: key.to_string(),
        source,
    })
}

// float arrays may be stored in single or double precision
fn read_f64_array<D: Dimension>(
    npz: &mut NpzReader<BufReader<File>>,
    key: &str,
) -> Result<Array<f64, D>, IoError> {
    let name = find_array_name(npz, key)?;
    match by_name::<f64, D>(npz, &name) {
        Ok(array) => Ok(array),
        Err(source) => by_name::<f32, D>(npz, &name)
            .map(|array| array.mapv(f64::from))
            .map_err(|_| IoError::ArrayReadError {
                key: key.to_string(),
                source,
            }),
    }
}

fn open_npz(path: &Path) -> Result<NpzReader<BufReader<File>>, IoError> {
    if !path.exists() {
        return Err(IoError::FileDoesNotExist(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Ok(NpzReader::new(BufReader::new(file))?)
}

/// List the names of the arrays stored in a `.npz` archive.
pub fn list_npz_arrays(path: impl AsRef<Path>) -> Result<Vec<String>, IoError> {
    let mut npz = open_npz(path.as_ref())?;
    Ok(npz
        .names()?
        .into_iter()
        .map(|name| name.trim_end_matches(".npy").to_string())
        .collect())
}

/// Read a generated scene from a `.npz` archive.
///
/// The archive must contain the arrays `input_rgbs`, `target_rgbs` (uint8,
/// `N x H x W x 3`), `input_poses`, `target_poses` (float, `N x 4 x 4`) and
/// `intrinsic` (float, `3 x 3`).
///
/// # Arguments
///
/// * `path` - The path to the archive.
pub fn read_scene_npz(path: impl AsRef<Path>) -> Result<SceneData, IoError> {
    let path = path.as_ref();
    let mut npz = open_npz(path)?;

    let scene = SceneData {
        input_rgbs: read_u8_array::<Ix4>(&mut npz, INPUT_RGBS_KEY)?,
        target_rgbs: read_u8_array::<Ix4>(&mut npz, TARGET_RGBS_KEY)?,
        input_poses: read_f64_array::<Ix3>(&mut npz, INPUT_POSES_KEY)?,
        target_poses: read_f64_array::<Ix3>(&mut npz, TARGET_POSES_KEY)?,
        intrinsic: read_f64_array::<Ix2>(&mut npz, INTRINSIC_KEY)?,
    };

    log::debug!(
        "read {} with {} input and {} target views",
        path.display(),
        scene.input_rgbs.len_of(Axis(0)),
        scene.target_rgbs.len_of(Axis(0))
    );

    Ok(scene)
}
