use std::{fs::File, io::Write, path::Path};

use approx::assert_relative_eq;
use ndarray::{array, Array3, Array4};
use ndarray_npy::NpzWriter;

use splatprep::{
    convert::{convert_scene, export_scene, ConvertConfig, ConvertError},
    io::{png::read_image_png_rgb8, scene::SceneData},
    k3d::{io::colmap, pointcloud::PointCloud},
};

const TRANSLATIONS: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

const POINTS: [[f64; 3]; 5] = [
    [0.0, 0.0, 2.0],
    [0.5, -0.5, 3.0],
    [-1.0, 1.0, 4.0],
    [2.0, 0.25, 5.0],
    [0.0, -2.0, 6.0],
];

const COLORS_RGB8: [[u8; 3]; 5] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [51, 51, 51],
    [255, 255, 255],
];

fn poses(translations: &[[f64; 3]]) -> Array3<f64> {
    Array3::from_shape_fn((translations.len(), 4, 4), |(n, i, j)| match (i, j) {
        (i, 3) if i < 3 => translations[n][i],
        (i, j) if i == j => 1.0,
        _ => 0.0,
    })
}

fn images(offset: usize, n: usize) -> Array4<u8> {
    Array4::from_shape_fn((n, 64, 64, 3), |(v, y, x, c)| {
        ((offset + v) * 50 + y + x + c) as u8
    })
}

fn sample_scene() -> SceneData {
    SceneData {
        input_rgbs: images(0, 2),
        target_rgbs: images(2, 2),
        input_poses: poses(&TRANSLATIONS[..2]),
        target_poses: poses(&TRANSLATIONS[2..]),
        intrinsic: array![[50.0, 0.0, 32.0], [0.0, 50.0, 32.0], [0.0, 0.0, 1.0]],
    }
}

fn sample_pointcloud() -> PointCloud {
    let colors = COLORS_RGB8
        .iter()
        .map(|c| c.map(|v| v as f64 / 255.0))
        .collect();
    PointCloud::new(POINTS.to_vec(), Some(colors))
}

fn write_scene_npz(path: &Path, scene: &SceneData) -> Result<(), Box<dyn std::error::Error>> {
    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array("input_rgbs", &scene.input_rgbs)?;
    npz.add_array("target_rgbs", &scene.target_rgbs)?;
    npz.add_array("input_poses", &scene.input_poses)?;
    npz.add_array("target_poses", &scene.target_poses)?;
    npz.add_array("intrinsic", &scene.intrinsic.mapv(|v| v as f32))?;
    npz.finish()?;
    Ok(())
}

fn write_pointcloud_ply(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(path)?;
    write!(
        file,
        "ply\nformat binary_little_endian 1.0\nelement vertex {}\n\
         property double x\nproperty double y\nproperty double z\n\
         property uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n",
        POINTS.len()
    )?;
    for (xyz, rgb) in POINTS.iter().zip(COLORS_RGB8.iter()) {
        for v in xyz {
            file.write_all(&v.to_le_bytes())?;
        }
        file.write_all(rgb)?;
    }
    Ok(())
}

fn check_sparse_model(output_dir: &Path, scene: &SceneData) -> Result<(), Box<dyn std::error::Error>> {
    let sparse_dir = output_dir.join("sparse/0");

    // fixed record sizes: camera 24 + 4 * 8, image 76 + name, point 51
    assert_eq!(std::fs::metadata(sparse_dir.join("cameras.bin"))?.len(), 8 + 56);
    assert_eq!(std::fs::metadata(sparse_dir.join("images.bin"))?.len(), 8 + 4 * 78);
    assert_eq!(std::fs::metadata(sparse_dir.join("points3D.bin"))?.len(), 8 + 5 * 51);

    let cameras = colmap::read_cameras_bin(sparse_dir.join("cameras.bin"))?;
    assert_eq!(cameras.len(), 1);
    assert_eq!(cameras[0].camera_id, 1);
    assert_eq!(cameras[0].model_id.code(), 0);
    assert_eq!((cameras[0].width, cameras[0].height), (64, 64));
    assert_eq!(cameras[0].params, vec![50.0, 50.0, 32.0, 32.0]);

    let images = colmap::read_images_bin(sparse_dir.join("images.bin"))?;
    assert_eq!(images.len(), 4);
    for (i, image) in images.iter().enumerate() {
        assert_eq!(image.image_id as usize, i + 1);
        assert_eq!(image.camera_id, 1);
        assert_eq!(image.name, format!("{i}.png"));
        assert!(image.points2d.is_empty());
        for (q, expected) in image.rotation.iter().zip([1.0, 0.0, 0.0, 0.0]) {
            assert_relative_eq!(*q, expected, epsilon = 1e-12);
        }
        for (t, expected) in image.translation.iter().zip(TRANSLATIONS[i]) {
            assert_relative_eq!(*t, -expected, epsilon = 1e-12);
        }
    }

    let points = colmap::read_points3d_bin(sparse_dir.join("points3D.bin"))?;
    assert_eq!(points.len(), POINTS.len());
    for (i, point) in points.iter().enumerate() {
        assert_eq!(point.point3d_id, i as u64 + 1);
        assert_eq!(point.xyz, POINTS[i]);
        assert_eq!(point.rgb, COLORS_RGB8[i]);
        assert_eq!(point.error, 0.0);
        assert!(point.track.is_empty());
    }

    for (i, expected) in scene.images().enumerate() {
        let image = read_image_png_rgb8(output_dir.join("input").join(format!("{i}.png")))?;
        assert_eq!(image, expected);
    }
    assert!(!output_dir.join("input/4.png").exists());

    Ok(())
}

#[test]
fn export_scene_writes_sparse_model() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let output_dir = tmp_dir.path().join("colmap");
    let scene = sample_scene();

    let summary = export_scene(&scene, &sample_pointcloud(), &output_dir)?;
    assert_eq!(summary.num_images, 4);
    assert_eq!(summary.num_points, 5);
    assert_eq!(summary.output_dir, output_dir);

    check_sparse_model(&output_dir, &scene)
}

#[test]
fn convert_scene_from_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let scene_dir = tmp_dir.path().join("spatialgen");
    let output_dir = tmp_dir.path().join("rade");
    std::fs::create_dir_all(&scene_dir)?;

    let scene = sample_scene();
    write_scene_npz(&scene_dir.join("inference_results.npz"), &scene)?;
    write_pointcloud_ply(&scene_dir.join("global_scene_ply.ply"))?;

    let config = ConvertConfig::new(&scene_dir, &output_dir);
    let summary = convert_scene(&config)?;
    assert_eq!((summary.num_images, summary.num_points), (4, 5));
    check_sparse_model(&output_dir, &scene)?;

    // a second run over the same directories gives the same bytes
    let first = std::fs::read(output_dir.join("sparse/0/images.bin"))?;
    convert_scene(&config)?;
    let second = std::fs::read(output_dir.join("sparse/0/images.bin"))?;
    assert_eq!(first, second);

    Ok(())
}

#[test]
fn convert_scene_custom_file_names() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let scene = sample_scene();
    write_scene_npz(&tmp_dir.path().join("scene.npz"), &scene)?;
    write_pointcloud_ply(&tmp_dir.path().join("cloud.ply"))?;

    let config = ConvertConfig::new(tmp_dir.path(), tmp_dir.path().join("out"))
        .with_container_file("scene.npz")
        .with_pointcloud_file("cloud.ply");
    convert_scene(&config)?;
    check_sparse_model(&tmp_dir.path().join("out"), &scene)
}

#[test]
fn convert_scene_missing_pointcloud() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    write_scene_npz(&tmp_dir.path().join("inference_results.npz"), &sample_scene())?;

    let config = ConvertConfig::new(tmp_dir.path(), tmp_dir.path().join("out"));
    let res = convert_scene(&config);
    assert!(matches!(res, Err(ConvertError::MissingInput(ref p)) if p.ends_with("global_scene_ply.ply")));
    Ok(())
}

#[test]
fn convert_scene_missing_array() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let scene = sample_scene();

    let mut npz = NpzWriter::new(File::create(tmp_dir.path().join("inference_results.npz"))?);
    npz.add_array("input_rgbs", &scene.input_rgbs)?;
    npz.add_array("target_rgbs", &scene.target_rgbs)?;
    npz.add_array("input_poses", &scene.input_poses)?;
    npz.add_array("target_poses", &scene.target_poses)?;
    npz.finish()?;
    write_pointcloud_ply(&tmp_dir.path().join("global_scene_ply.ply"))?;

    let config = ConvertConfig::new(tmp_dir.path(), tmp_dir.path().join("out"));
    let res = convert_scene(&config);
    assert!(matches!(res, Err(ConvertError::MissingKey(ref key)) if key == "intrinsic"));
    Ok(())
}

#[test]
fn export_scene_rejects_mixed_sizes() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let mut scene = sample_scene();
    scene.target_rgbs = Array4::zeros((2, 32, 64, 3));

    let res = export_scene(&scene, &sample_pointcloud(), tmp_dir.path());
    assert!(matches!(res, Err(ConvertError::ShapeMismatch(_))));
    Ok(())
}

#[test]
fn export_scene_rejects_uncolored_points() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let pointcloud = PointCloud::new(POINTS.to_vec(), None);

    let res = export_scene(&sample_scene(), &pointcloud, tmp_dir.path());
    assert!(matches!(
        res,
        Err(ConvertError::Colmap(colmap::ColmapError::LengthMismatch { points: 5, colors: 0 }))
    ));
    Ok(())
}
