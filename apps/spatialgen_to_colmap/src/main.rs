use argh::FromArgs;
use std::path::PathBuf;

use splatprep::convert::{convert_scene, ConvertConfig};

#[derive(FromArgs)]
/// Convert a generated scene into images and a COLMAP sparse model
struct Args {
    /// directory with the scene archive and the point cloud
    #[argh(option)]
    spatialgen_dir: PathBuf,

    /// destination directory for `input/` and `sparse/0/`
    #[argh(option)]
    rade_datadir: PathBuf,

    /// file name of the scene archive inside the scene directory
    #[argh(option)]
    container_file: Option<String>,

    /// file name of the point cloud inside the scene directory
    #[argh(option)]
    pointcloud_file: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let mut config = ConvertConfig::new(args.spatialgen_dir, args.rade_datadir);
    if let Some(container_file) = args.container_file {
        config = config.with_container_file(container_file);
    }
    if let Some(pointcloud_file) = args.pointcloud_file {
        config = config.with_pointcloud_file(pointcloud_file);
    }

    let summary = convert_scene(&config)?;

    println!(
        "Wrote {} images and {} points to {}",
        summary.num_images,
        summary.num_points,
        summary.output_dir.display()
    );

    Ok(())
}
