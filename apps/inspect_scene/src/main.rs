use argh::FromArgs;
use std::path::PathBuf;

use splatprep::io::scene::{list_npz_arrays, read_scene_npz};

#[derive(FromArgs)]
/// Print the arrays of a scene archive
struct Args {
    /// path to the `.npz` scene archive
    #[argh(positional)]
    path: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let names = list_npz_arrays(&args.path)?;
    println!("{}: {} arrays", args.path.display(), names.len());
    for name in &names {
        println!("  {name}");
    }

    // the scene layout may be incomplete, report instead of failing
    let scene = match read_scene_npz(&args.path) {
        Ok(scene) => scene,
        Err(e) => {
            log::warn!("not a complete scene archive: {e}");
            return Ok(());
        }
    };

    println!("input_rgbs:   {:?}", scene.input_rgbs.shape());
    println!("target_rgbs:  {:?}", scene.target_rgbs.shape());
    println!("input_poses:  {:?}", scene.input_poses.shape());
    println!("target_poses: {:?}", scene.target_poses.shape());
    println!("intrinsic:    {:?}", scene.intrinsic);

    match scene.validate() {
        Ok(()) => println!("{} views, image size {:?}", scene.num_views(), scene.image_size()),
        Err(e) => log::warn!("inconsistent scene: {e}"),
    }

    Ok(())
}
