use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{CameraModelId, ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d};

/// Write the 3D points in the `points3D.bin` layout.
///
/// NOTE: the track is written column-wise, all the image ids first and then all the
///       2D point indices.
///
/// # Arguments
///
/// * `writer` - The byte sink.
/// * `points` - The points in emission order.
pub fn write_points3d_binary<W: Write>(
    writer: &mut W,
    points: &[ColmapPoint3d],
) -> Result<(), ColmapError> {
    writer.write_u64::<LittleEndian>(points.len() as u64)?;
    for point in points {
        writer.write_u64::<LittleEndian>(point.point3d_id)?;
        for v in point.xyz {
            writer.write_f64::<LittleEndian>(v)?;
        }
        writer.write_all(&point.rgb)?;
        writer.write_f64::<LittleEndian>(point.error)?;
        writer.write_u64::<LittleEndian>(point.track.len() as u64)?;
        for (image_id, _) in &point.track {
            writer.write_u32::<LittleEndian>(*image_id)?;
        }
        for (_, point2d_idx) in &point.track {
            writer.write_u32::<LittleEndian>(*point2d_idx)?;
        }
    }
    Ok(())
}

/// Write the cameras in the `cameras.bin` layout.
///
/// # Arguments
///
/// * `writer` - The byte sink.
/// * `cameras` - The cameras in emission order.
pub fn write_cameras_binary<W: Write>(
    writer: &mut W,
    cameras: &[ColmapCamera],
) -> Result<(), ColmapError> {
    writer.write_u64::<LittleEndian>(cameras.len() as u64)?;
    for camera in cameras {
        writer.write_u32::<LittleEndian>(camera.camera_id)?;
        writer.write_i32::<LittleEndian>(camera.model_id.code())?;
        writer.write_u64::<LittleEndian>(camera.width as u64)?;
        writer.write_u64::<LittleEndian>(camera.height as u64)?;
        for param in &camera.params {
            writer.write_f64::<LittleEndian>(*param)?;
        }
    }
    Ok(())
}

/// Write the images in the `images.bin` layout.
///
/// The name is written as a null terminated string, so names with an interior null
/// byte are rejected.
///
/// # Arguments
///
/// * `writer` - The byte sink.
/// * `images` - The images in emission order.
pub fn write_images_binary<W: Write>(
    writer: &mut W,
    images: &[ColmapImage],
) -> Result<(), ColmapError> {
    writer.write_u64::<LittleEndian>(images.len() as u64)?;
    for image in images {
        if image.name.as_bytes().contains(&0) {
            return Err(ColmapError::InvalidImageName(image.name.clone()));
        }
        writer.write_u32::<LittleEndian>(image.image_id)?;
        for v in image.rotation {
            writer.write_f64::<LittleEndian>(v)?;
        }
        for v in image.translation {
            writer.write_f64::<LittleEndian>(v)?;
        }
        writer.write_u32::<LittleEndian>(image.camera_id)?;
        writer.write_all(image.name.as_bytes())?;
        writer.write_u8(0)?;
        writer.write_u64::<LittleEndian>(image.points2d.len() as u64)?;
        for (x, y, point3d_id) in &image.points2d {
            writer.write_f64::<LittleEndian>(*x)?;
            writer.write_f64::<LittleEndian>(*y)?;
            writer.write_i64::<LittleEndian>(*point3d_id)?;
        }
    }
    Ok(())
}

// write to a temporary file next to the destination and move it in place on success
fn write_atomic<F>(path: &Path, write_fn: F) -> Result<(), ColmapError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<(), ColmapError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp_file = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp_file.as_file_mut());
        write_fn(&mut writer)?;
        writer.flush()?;
    }
    tmp_file.as_file().sync_all()?;
    tmp_file.persist(path).map_err(|e| e.error)?;

    log::debug!("wrote {}", path.display());

    Ok(())
}

/// Write the `points3D.bin` file.
///
/// The file is first written to a temporary file in the same directory, so a failed
/// write never leaves a truncated file at `path`.
pub fn write_points3d_bin(
    path: impl AsRef<Path>,
    points: &[ColmapPoint3d],
) -> Result<(), ColmapError> {
    write_atomic(path.as_ref(), |w| write_points3d_binary(w, points))
}

/// Write the `cameras.bin` file, see [`write_points3d_bin`].
pub fn write_cameras_bin(
    path: impl AsRef<Path>,
    cameras: &[ColmapCamera],
) -> Result<(), ColmapError> {
    write_atomic(path.as_ref(), |w| write_cameras_binary(w, cameras))
}

/// Write the `images.bin` file, see [`write_points3d_bin`].
pub fn write_images_bin(
    path: impl AsRef<Path>,
    images: &[ColmapImage],
) -> Result<(), ColmapError> {
    write_atomic(path.as_ref(), |w| write_images_binary(w, images))
}

fn read_f64_array<R: Read, const N: usize>(reader: &mut R) -> Result<[f64; N], ColmapError> {
    let mut values = [0.0; N];
    reader.read_f64_into::<LittleEndian>(&mut values)?;
    Ok(values)
}

// counts come from the file, so do not trust them for pre-allocation
fn capacity_hint(count: u64) -> usize {
    count.min(1 << 16) as usize
}

/// Read the 3D points from the `points3D.bin` layout.
pub fn read_points3d_binary<R: Read>(reader: &mut R) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    let num_points = reader.read_u64::<LittleEndian>()?;
    let mut points = Vec::with_capacity(capacity_hint(num_points));

    for _ in 0..num_points {
        let point3d_id = reader.read_u64::<LittleEndian>()?;
        let xyz = read_f64_array::<_, 3>(reader)?;
        let mut rgb = [0u8; 3];
        reader.read_exact(&mut rgb)?;
        let error = reader.read_f64::<LittleEndian>()?;

        let track_len = reader.read_u64::<LittleEndian>()?;
        let image_ids = (0..track_len)
            .map(|_| reader.read_u32::<LittleEndian>())
            .collect::<Result<Vec<_>, _>>()?;
        let point2d_idxs = (0..track_len)
            .map(|_| reader.read_u32::<LittleEndian>())
            .collect::<Result<Vec<_>, _>>()?;

        points.push(ColmapPoint3d {
            point3d_id,
            xyz,
            rgb,
            error,
            track: image_ids.into_iter().zip(point2d_idxs).collect(),
        });
    }

    Ok(points)
}

/// Read the cameras from the `cameras.bin` layout.
///
/// The number of parameters of each camera is given by its model.
pub fn read_cameras_binary<R: Read>(reader: &mut R) -> Result<Vec<ColmapCamera>, ColmapError> {
    let num_cameras = reader.read_u64::<LittleEndian>()?;
    let mut cameras = Vec::with_capacity(capacity_hint(num_cameras));

    for _ in 0..num_cameras {
        let camera_id = reader.read_u32::<LittleEndian>()?;
        let model_id = CameraModelId::from_code(reader.read_i32::<LittleEndian>()?)?;
        let width = reader.read_u64::<LittleEndian>()? as usize;
        let height = reader.read_u64::<LittleEndian>()? as usize;
        let mut params = vec![0.0; model_id.num_params()];
        reader.read_f64_into::<LittleEndian>(&mut params)?;

        cameras.push(ColmapCamera {
            camera_id,
            model_id,
            width,
            height,
            params,
        });
    }

    Ok(cameras)
}

/// Read the images from the `images.bin` layout.
pub fn read_images_binary<R: Read>(reader: &mut R) -> Result<Vec<ColmapImage>, ColmapError> {
    let num_images = reader.read_u64::<LittleEndian>()?;
    let mut images = Vec::with_capacity(capacity_hint(num_images));

    for _ in 0..num_images {
        let image_id = reader.read_u32::<LittleEndian>()?;
        let rotation = read_f64_array::<_, 4>(reader)?;
        let translation = read_f64_array::<_, 3>(reader)?;
        let camera_id = reader.read_u32::<LittleEndian>()?;

        let mut name_bytes = Vec::new();
        loop {
            match reader.read_u8()? {
                0 => break,
                byte => name_bytes.push(byte),
            }
        }
        let name = String::from_utf8(name_bytes)
            .map_err(|e| ColmapError::ParseError(format!("image {image_id} name: {e}")))?;

        let num_points2d = reader.read_u64::<LittleEndian>()?;
        let points2d = (0..num_points2d)
            .map(|_| -> Result<(f64, f64, i64), ColmapError> {
                Ok((
                    reader.read_f64::<LittleEndian>()?,
                    reader.read_f64::<LittleEndian>()?,
                    reader.read_i64::<LittleEndian>()?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        images.push(ColmapImage {
            name,
            image_id,
            camera_id,
            rotation,
            translation,
            points2d,
        });
    }

    Ok(images)
}

/// Read the `points3D.bin` file.
pub fn read_points3d_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_points3d_binary(&mut reader)
}

/// Read the `cameras.bin` file.
pub fn read_cameras_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapCamera>, ColmapError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_cameras_binary(&mut reader)
}

/// Read the `images.bin` file.
pub fn read_images_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapImage>, ColmapError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_images_binary(&mut reader)
}
