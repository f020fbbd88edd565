#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`error::IoError`] variants for file access, container reading and
/// image encoding failures.
pub mod error;

/// PNG image encoding and decoding.
///
/// Read and write 8-bit RGB images stored as `H x W x 3` arrays.
pub mod png;

/// Scene container loading.
///
/// Reads the images, poses and intrinsics of a generated scene from a `.npz` archive.
/// See [`scene::read_scene_npz`].
pub mod scene;
