#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// I/O utilities for reading and writing 3D data.
pub mod io;

/// Point cloud container.
pub mod pointcloud;

/// Camera pose conversions.
pub mod pose;

/// Rotation representations and conversions.
pub mod rotation;
