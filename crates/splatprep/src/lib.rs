#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use splatprep_3d as k3d;

#[doc(inline)]
pub use splatprep_io as io;

/// Scene to sparse model conversion.
///
/// See [`convert::convert_scene`] for the full pipeline and [`convert::export_scene`]
/// for converting already loaded data.
pub mod convert;
