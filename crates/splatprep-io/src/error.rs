/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to open the npz archive.
    #[error("Failed to read the npz archive. {0}")]
    NpzError(#[from] ndarray_npy::ReadNpzError),

    /// A required array is not in the archive.
    #[error("Array {0:?} not found in the archive")]
    MissingArray(String),

    /// The archive holds a single pickled object instead of named arrays.
    #[error(
        "Archive holds the single array {0:?}, likely a pickled dictionary. \
         Re-save it with one named array per key (np.savez(path, **data))"
    )]
    PickledArchive(String),

    /// An array could not be decoded with the expected type and rank.
    #[error("Failed to read array {key:?}. {source}")]
    ArrayReadError {
        /// Array name
        key: String,
        /// Underlying error
        #[source]
        source: ndarray_npy::ReadNpzError,
    },

    /// Arrays with inconsistent shapes.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Error to encode the PNG image.
    #[error("Failed to encode the png image. {0}")]
    PngEncodingError(String),

    /// Error to decode the PNG image.
    #[error("Failed to decode the png image. {0}")]
    PngDecodeError(String),
}
