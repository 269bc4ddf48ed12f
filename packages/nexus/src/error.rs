use thiserror::Error;

/// Failure while turning a source image into a container.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unreadable source image: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Unsupported source image: {0}")]
    UnsupportedImage(String),

    #[error("Field '{field}' cannot be stored as text: {reason}")]
    InvalidText { field: String, reason: String },

    #[error("Malformed mapping schema: {0}")]
    Schema(String),

    #[error("Mapping schema is not valid JSON: {0}")]
    SchemaJson(#[from] serde_json::Error),

    #[error("HDF5 write failed: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while reading a container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("Unsupported dataset type: {0}")]
    UnsupportedType(String),
}

/// Failure while encoding a normalized image.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Image dimensions {rows}x{cols} exceed the PNG limit")]
    TooLarge { rows: usize, cols: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
