//! NeXus/HDF5 handling for microscopy images: building containers from
//! TIFF sources, reading them back, and normalizing pixel data for display.

pub mod builder;
pub mod error;
pub mod normalize;
pub mod reader;
pub mod render;
mod sample;
pub mod schema;
pub mod source;

pub use builder::{BuildRequest, ContainerBuilder, ExtraFields, NexusBuilder};
pub use error::{ContainerError, ConversionError, RenderError};
pub use normalize::normalize;
pub use reader::Container;
pub use sample::{RawImage, SampleKind, Samples};
pub use schema::{FieldMapping, MappingSchema};

/// Top-level group holding the experiment.
pub const ENTRY_GROUP: &str = "NXentry";
/// Group below [`ENTRY_GROUP`] holding the image signal.
pub const IMAGE_GROUP: &str = "image_2d";
/// Image dataset name inside [`IMAGE_GROUP`].
pub const DATA_DATASET: &str = "data";
