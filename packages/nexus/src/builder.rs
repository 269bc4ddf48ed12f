use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use hdf5::types::VarLenUnicode;
use hdf5::{File, Group, Location};
use tracing::debug;

use crate::error::ConversionError;
use crate::sample::{RawImage, for_each_variant};
use crate::schema::{FieldMapping, MappingSchema};
use crate::source::read_tiff;
use crate::{DATA_DATASET, ENTRY_GROUP, IMAGE_GROUP};

/// Experiment metadata written verbatim as entry attributes.
pub type ExtraFields = BTreeMap<String, String>;

/// Inputs for one container build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub source: PathBuf,
    pub schema: PathBuf,
    pub extra_fields: ExtraFields,
    pub output: PathBuf,
}

/// Produces a scientific container on local disk from a source image.
///
/// Implementations block; async callers run them on the blocking pool.
pub trait ContainerBuilder: Send + Sync {
    /// Build the container and return the path it was written to.
    fn build(&self, request: &BuildRequest) -> Result<PathBuf, ConversionError>;
}

/// Writes TIFF images into NeXus/HDF5 containers.
pub struct NexusBuilder {
    creator: String,
}

impl NexusBuilder {
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
        }
    }
}

impl Default for NexusBuilder {
    fn default() -> Self {
        Self::new(concat!("nexus ", env!("CARGO_PKG_VERSION")))
    }
}

impl ContainerBuilder for NexusBuilder {
    fn build(&self, request: &BuildRequest) -> Result<PathBuf, ConversionError> {
        let schema = MappingSchema::load(&request.schema)?;
        let source = read_tiff(&request.source)?;

        debug!(
            source = %request.source.display(),
            schema = %schema.name,
            dtype = source.pixels.dtype_name(),
            shape = ?source.pixels.shape(),
            "Building NeXus container"
        );

        let file = File::create(&request.output)?;
        set_attr_str(&file, "NX_class", "NXroot")?;
        set_attr_str(&file, "creator", &self.creator)?;
        set_attr_str(
            &file,
            "file_time",
            &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;

        let entry = file.create_group(ENTRY_GROUP)?;
        set_attr_str(&entry, "NX_class", "NXentry")?;
        set_attr_str(&entry, "mapping_schema", &schema.name)?;
        set_attr_str(&entry, "mapping_version", &schema.version)?;
        if let Some(definition) = &schema.definition {
            set_attr_str(&entry, "definition", definition)?;
        }
        for (name, value) in &request.extra_fields {
            set_attr_str(&entry, name, value)?;
        }

        let image_group = entry.create_group(IMAGE_GROUP)?;
        set_attr_str(&image_group, "NX_class", "NXdata")?;
        set_attr_str(&image_group, "signal", DATA_DATASET)?;
        write_pixels(&image_group, &source.pixels)?;

        for field in &schema.fields {
            match source.metadata.get(&field.source) {
                Some(value) => write_mapped_field(&entry, field, value)?,
                None => debug!(source = %field.source, "Mapped field absent from source image"),
            }
        }

        file.flush()?;
        Ok(request.output.clone())
    }
}

fn write_pixels(group: &Group, pixels: &RawImage) -> Result<(), ConversionError> {
    for_each_variant!(pixels, a => {
        group.new_dataset_builder().with_data(a).create(DATA_DATASET)?;
    });
    Ok(())
}

fn write_mapped_field(
    entry: &Group,
    field: &FieldMapping,
    value: &str,
) -> Result<(), ConversionError> {
    let (groups, leaf) = field.target_parts();
    let parent = ensure_groups(entry, &groups)?;

    if field.attribute {
        return set_attr_str(&parent, leaf, value);
    }

    let dataset = parent
        .new_dataset::<VarLenUnicode>()
        .shape(())
        .create(leaf)?;
    dataset.write_scalar(&to_var_len_unicode(&field.target, value)?)?;
    if let Some(units) = &field.units {
        set_attr_str(&dataset, "units", units)?;
    }
    Ok(())
}

fn ensure_groups(root: &Group, path: &[&str]) -> Result<Group, ConversionError> {
    let mut current = root.clone();
    for name in path {
        current = if current.member_names()?.iter().any(|m| m == name) {
            current.group(name)?
        } else {
            current.create_group(name)?
        };
    }
    Ok(current)
}

fn set_attr_str(location: &Location, name: &str, value: &str) -> Result<(), ConversionError> {
    let value = to_var_len_unicode(name, value)?;
    location
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn to_var_len_unicode(field: &str, value: &str) -> Result<VarLenUnicode, ConversionError> {
    VarLenUnicode::from_str(value).map_err(|e| ConversionError::InvalidText {
        field: field.to_owned(),
        reason: e.to_string(),
    })
}
