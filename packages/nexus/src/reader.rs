use std::collections::BTreeMap;
use std::path::Path;

use hdf5::types::{FloatSize, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Attribute, Dataset, File, Group};

use crate::error::ContainerError;
use crate::sample::RawImage;
use crate::{DATA_DATASET, ENTRY_GROUP, IMAGE_GROUP};

/// A NeXus container opened for reading.
pub struct Container {
    file: File,
}

impl Container {
    pub fn open(path: &Path) -> Result<Self, ContainerError> {
        Ok(Self {
            file: File::open(path)?,
        })
    }

    /// Read `NXentry/image_2d/data`, or `None` when any link on that path
    /// is missing or names an object of the wrong kind.
    pub fn image(&self) -> Result<Option<RawImage>, ContainerError> {
        let Some(dataset) = self.image_dataset()? else {
            return Ok(None);
        };
        read_raw_image(&dataset).map(Some)
    }

    fn image_dataset(&self) -> Result<Option<Dataset>, ContainerError> {
        let Some(entry) = child_group(&self.file, ENTRY_GROUP)? else {
            return Ok(None);
        };
        let Some(image_group) = child_group(&entry, IMAGE_GROUP)? else {
            return Ok(None);
        };
        child_dataset(&image_group, DATA_DATASET)
    }

    /// String attributes of the entry group. Non-string attributes are
    /// skipped.
    pub fn entry_attributes(&self) -> Result<BTreeMap<String, String>, ContainerError> {
        let entry = self.file.group(ENTRY_GROUP)?;
        let mut attributes = BTreeMap::new();
        for name in entry.attr_names()? {
            if let Some(value) = read_string_attr(&entry.attr(&name)?)? {
                attributes.insert(name, value);
            }
        }
        Ok(attributes)
    }

    /// One line per group and dataset, depth first.
    pub fn outline(&self) -> Result<Vec<String>, ContainerError> {
        let mut lines = Vec::new();
        walk(&self.file, &mut lines)?;
        Ok(lines)
    }
}

fn walk(group: &Group, lines: &mut Vec<String>) -> Result<(), ContainerError> {
    for dataset in group.datasets()? {
        let dtype = dataset
            .dtype()
            .and_then(|t| t.to_descriptor())
            .map(|d| d.to_string())
            .unwrap_or_else(|_| "unknown".into());
        lines.push(format!("{} {dtype} {:?}", dataset.name(), dataset.shape()));
    }
    for child in group.groups()? {
        let class = if child.attr_names()?.iter().any(|n| n == "NX_class") {
            read_string_attr(&child.attr("NX_class")?)?.unwrap_or_default()
        } else {
            String::new()
        };
        lines.push(format!("{} ({class})", child.name()));
        walk(&child, lines)?;
    }
    Ok(())
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn child_group(parent: &Group, name: &str) -> Result<Option<Group>, ContainerError> {
    Ok(parent
        .groups()?
        .into_iter()
        .find(|g| base_name(&g.name()) == name))
}

fn child_dataset(parent: &Group, name: &str) -> Result<Option<Dataset>, ContainerError> {
    Ok(parent
        .datasets()?
        .into_iter()
        .find(|d| base_name(&d.name()) == name))
}

fn read_string_attr(attr: &Attribute) -> Result<Option<String>, ContainerError> {
    let value = match attr.dtype()?.to_descriptor()? {
        TypeDescriptor::VarLenUnicode => attr.read_scalar::<VarLenUnicode>()?.to_string(),
        TypeDescriptor::VarLenAscii => attr.read_scalar::<VarLenAscii>()?.to_string(),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn read_raw_image(dataset: &Dataset) -> Result<RawImage, ContainerError> {
    let descriptor = dataset.dtype()?.to_descriptor()?;
    let image = match descriptor {
        TypeDescriptor::Unsigned(IntSize::U1) => RawImage::U8(dataset.read_dyn()?),
        TypeDescriptor::Unsigned(IntSize::U2) => RawImage::U16(dataset.read_dyn()?),
        TypeDescriptor::Unsigned(IntSize::U4) => RawImage::U32(dataset.read_dyn()?),
        TypeDescriptor::Unsigned(IntSize::U8) => RawImage::U64(dataset.read_dyn()?),
        TypeDescriptor::Integer(IntSize::U1) => RawImage::I8(dataset.read_dyn()?),
        TypeDescriptor::Integer(IntSize::U2) => RawImage::I16(dataset.read_dyn()?),
        TypeDescriptor::Integer(IntSize::U4) => RawImage::I32(dataset.read_dyn()?),
        TypeDescriptor::Integer(IntSize::U8) => RawImage::I64(dataset.read_dyn()?),
        TypeDescriptor::Float(FloatSize::U4) => RawImage::F32(dataset.read_dyn()?),
        TypeDescriptor::Float(FloatSize::U8) => RawImage::F64(dataset.read_dyn()?),
        TypeDescriptor::Boolean => RawImage::U8(dataset.read_dyn::<bool>()?.mapv(u8::from)),
        other => return Err(ContainerError::UnsupportedType(other.to_string())),
    };
    Ok(image)
}
