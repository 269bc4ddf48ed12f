use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use ndarray::{ArrayD, IxDyn};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult, ifd::Value};
use tiff::tags::Tag;

use crate::error::ConversionError;
use crate::sample::RawImage;

/// TIFF tags exposed to mapping schemas, by the name schemas refer to them.
const METADATA_TAGS: [(&str, Tag); 13] = [
    ("ImageWidth", Tag::ImageWidth),
    ("ImageLength", Tag::ImageLength),
    ("BitsPerSample", Tag::BitsPerSample),
    ("SampleFormat", Tag::SampleFormat),
    ("ImageDescription", Tag::ImageDescription),
    ("Make", Tag::Make),
    ("Model", Tag::Model),
    ("Software", Tag::Software),
    ("DateTime", Tag::DateTime),
    ("Artist", Tag::Artist),
    ("XResolution", Tag::XResolution),
    ("YResolution", Tag::YResolution),
    ("ResolutionUnit", Tag::ResolutionUnit),
];

/// A decoded source image and its tag metadata.
#[derive(Debug)]
pub struct SourceImage {
    pub pixels: RawImage,
    pub metadata: BTreeMap<String, String>,
}

/// Decode the first page of a single-channel TIFF file.
pub fn read_tiff(path: &Path) -> Result<SourceImage, ConversionError> {
    let file = File::open(path)?;
    decode_tiff(BufReader::new(file))
}

pub fn decode_tiff<R: Read + Seek>(reader: R) -> Result<SourceImage, ConversionError> {
    let mut decoder = Decoder::new(reader)?;

    let color = decoder.colortype()?;
    if !matches!(color, ColorType::Gray(_)) {
        return Err(ConversionError::UnsupportedImage(format!(
            "expected a single-channel image, got {color:?}"
        )));
    }

    let mut metadata = BTreeMap::new();
    for (name, tag) in METADATA_TAGS {
        if let Some(value) = decoder.find_tag(tag)? {
            metadata.insert(name.to_owned(), format_value(&value));
        }
    }

    let (width, height) = decoder.dimensions()?;
    let shape = IxDyn(&[height as usize, width as usize]);
    let pixels = match decoder.read_image()? {
        DecodingResult::U8(buf) => RawImage::U8(to_array(shape, buf)?),
        DecodingResult::U16(buf) => RawImage::U16(to_array(shape, buf)?),
        DecodingResult::U32(buf) => RawImage::U32(to_array(shape, buf)?),
        DecodingResult::U64(buf) => RawImage::U64(to_array(shape, buf)?),
        DecodingResult::I8(buf) => RawImage::I8(to_array(shape, buf)?),
        DecodingResult::I16(buf) => RawImage::I16(to_array(shape, buf)?),
        DecodingResult::I32(buf) => RawImage::I32(to_array(shape, buf)?),
        DecodingResult::I64(buf) => RawImage::I64(to_array(shape, buf)?),
        DecodingResult::F32(buf) => RawImage::F32(to_array(shape, buf)?),
        DecodingResult::F64(buf) => RawImage::F64(to_array(shape, buf)?),
    };

    Ok(SourceImage { pixels, metadata })
}

fn to_array<T>(shape: IxDyn, buf: Vec<T>) -> Result<ArrayD<T>, ConversionError> {
    ArrayD::from_shape_vec(shape, buf)
        .map_err(|e| ConversionError::UnsupportedImage(format!("pixel buffer mismatch: {e}")))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Ascii(s) => s.trim_end_matches('\0').to_owned(),
        Value::Byte(v) => v.to_string(),
        Value::Short(v) => v.to_string(),
        Value::SignedByte(v) => v.to_string(),
        Value::SignedShort(v) => v.to_string(),
        Value::Signed(v) => v.to_string(),
        Value::SignedBig(v) => v.to_string(),
        Value::Unsigned(v) => v.to_string(),
        Value::UnsignedBig(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Rational(n, d) => rational(f64::from(*n), f64::from(*d)),
        Value::SRational(n, d) => rational(f64::from(*n), f64::from(*d)),
        Value::List(values) => values
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(" "),
        other => format!("{other:?}"),
    }
}

fn rational(numerator: f64, denominator: f64) -> String {
    if denominator == 0.0 {
        return "NaN".into();
    }
    (numerator / denominator).to_string()
}
