use ndarray::ArrayD;

/// Category of a raw array's element type, as far as display
/// normalization is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Float,
    U16,
    OtherInt,
}

/// A raw N-dimensional pixel array with its native element type.
#[derive(Debug, Clone, PartialEq)]
pub enum RawImage {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Pixel values widened to a representation that holds every value of
/// their kind exactly. Floats keep their precision: `f32` data is
/// normalized in `f32` arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    U16(ArrayD<u16>),
    OtherInt(ArrayD<i128>),
}

macro_rules! for_each_variant {
    ($image:expr, $array:ident => $body:expr) => {
        match $image {
            RawImage::U8($array) => $body,
            RawImage::U16($array) => $body,
            RawImage::U32($array) => $body,
            RawImage::U64($array) => $body,
            RawImage::I8($array) => $body,
            RawImage::I16($array) => $body,
            RawImage::I32($array) => $body,
            RawImage::I64($array) => $body,
            RawImage::F32($array) => $body,
            RawImage::F64($array) => $body,
        }
    };
}
pub(crate) use for_each_variant;

impl RawImage {
    pub fn kind(&self) -> SampleKind {
        match self {
            RawImage::F32(_) | RawImage::F64(_) => SampleKind::Float,
            RawImage::U16(_) => SampleKind::U16,
            _ => SampleKind::OtherInt,
        }
    }

    pub fn shape(&self) -> &[usize] {
        for_each_variant!(self, a => a.shape())
    }

    pub fn len(&self) -> usize {
        for_each_variant!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// numpy-style name of the element type, used in logs.
    pub fn dtype_name(&self) -> &'static str {
        match self {
            RawImage::U8(_) => "uint8",
            RawImage::U16(_) => "uint16",
            RawImage::U32(_) => "uint32",
            RawImage::U64(_) => "uint64",
            RawImage::I8(_) => "int8",
            RawImage::I16(_) => "int16",
            RawImage::I32(_) => "int32",
            RawImage::I64(_) => "int64",
            RawImage::F32(_) => "float32",
            RawImage::F64(_) => "float64",
        }
    }

    pub fn into_samples(self) -> Samples {
        match self {
            RawImage::F32(a) => Samples::F32(a),
            RawImage::F64(a) => Samples::F64(a),
            RawImage::U16(a) => Samples::U16(a),
            RawImage::U8(a) => Samples::OtherInt(a.mapv(i128::from)),
            RawImage::U32(a) => Samples::OtherInt(a.mapv(i128::from)),
            RawImage::U64(a) => Samples::OtherInt(a.mapv(i128::from)),
            RawImage::I8(a) => Samples::OtherInt(a.mapv(i128::from)),
            RawImage::I16(a) => Samples::OtherInt(a.mapv(i128::from)),
            RawImage::I32(a) => Samples::OtherInt(a.mapv(i128::from)),
            RawImage::I64(a) => Samples::OtherInt(a.mapv(i128::from)),
        }
    }
}

impl Samples {
    pub fn kind(&self) -> SampleKind {
        match self {
            Samples::F32(_) | Samples::F64(_) => SampleKind::Float,
            Samples::U16(_) => SampleKind::U16,
            Samples::OtherInt(_) => SampleKind::OtherInt,
        }
    }
}
