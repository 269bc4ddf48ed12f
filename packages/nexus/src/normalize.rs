//! Conversion of raw scientific arrays into 8-bit grayscale for display.
//!
//! The mapping depends only on the sample kind:
//!
//! * floating point: clip to the 2nd/98th percentile window, then stretch
//!   linearly to `0..=255`; constant (or NaN-containing) data maps to zero.
//! * `u16`: drop the low byte (`v / 256`).
//! * any other integer: subtract the minimum, then scale so the maximum
//!   becomes 255; constant data maps to zero.
//!
//! Viewers depend on this exact mapping, so results must stay
//! pixel-identical across releases.

use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Sub};

use ndarray::{Array2, ArrayD, Axis};

use crate::sample::{RawImage, Samples};

const LOW_PERCENTILE: f64 = 2.0;
const HIGH_PERCENTILE: f64 = 98.0;

/// Float element type whose percentile, clip and rescale steps run in its
/// own precision. `f32` data must not be widened: the truncation to `u8`
/// differs.
pub(crate) trait FloatSample:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    const ONE: Self;
    const HALF: Self;
    const MAX_PIXEL: Self;

    fn from_f64(value: f64) -> Self;
    fn is_nan_value(self) -> bool;
    fn cmp_total(&self, other: &Self) -> Ordering;
    /// Truncating cast, saturating at the `u8` bounds.
    fn to_pixel(self) -> u8;
}

macro_rules! float_sample {
    ($t:ty) => {
        impl FloatSample for $t {
            const ONE: Self = 1.0;
            const HALF: Self = 0.5;
            const MAX_PIXEL: Self = 255.0;

            fn from_f64(value: f64) -> Self {
                value as $t
            }

            fn is_nan_value(self) -> bool {
                self.is_nan()
            }

            fn cmp_total(&self, other: &Self) -> Ordering {
                self.total_cmp(other)
            }

            fn to_pixel(self) -> u8 {
                self as u8
            }
        }
    };
}

float_sample!(f32);
float_sample!(f64);

/// Normalize a raw image to a 2-D `u8` plane.
pub fn normalize(image: RawImage) -> Array2<u8> {
    normalize_samples(&image.into_samples())
}

/// Normalize already-widened samples to a 2-D `u8` plane.
///
/// Statistics are computed over every element; for arrays with more than
/// two dimensions the first plane is returned.
pub fn normalize_samples(samples: &Samples) -> Array2<u8> {
    let scaled = match samples {
        Samples::F32(values) => clip_to_percentiles(values),
        Samples::F64(values) => clip_to_percentiles(values),
        Samples::U16(values) => values.mapv(|v| (v >> 8) as u8),
        Samples::OtherInt(values) => stretch_from_min(values),
    };
    into_plane(scaled)
}

fn clip_to_percentiles<T: FloatSample>(values: &ArrayD<T>) -> ArrayD<u8> {
    if values.is_empty() || values.iter().any(|v| v.is_nan_value()) {
        return ArrayD::zeros(values.raw_dim());
    }

    let mut sorted: Vec<T> = values.iter().copied().collect();
    sorted.sort_by(T::cmp_total);
    let low = percentile(&sorted, LOW_PERCENTILE);
    let high = percentile(&sorted, HIGH_PERCENTILE);

    if high <= low {
        return ArrayD::zeros(values.raw_dim());
    }

    let span = high - low;
    values.mapv(|v| ((clip(v, low, high) - low) / span * T::MAX_PIXEL).to_pixel())
}

fn clip<T: FloatSample>(value: T, low: T, high: T) -> T {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}

/// Percentile of pre-sorted data with linear interpolation between the
/// closest ranks (numpy's default `linear` method). The rank is located in
/// `f64`; the interpolation runs in the element type.
pub(crate) fn percentile<T: FloatSample>(sorted: &[T], p: f64) -> T {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let q = p / 100.0;
    let virtual_index = n as f64 * q + (1.0 - q) - 1.0;
    let below = virtual_index.floor();
    let gamma = T::from_f64(virtual_index - below);

    let last = (n - 1) as f64;
    let lo = sorted[below.clamp(0.0, last) as usize];
    let hi = sorted[(below + 1.0).clamp(0.0, last) as usize];
    lerp(lo, hi, gamma)
}

fn lerp<T: FloatSample>(a: T, b: T, t: T) -> T {
    if a == b {
        return a;
    }
    let diff = b - a;
    if t >= T::HALF {
        b - diff * (T::ONE - t)
    } else {
        a + diff * t
    }
}

fn stretch_from_min(values: &ArrayD<i128>) -> ArrayD<u8> {
    let Some(&min) = values.iter().min() else {
        return ArrayD::zeros(values.raw_dim());
    };
    let max = values.iter().map(|&v| v - min).max().unwrap_or(0);
    if max <= 0 {
        return ArrayD::zeros(values.raw_dim());
    }

    let max = max as f64;
    values.mapv(|v| ((v - min) as f64 / max * 255.0) as u8)
}

fn into_plane(values: ArrayD<u8>) -> Array2<u8> {
    match values.ndim() {
        0 => Array2::from_elem((1, 1), values.iter().next().copied().unwrap_or(0)),
        1 => {
            let cols = values.len();
            Array2::from_shape_fn((1, cols), |(_, c)| values[[c]])
        }
        _ => {
            if values.is_empty() {
                return Array2::zeros((0, 0));
            }
            let mut plane = values;
            while plane.ndim() > 2 {
                plane = plane.index_axis_move(Axis(0), 0);
            }
            let (rows, cols) = (plane.shape()[0], plane.shape()[1]);
            Array2::from_shape_fn((rows, cols), |(r, c)| plane[[r, c]])
        }
    }
}
